//! The GJK working simplex and its Voronoi-region classifier.
//!
//! Points are homogeneous (w = 1) Minkowski-difference support points. The
//! most recently added point is always last and is referred to as `A`;
//! earlier points are `B`, `C`, `D` walking backwards.

use heapless::Vec;
use nalgebra::{Vector3, Vector4};

/// Squared lengths below this are treated as zero.
const DEGENERATE_EPSILON: f32 = 1e-12;

/// Relative tolerance for "the origin lies on this line/plane".
const COPLANAR_TOLERANCE: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct Simplex {
    points: Vec<Vector4<f32>, 4>,
    next_direction: Vector4<f32>,
    contains_origin: bool,
}

impl Default for Simplex {
    fn default() -> Self {
        Self::new()
    }
}

impl Simplex {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            next_direction: Vector4::zeros(),
            contains_origin: false,
        }
    }

    /// Append a support point. It becomes the new `A`.
    ///
    /// # Panics
    /// Panics if the simplex already holds four points.
    pub fn add(&mut self, point: Vector4<f32>) {
        if self.points.push(point).is_err() {
            panic!("simplex already holds four points");
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[Vector4<f32>] {
        &self.points
    }

    #[inline]
    pub fn contains_origin(&self) -> bool {
        self.contains_origin
    }

    /// Search direction toward the origin (w = 0).
    #[inline]
    pub fn next_direction(&self) -> Vector4<f32> {
        self.next_direction
    }

    #[inline]
    fn point(&self, index: usize) -> Vector3<f32> {
        self.points[index].xyz()
    }

    fn set_points(&mut self, points: &[Vector3<f32>]) {
        self.points.clear();
        for p in points {
            self.add(p.push(1.0));
        }
    }

    #[inline]
    fn set_direction(&mut self, direction: Vector3<f32>) {
        self.next_direction = direction.push(0.0);
    }

    /// Classify the origin against the current simplex.
    ///
    /// Either marks the origin as contained, or drops the points that cannot
    /// be part of the closest feature and stores the next search direction.
    ///
    /// # Panics
    /// Panics on an empty simplex.
    pub fn process(&mut self) {
        match self.points.len() {
            1 => self.process_point(),
            2 => self.process_edge(),
            3 => self.process_triangle(),
            4 => self.process_tetrahedron(),
            _ => panic!("cannot process an empty simplex"),
        }
    }

    fn process_point(&mut self) {
        let a = self.point(0);
        if a.norm_squared() <= DEGENERATE_EPSILON {
            self.contains_origin = true;
        } else {
            self.set_direction(-a);
        }
    }

    fn process_edge(&mut self) {
        let a = self.point(1);
        let b = self.point(0);
        let ab = b - a;
        let ao = -a;
        let dir = triple_product(&ab, &ao);

        // The origin is on the line through A and B. GJK only reaches here
        // after A passed the origin along -B, so it lies on the segment.
        let scale = ab.norm_squared() * ao.norm();
        if dir.norm() <= COPLANAR_TOLERANCE * scale || ao.norm_squared() <= DEGENERATE_EPSILON {
            self.contains_origin = true;
        } else {
            self.set_direction(dir);
        }
    }

    fn process_triangle(&mut self) {
        let a = self.point(2);
        let b = self.point(1);
        let c = self.point(0);

        let ab = b - a;
        let ac = c - a;
        let ao = -a;
        let abc = ab.cross(&ac);

        if abc.norm_squared() <= DEGENERATE_EPSILON * ab.norm_squared().max(1.0) {
            // Collinear points: fall back to the edge AB.
            self.set_points(&[b, a]);
            self.process_edge();
            return;
        }

        let ab_normal = ab.cross(&abc);
        let ac_normal = abc.cross(&ac);

        if ab_normal.dot(&ao) > 0.0 {
            self.set_direction(triple_product(&ab, &ao));
            self.set_points(&[b, a]);
        } else if ac_normal.dot(&ao) > 0.0 {
            self.set_direction(triple_product(&ac, &ao));
            self.set_points(&[c, a]);
        } else {
            let v = abc.dot(&ao);
            if v.abs() <= COPLANAR_TOLERANCE * abc.norm() * ao.norm() {
                self.contains_origin = true;
            } else if v > 0.0 {
                self.set_direction(abc);
            } else {
                // Swap B and C so the stored winding faces the origin.
                self.set_direction(-abc);
                self.set_points(&[b, c, a]);
            }
        }
    }

    fn process_tetrahedron(&mut self) {
        let a = self.point(3);
        let b = self.point(2);
        let c = self.point(1);
        let d = self.point(0);
        let ao = -a;

        for (x, y, opposite) in [(b, c, d), (c, d, b), (d, b, c)] {
            let normal = outward_normal(&a, &x, &y, &opposite);
            if normal.dot(&ao) > 0.0 {
                self.reduce_to_face(a, x, y, normal);
                return;
            }
        }
        self.contains_origin = true;
    }

    /// The origin is outside face AXY (with outward `normal`): keep the
    /// face or one of its edges through A, whichever is closest.
    fn reduce_to_face(&mut self, a: Vector3<f32>, x: Vector3<f32>, y: Vector3<f32>, normal: Vector3<f32>) {
        let ao = -a;
        let ax = x - a;
        let ay = y - a;

        let mut ax_normal = ax.cross(&normal);
        if ax_normal.dot(&ay) > 0.0 {
            ax_normal = -ax_normal;
        }
        let mut ay_normal = ay.cross(&normal);
        if ay_normal.dot(&ax) > 0.0 {
            ay_normal = -ay_normal;
        }

        if ax_normal.dot(&ao) > 0.0 {
            self.set_direction(triple_product(&ax, &ao));
            self.set_points(&[x, a]);
        } else if ay_normal.dot(&ao) > 0.0 {
            self.set_direction(triple_product(&ay, &ao));
            self.set_points(&[y, a]);
        } else {
            self.set_direction(normal);
            self.set_points(&[y, x, a]);
        }
    }

    /// Grow the simplex into a tetrahedron so EPA has a polytope to expand.
    ///
    /// Each new point is a Minkowski support point along a direction off
    /// the current point, edge or triangle: the triangle normal, a vector
    /// perpendicular to the edge, or a coordinate axis. Of the two support
    /// points along `±direction` the one farther from the current simplex is
    /// kept, so the result has volume whenever the shapes do.
    ///
    /// # Panics
    /// Panics on an empty simplex.
    pub fn transform_into_3_simplex<F>(&mut self, mut support: F)
    where
        F: FnMut(&Vector3<f32>) -> Vector4<f32>,
    {
        assert!(!self.points.is_empty(), "cannot grow an empty simplex");

        while self.points.len() < 4 {
            let a = self.point(self.points.len() - 1);
            let direction = match self.points.len() {
                1 => Vector3::x(),
                2 => orthogonal(&(self.point(0) - a)),
                _ => {
                    let ab = self.point(1) - a;
                    let ac = self.point(0) - a;
                    triangle_normal(&ab, &ac)
                }
            };

            let forward = support(&direction);
            let backward = support(&-direction);
            let reach = |p: &Vector4<f32>| (p.xyz() - a).dot(&direction).abs();
            let point = if reach(&backward) > reach(&forward) {
                backward
            } else {
                forward
            };
            self.add(point);
        }
    }
}

/// `v × (w × v)`: the component of `w` perpendicular to `v`, scaled by |v|².
#[inline]
fn triple_product(v: &Vector3<f32>, w: &Vector3<f32>) -> Vector3<f32> {
    v.cross(&w.cross(v))
}

/// Normal of triangle AXY pointing away from `opposite`.
fn outward_normal(a: &Vector3<f32>, x: &Vector3<f32>, y: &Vector3<f32>, opposite: &Vector3<f32>) -> Vector3<f32> {
    let normal = (x - a).cross(&(y - a));
    if normal.dot(&(opposite - a)) > 0.0 {
        -normal
    } else {
        normal
    }
}

/// Triangle normal with fallbacks for near-collinear triangles.
fn triangle_normal(ab: &Vector3<f32>, ac: &Vector3<f32>) -> Vector3<f32> {
    let normal = ab.cross(ac);
    if normal.norm_squared() > DEGENERATE_EPSILON {
        return normal;
    }
    let normal = ab.cross(&(ab + Vector3::new(1.0, 1.0, 0.0)));
    if normal.norm_squared() > DEGENERATE_EPSILON {
        return normal;
    }
    let normal = ab.cross(&(ab + Vector3::new(1.0, 1.0, 1.0)));
    if normal.norm_squared() > DEGENERATE_EPSILON {
        return normal;
    }
    orthogonal(ab)
}

/// A vector perpendicular to `v`, built from `v`'s least significant axis.
/// Returns +x for a zero vector.
pub(crate) fn orthogonal(v: &Vector3<f32>) -> Vector3<f32> {
    if v.norm_squared() <= DEGENERATE_EPSILON {
        return Vector3::x();
    }
    let axis = if v.x.abs() <= v.y.abs() && v.x.abs() <= v.z.abs() {
        Vector3::x()
    } else if v.y.abs() <= v.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    v.cross(&axis)
}
