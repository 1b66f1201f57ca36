//! Expanding Polytope Algorithm: penetration depth and normal from a GJK
//! tetrahedron that encloses the origin.

use log::trace;
use nalgebra::Vector3;

use crate::entity::Entity;
use crate::gjk::minkowski_support;
use crate::simplex::Simplex;

/// Faces with a plane closer to the origin than this are oriented using the
/// polytope centroid instead of the origin.
const ORIENTATION_EPSILON: f32 = 1e-6;

/// Penetration of `i` into `j`: translating `j` by `axis * dist` separates
/// the two shapes. `axis` is a unit vector pointing from `i` toward `j`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    pub axis: Vector3<f32>,
    pub dist: f32,
}

#[derive(Debug, Clone, Copy)]
struct Face {
    normal: Vector3<f32>,
    dist: f32,
}

/// Expand the polytope seeded by `simplex` until its closest face lies on
/// the boundary of the Minkowski difference `i − j`.
///
/// Returns `None` if the simplex is not a tetrahedron or every face is
/// degenerate. When `max_iterations` is reached the closest face found so
/// far is returned.
pub fn solve(i: &Entity, j: &Entity, simplex: &Simplex, max_iterations: u32, tolerance: f32) -> Option<Penetration> {
    if simplex.len() != 4 {
        trace!("epa: expected a tetrahedron, got {} points", simplex.len());
        return None;
    }

    let mut vertices: Vec<Vector3<f32>> = simplex.points().iter().map(|p| p.xyz()).collect();
    let mut faces: Vec<[usize; 3]> = vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    let mut best: Option<Face> = None;

    for _ in 0..max_iterations {
        let centroid = centroid(&vertices);
        let closest = closest_face(&vertices, &faces, &centroid)?;
        best = Some(closest);

        let point = minkowski_support(i, j, &closest.normal)?.xyz();
        let reach = point.dot(&closest.normal);
        if reach - closest.dist < tolerance {
            return Some(Penetration {
                axis: closest.normal,
                dist: closest.dist,
            });
        }

        vertices.push(point);
        reconstruct(&vertices, &mut faces, &centroid);
    }

    trace!(
        "epa: \"{}\" vs \"{}\" hit the {} iteration cap",
        i.name(),
        j.name(),
        max_iterations
    );
    best.map(|face| Penetration {
        axis: face.normal,
        dist: face.dist,
    })
}

fn centroid(vertices: &[Vector3<f32>]) -> Vector3<f32> {
    let sum: Vector3<f32> = vertices.iter().sum();
    sum / vertices.len() as f32
}

/// Unit normal of a face pointing out of the polytope, and the distance of
/// its plane from the origin. `None` for zero-area faces.
fn face_plane(vertices: &[Vector3<f32>], indices: [usize; 3], centroid: &Vector3<f32>) -> Option<Face> {
    let a = vertices[indices[0]];
    let b = vertices[indices[1]];
    let c = vertices[indices[2]];

    let mut normal = (b - a).cross(&(c - a)).try_normalize(f32::EPSILON)?;
    let dist = a.dot(&normal);
    let outward = if dist.abs() > ORIENTATION_EPSILON {
        dist > 0.0
    } else {
        // The origin sits on this face; orient away from the interior.
        (a - centroid).dot(&normal) >= 0.0
    };
    if !outward {
        normal = -normal;
    }

    Some(Face {
        normal,
        dist: a.dot(&normal),
    })
}

fn closest_face(vertices: &[Vector3<f32>], faces: &[[usize; 3]], centroid: &Vector3<f32>) -> Option<Face> {
    let mut closest: Option<Face> = None;
    for indices in faces {
        let Some(face) = face_plane(vertices, *indices, centroid) else {
            continue;
        };
        if closest.map_or(true, |c| face.dist < c.dist) {
            closest = Some(face);
        }
    }
    if closest.is_none() {
        trace!("epa: polytope has no usable face");
    }
    closest
}

/// Remove every face the newest vertex can see and stitch the hole closed
/// with faces fanning out from that vertex.
fn reconstruct(vertices: &[Vector3<f32>], faces: &mut Vec<[usize; 3]>, centroid: &Vector3<f32>) {
    let newest = vertices.len() - 1;
    let point = vertices[newest];

    let mut edges: Vec<[usize; 2]> = Vec::new();
    faces.retain(|indices| {
        let visible = face_plane(vertices, *indices, centroid)
            .map_or(true, |face| face.normal.dot(&(point - vertices[indices[0]])) > 0.0);
        if visible {
            let [a, b, c] = *indices;
            for edge in [[a, b], [a, c], [b, c]] {
                toggle_edge(&mut edges, edge);
            }
        }
        !visible
    });

    faces.extend(edges.into_iter().map(|[a, b]| [a, b, newest]));
}

/// Edges shared by two removed faces cancel out; what is left is the
/// boundary of the removed region.
fn toggle_edge(edges: &mut Vec<[usize; 2]>, edge: [usize; 2]) {
    let key = [edge[0].min(edge[1]), edge[0].max(edge[1])];
    if let Some(pos) = edges.iter().position(|e| *e == key) {
        edges.swap_remove(pos);
    } else {
        edges.push(key);
    }
}
