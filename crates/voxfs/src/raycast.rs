//! # Ray-Voxel Lookup
//!
//! The pointer query: given an eye position and a direction, find the first
//! mapped entry along the ray. Standard 3D DDA - track per-axis step sign,
//! distance-to-cross-one-unit, and distance-to-next-boundary, and always
//! advance along the smallest next-boundary distance.

use voxfs_core::{Coordinate, Mapping, MappingEntry};

/// Casts a ray through the mapping and returns the first hit within
/// `max_distance`, or `None`.
///
/// A zero or non-finite direction never hits.
#[must_use]
pub fn raycast<'a>(
    mapping: &'a Mapping,
    eye: [f64; 3],
    direction: [f64; 3],
    max_distance: f64,
) -> Option<&'a MappingEntry> {
    let length =
        (direction[0] * direction[0] + direction[1] * direction[1] + direction[2] * direction[2])
            .sqrt();
    if !length.is_finite() || length == 0.0 {
        return None;
    }
    let dir = [
        direction[0] / length,
        direction[1] / length,
        direction[2] / length,
    ];

    let mut cell = [
        eye[0].floor() as i32,
        eye[1].floor() as i32,
        eye[2].floor() as i32,
    ];
    let mut step = [0i32; 3];
    let mut t_delta = [f64::INFINITY; 3];
    let mut t_max = [f64::INFINITY; 3];

    for axis in 0..3 {
        if dir[axis] > 0.0 {
            step[axis] = 1;
            t_delta[axis] = 1.0 / dir[axis];
            t_max[axis] = (f64::from(cell[axis]) + 1.0 - eye[axis]) / dir[axis];
        } else if dir[axis] < 0.0 {
            step[axis] = -1;
            t_delta[axis] = -1.0 / dir[axis];
            t_max[axis] = (eye[axis] - f64::from(cell[axis])) / -dir[axis];
        }
    }

    loop {
        let position = Coordinate::new(cell[0], cell[1], cell[2]);
        if let Some(entry) = mapping.get(position) {
            return Some(entry);
        }

        // Advance into the next cell across the nearest boundary.
        let axis = (0..3)
            .min_by(|a, b| t_max[*a].total_cmp(&t_max[*b]))
            .unwrap_or(0);
        if t_max[axis] > max_distance {
            return None;
        }
        t_max[axis] += t_delta[axis];
        cell[axis] += step[axis];
    }
}
