// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{earth_distance, Coordinate, Waypoint};

/// Recommended maximum distance, in meters, between the user and a [Waypoint]
/// for [is_near] to hold.
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 100.0;

/// Checks whether the user is within `threshold` meters of the waypoint.
///
/// Proximity can only be asserted with both positions known: `false` is returned
/// if the user position is absent or non-finite, or if the waypoint has no
/// usable coordinate.
pub fn is_near(position: Option<Coordinate>, waypoint: &Waypoint, threshold: f64) -> bool {
    match (Coordinate::known(position), Coordinate::known(waypoint.coordinate)) {
        (Some(user), Some(target)) => earth_distance(user, target) <= threshold,
        _ => false,
    }
}
