// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Route progress tracking and proximity gating for location-based scavenger hunts.
//!
//! A [Route] is an ordered list of [Waypoints](Waypoint). A [RouteSession] walks the user
//! along it: it remembers which waypoints were completed, which one should be visited next,
//! and only allows a challenge to start when the user is physically close to its waypoint
//! (see [is_near]). Routes can be built by hand or loaded from
//! [route files](crate::route_file).
//!
//! # Example
//!
//! ```no_run
//! let route = routequest::route_file::read_route_from_file(
//!     &routequest::route_file::Options::default(),
//!     "path/to/madrid.route.xml",
//! ).expect("failed to load the route");
//!
//! let mut session = routequest::RouteSession::default();
//! session.select_route(route);
//! session.update_position(Some(routequest::Coordinate::new(40.4168, -3.7038)));
//!
//! if let Some(challenge) = session.start_challenge(1) {
//!     println!("Challenge started at waypoint {}", challenge.index);
//! }
//! println!("Progress: {}%", session.progress().progress_percent());
//! ```

pub mod c;
mod distance;
mod progress;
mod proximity;
pub mod route_file;
mod session;

pub use distance::{earth_distance, EARTH_RADIUS};
pub use progress::{ProgressError, ProgressStore};
pub use proximity::{is_near, DEFAULT_PROXIMITY_THRESHOLD};
pub use session::{
    ChallengeContext, ChallengeResult, Eligibility, PendingChallenge, RouteSession,
    SessionOptions, WaypointRef,
};

/// A position on Earth, in degrees.
///
/// Coordinates with a non-finite component represent an unknown position.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns `true` if both components are finite numbers.
    pub fn is_known(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Normalizes a possibly-unknown position: returns `None` if the coordinate
    /// is absent or has a non-finite component.
    pub fn known(c: Option<Coordinate>) -> Option<Coordinate> {
        c.filter(Coordinate::is_known)
    }
}

/// A single physical location the user is guided to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Waypoint {
    /// Stable identifier. When absent, the position of the waypoint in its [Route]
    /// is its identity.
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub coordinate: Option<Coordinate>,
    pub challenge: Option<String>,
    pub reward: Option<String>,
}

impl Waypoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_coordinate(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            coordinate: Some(Coordinate::new(lat, lon)),
            ..Default::default()
        }
    }
}

/// A display-only link between two waypoints of a [Route], given by their indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Connection {
    pub from: usize,
    pub to: usize,
    pub name: Option<String>,
}

/// An ordered sequence of [Waypoints](Waypoint) with some descriptive metadata.
///
/// The order of waypoints is the suggested visiting order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub estimated_duration: Option<String>,
    pub difficulty: Option<String>,
    pub waypoints: Vec<Waypoint>,
    pub connections: Vec<Connection>,
}

impl Route {
    /// Returns the number of waypoints in the route.
    pub fn total_places(&self) -> usize {
        self.waypoints.len()
    }
}
