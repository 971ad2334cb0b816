// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{
    earth_distance, is_near, Coordinate, ProgressError, ProgressStore, Route,
    DEFAULT_PROXIMITY_THRESHOLD,
};

/// Parameters handed over to the challenge collaborator when a challenge starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeContext {
    /// Youngest age of the players the challenge should target.
    pub min_age: u8,

    /// Oldest age of the players the challenge should target.
    pub max_age: u8,
}

impl Default for ChallengeContext {
    fn default() -> Self {
        Self {
            min_age: 6,
            max_age: 8,
        }
    }
}

/// Additional controls for a [RouteSession].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    /// Maximum distance, in meters, between the user and a waypoint
    /// for a challenge to be started there.
    pub proximity_threshold: f64,

    pub challenge_context: ChallengeContext,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            challenge_context: ChallengeContext::default(),
        }
    }
}

/// A challenge which was requested from the challenge collaborator and has not
/// been reported back yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingChallenge {
    /// Index of the waypoint in the active route.
    pub index: usize,
    pub context: ChallengeContext,
}

/// How a finished challenge refers back to its waypoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaypointRef {
    Id(String),
    Name(String),
}

/// Report sent by the challenge collaborator once a challenge is finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeResult {
    pub waypoint: WaypointRef,
}

/// Whether a challenge can be started at a waypoint, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// The waypoint was already completed.
    Completed,

    /// The first waypoint of a route may always be started, so that a hunt
    /// can begin before the user gets to the first stop.
    Bootstrap,

    /// The user is close enough to the waypoint.
    Near,

    /// The user is too far away, or either position is unknown.
    TooFar,
}

impl std::fmt::Display for Eligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Bootstrap => write!(f, "bootstrap"),
            Self::Near => write!(f, "near"),
            Self::TooFar => write!(f, "too_far"),
        }
    }
}

/// Ties a selected [Route], the user's progress along it, the user's last known
/// position and the challenge in progress together.
///
/// A session starts without any route. [select_route](RouteSession::select_route)
/// activates a route, discarding everything related to the previous one.
#[derive(Debug, Clone, Default)]
pub struct RouteSession {
    options: SessionOptions,

    route: Option<Route>,
    progress: ProgressStore,
    position: Option<Coordinate>,
    selected: Option<usize>,
    pending: Option<PendingChallenge>,
}

impl RouteSession {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Activates a route. All progress, the selected waypoint and any pending
    /// challenge from a previous route are discarded.
    pub fn select_route(&mut self, route: Route) {
        log::info!(
            "route {:?} selected with {} waypoints",
            route.name,
            route.waypoints.len()
        );

        self.progress.reset(route.waypoints.clone());
        self.route = Some(route);
        self.selected = None;
        self.pending = None;
    }

    /// Returns `true` if a route was selected.
    pub fn is_active(&self) -> bool {
        self.route.is_some()
    }

    /// Returns the active route, exactly as it was selected.
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    /// Stores the latest user position. `None` or a non-finite coordinate
    /// marks the position as unknown.
    pub fn update_position(&mut self, position: Option<Coordinate>) {
        self.position = Coordinate::known(position);
    }

    pub fn position(&self) -> Option<Coordinate> {
        self.position
    }

    /// Returns the distance in meters between the user and a waypoint,
    /// if both positions are known.
    pub fn waypoint_distance(&self, index: usize) -> Option<f64> {
        let user = self.position?;
        let target = Coordinate::known(self.progress.get(index)?.coordinate)?;
        Some(earth_distance(user, target))
    }

    /// Checks whether a challenge may be started at the waypoint with the provided index.
    pub fn can_start_challenge(&self, index: usize) -> bool {
        match self.progress.get(index) {
            Some(waypoint) => {
                index == 0 || is_near(self.position, waypoint, self.options.proximity_threshold)
            }
            None => false,
        }
    }

    /// Returns the challenge status of a waypoint, or `None` if the index is out of range.
    pub fn eligibility(&self, index: usize) -> Option<Eligibility> {
        let waypoint = self.progress.get(index)?;

        Some(if self.progress.is_completed(index) {
            Eligibility::Completed
        } else if index == 0 {
            Eligibility::Bootstrap
        } else if is_near(self.position, waypoint, self.options.proximity_threshold) {
            Eligibility::Near
        } else {
            Eligibility::TooFar
        })
    }

    /// Requests a challenge at the waypoint with the provided index.
    ///
    /// The request is only granted if the user is close to the waypoint, or if it
    /// is the first waypoint of the route. Otherwise the session is left untouched
    /// and `None` is returned.
    pub fn start_challenge(&mut self, index: usize) -> Option<PendingChallenge> {
        if !self.can_start_challenge(index) {
            log::debug!("challenge at waypoint {} refused", index);
            return None;
        }

        let challenge = PendingChallenge {
            index,
            context: self.options.challenge_context,
        };
        log::debug!("challenge at waypoint {} started", index);
        self.pending = Some(challenge);
        Some(challenge)
    }

    pub fn pending_challenge(&self) -> Option<&PendingChallenge> {
        self.pending.as_ref()
    }

    /// Abandons the pending challenge without completing its waypoint.
    pub fn cancel_challenge(&mut self) {
        if let Some(challenge) = self.pending.take() {
            log::debug!("challenge at waypoint {} cancelled", challenge.index);
        }
    }

    /// Handles a finished challenge: marks its waypoint as completed
    /// and clears the pending challenge.
    ///
    /// Reports which don't match any waypoint of the active route are dropped.
    /// Returns the index of the completed waypoint.
    pub fn on_challenge_completed(&mut self, result: &ChallengeResult) -> Option<usize> {
        self.pending = None;

        let Some(index) = self.resolve(&result.waypoint) else {
            log::warn!(
                "dropping challenge result for unknown waypoint {:?}",
                result.waypoint
            );
            return None;
        };

        // resolve only returns indices within the route
        self.progress.complete(index).ok()?;
        Some(index)
    }

    /// Manually marks a waypoint as completed. See [ProgressStore::complete].
    pub fn complete(&mut self, index: usize) -> Result<(), ProgressError> {
        self.progress.complete(index)
    }

    /// Manually marks a waypoint as not completed. See [ProgressStore::uncomplete].
    pub fn uncomplete(&mut self, index: usize) -> Result<(), ProgressError> {
        self.progress.uncomplete(index)
    }

    /// Highlights a waypoint. Out-of-range indices clear the selection.
    pub fn select_waypoint(&mut self, index: usize) {
        self.selected = (index < self.progress.len()).then_some(index);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Returns the index of the highlighted waypoint.
    pub fn selected_waypoint(&self) -> Option<usize> {
        self.selected
    }

    /// Finds the index of the first waypoint matching the reference.
    fn resolve(&self, waypoint: &WaypointRef) -> Option<usize> {
        self.progress.waypoints().iter().position(|w| match waypoint {
            WaypointRef::Id(id) => w.id.as_deref() == Some(id.as_str()),
            WaypointRef::Name(name) => &w.name == name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Waypoint;

    fn madrid_route() -> Route {
        Route {
            id: Some("madrid".to_string()),
            name: "Ruta Clásica de Madrid".to_string(),
            waypoints: vec![
                Waypoint {
                    id: Some("sol".to_string()),
                    ..Waypoint::with_coordinate("Puerta del Sol", 40.4168, -3.7038)
                },
                Waypoint {
                    id: Some("mayor".to_string()),
                    ..Waypoint::with_coordinate("Plaza Mayor", 40.4154, -3.7074)
                },
                Waypoint::with_coordinate("Palacio Real", 40.4180, -3.7143),
            ],
            ..Default::default()
        }
    }

    fn other_route() -> Route {
        Route {
            name: "Retiro".to_string(),
            waypoints: vec![Waypoint::new("Estanque"), Waypoint::new("Palacio de Cristal")],
            ..Default::default()
        }
    }

    fn by_name(name: &str) -> ChallengeResult {
        ChallengeResult {
            waypoint: WaypointRef::Name(name.to_string()),
        }
    }

    #[test]
    fn no_route() {
        let mut s = RouteSession::default();
        assert!(!s.is_active());
        assert!(s.start_challenge(0).is_none());
        assert!(s.complete(0).is_err());
        assert_eq!(s.on_challenge_completed(&by_name("Plaza Mayor")), None);
        assert_eq!(s.progress().progress_percent(), 0);
        assert!(s.progress().next_waypoint().is_none());
    }

    #[test]
    fn select_route() {
        let mut s = RouteSession::default();
        s.select_route(madrid_route());

        assert!(s.is_active());
        assert_eq!(s.route().unwrap().name, "Ruta Clásica de Madrid");
        assert_eq!(s.progress().len(), 3);
        assert_eq!(s.route(), Some(&madrid_route()));
        assert_eq!(s.route().unwrap().total_places(), s.progress().len());
        assert_eq!(s.progress().progress_percent(), 0);
        assert_eq!(s.progress().next_waypoint().unwrap().name, "Puerta del Sol");
    }

    #[test]
    fn default_challenge_context() {
        let mut s = RouteSession::default();
        s.select_route(madrid_route());
        let challenge = s.start_challenge(0).unwrap();
        assert_eq!(challenge.context.min_age, 6);
        assert_eq!(challenge.context.max_age, 8);
    }

    #[test]
    fn unknown_position_only_allows_bootstrap() {
        let mut s = RouteSession::default();
        s.select_route(madrid_route());

        assert!(s.start_challenge(1).is_none());
        assert!(s.start_challenge(2).is_none());
        assert!(s.pending_challenge().is_none());

        let challenge = s.start_challenge(0).unwrap();
        assert_eq!(challenge.index, 0);
        assert_eq!(challenge.context, ChallengeContext::default());
        assert_eq!(s.pending_challenge(), Some(&challenge));
    }

    #[test]
    fn proximity_gates_challenges() {
        let mut s = RouteSession::default();
        s.select_route(madrid_route());
        s.update_position(Some(Coordinate::new(40.41545, -3.70735)));

        assert!(s.start_challenge(2).is_none());
        assert_eq!(s.start_challenge(1).map(|c| c.index), Some(1));
        assert!(s.start_challenge(3).is_none());

        // Position lost
        s.update_position(None);
        assert!(!s.can_start_challenge(1));

        // NaN is unknown, not stale
        s.update_position(Some(Coordinate::new(f64::NAN, f64::NAN)));
        assert_eq!(s.position(), None);
        assert!(!s.can_start_challenge(1));
    }

    #[test]
    fn refused_challenge_keeps_pending() {
        let mut s = RouteSession::default();
        s.select_route(madrid_route());
        s.start_challenge(0).unwrap();
        assert!(s.start_challenge(2).is_none());
        assert_eq!(s.pending_challenge().map(|c| c.index), Some(0));
    }

    #[test]
    fn custom_threshold() {
        let mut s = RouteSession::new(SessionOptions {
            proximity_threshold: 2000.0,
            ..Default::default()
        });
        s.select_route(madrid_route());
        s.update_position(Some(Coordinate::new(40.4168, -3.7038)));
        assert!(s.can_start_challenge(2));
    }

    #[test]
    fn challenge_completion() {
        let mut s = RouteSession::default();
        s.select_route(madrid_route());
        s.start_challenge(0).unwrap();

        assert_eq!(s.on_challenge_completed(&by_name("Puerta del Sol")), Some(0));
        assert!(s.pending_challenge().is_none());
        assert!(s.progress().is_completed(0));
        assert_eq!(s.progress().current_index(), 1);

        let by_id = ChallengeResult {
            waypoint: WaypointRef::Id("mayor".to_string()),
        };
        assert_eq!(s.on_challenge_completed(&by_id), Some(1));
        assert_eq!(s.progress().current_index(), 2);
        assert_eq!(s.progress().progress_percent(), 67);
    }

    #[test]
    fn unresolved_challenge_is_dropped() {
        let mut s = RouteSession::default();
        s.select_route(madrid_route());
        s.start_challenge(0).unwrap();

        assert_eq!(s.on_challenge_completed(&by_name("Templo de Debod")), None);
        assert!(s.pending_challenge().is_none());
        assert_eq!(s.progress().completed_count(), 0);
        assert_eq!(s.progress().current_index(), 0);
    }

    #[test]
    fn cancel_challenge() {
        let mut s = RouteSession::default();
        s.select_route(madrid_route());
        s.start_challenge(0).unwrap();
        s.cancel_challenge();
        assert!(s.pending_challenge().is_none());
        assert_eq!(s.progress().completed_count(), 0);
    }

    #[test]
    fn reselecting_discards_progress() {
        let mut s = RouteSession::default();
        s.select_route(madrid_route());
        s.complete(0).unwrap();
        s.complete(2).unwrap();
        s.select_waypoint(2);
        s.start_challenge(0).unwrap();

        s.select_route(madrid_route());
        assert_eq!(s.progress().completed_count(), 0);
        assert_eq!(s.progress().current_index(), 0);
        assert_eq!(s.selected_waypoint(), None);
        assert!(s.pending_challenge().is_none());

        s.complete(0).unwrap();
        s.select_route(other_route());
        assert_eq!(s.progress().len(), 2);
        assert_eq!(s.progress().completed_count(), 0);
        assert_eq!(s.progress().current_index(), 0);
    }

    #[test]
    fn eligibility() {
        let mut s = RouteSession::default();
        assert_eq!(s.eligibility(0), None);

        s.select_route(madrid_route());
        s.update_position(Some(Coordinate::new(40.4154, -3.7074)));
        assert_eq!(s.eligibility(0), Some(Eligibility::Bootstrap));
        assert_eq!(s.eligibility(1), Some(Eligibility::Near));
        assert_eq!(s.eligibility(2), Some(Eligibility::TooFar));
        assert_eq!(s.eligibility(3), None);

        s.complete(1).unwrap();
        assert_eq!(s.eligibility(1), Some(Eligibility::Completed));
    }

    #[test]
    fn waypoint_distance() {
        let mut s = RouteSession::default();
        s.select_route(madrid_route());
        assert_eq!(s.waypoint_distance(1), None);

        s.update_position(Some(Coordinate::new(40.4168, -3.7038)));
        let d = s.waypoint_distance(1).unwrap();
        assert!((300.0..=400.0).contains(&d));
        assert_eq!(s.waypoint_distance(5), None);
    }

    #[test]
    fn selection() {
        let mut s = RouteSession::default();
        s.select_route(madrid_route());
        s.select_waypoint(1);
        assert_eq!(s.selected_waypoint(), Some(1));
        s.select_waypoint(9);
        assert_eq!(s.selected_waypoint(), None);
        s.select_waypoint(2);
        s.clear_selection();
        assert_eq!(s.selected_waypoint(), None);
    }

    #[test]
    fn manual_completion_and_correction() {
        let mut s = RouteSession::default();
        s.select_route(madrid_route());
        s.complete(0).unwrap();
        s.uncomplete(0).unwrap();
        assert_eq!(s.progress().completed_count(), 0);
        assert_eq!(s.progress().current_index(), 1);
        assert!(s.uncomplete(3).is_err());
    }
}
