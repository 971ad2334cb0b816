// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use crate::{ProgressError, Waypoint};

/// Tracks the user's progress along an ordered list of [Waypoints](Waypoint).
///
/// The store owns the waypoints, a set of completed waypoint indices and
/// a cursor pointing at the waypoint the user should visit next.
///
/// The cursor only moves forward, and only when the waypoint it points at is
/// [completed](ProgressStore::complete). Waypoints may be completed out of order,
/// but doing so leaves the cursor in place. [Uncompleting](ProgressStore::uncomplete)
/// corrects the record without moving the cursor back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressStore {
    waypoints: Vec<Waypoint>,
    completed: HashSet<usize>,
    current: usize,
}

impl ProgressStore {
    /// Creates a fresh store over the provided waypoints.
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self {
            waypoints,
            completed: HashSet::default(),
            current: 0,
        }
    }

    /// Replaces the waypoints, discarding all progress.
    pub fn reset(&mut self, waypoints: Vec<Waypoint>) {
        self.waypoints = waypoints;
        self.completed.clear();
        self.current = 0;
    }

    /// Marks the waypoint at `index` as completed.
    ///
    /// If `index` is the current waypoint and it is not the last one,
    /// the cursor advances to the following waypoint.
    /// Completing an already completed waypoint is a no-op.
    pub fn complete(&mut self, index: usize) -> Result<(), ProgressError> {
        self.check_index(index)?;

        if self.completed.insert(index) {
            log::debug!("waypoint {} completed", index);
        }

        if index == self.current && self.current + 1 < self.waypoints.len() {
            self.current += 1;
            log::debug!("current waypoint advanced to {}", self.current);
        }

        Ok(())
    }

    /// Removes the waypoint at `index` from the completed set.
    ///
    /// The cursor is never moved back.
    pub fn uncomplete(&mut self, index: usize) -> Result<(), ProgressError> {
        self.check_index(index)?;

        if self.completed.remove(&index) {
            log::debug!("waypoint {} no longer completed", index);
        }

        Ok(())
    }

    /// Returns the percentage (0-100) of completed waypoints, rounded to the
    /// nearest integer. An empty store has 0% progress.
    pub fn progress_percent(&self) -> u8 {
        if self.waypoints.is_empty() {
            return 0;
        }

        let ratio = self.completed.len() as f64 / self.waypoints.len() as f64;
        (ratio * 100.0).round() as u8
    }

    /// Returns the waypoint the user should visit next, or `None` if the store is empty.
    pub fn next_waypoint(&self) -> Option<&Waypoint> {
        self.waypoints.get(self.current)
    }

    /// Returns the completed waypoints, in route order.
    pub fn completed_waypoints(&self) -> Vec<&Waypoint> {
        self.waypoints
            .iter()
            .enumerate()
            .filter_map(|(idx, w)| self.completed.contains(&idx).then_some(w))
            .collect()
    }

    /// Returns the index of the waypoint the user should visit next.
    ///
    /// Always 0 for an empty store.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Returns `true` if every waypoint was completed.
    /// An empty store is never finished.
    pub fn is_finished(&self) -> bool {
        !self.waypoints.is_empty() && self.completed.len() == self.waypoints.len()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<(), ProgressError> {
        if index < self.waypoints.len() {
            Ok(())
        } else {
            Err(ProgressError::OutOfRange {
                index,
                len: self.waypoints.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(n: usize) -> ProgressStore {
        ProgressStore::new(
            (0..n)
                .map(|i| Waypoint::new(format!("Place {}", i + 1)))
                .collect(),
        )
    }

    fn names(waypoints: Vec<&Waypoint>) -> Vec<&str> {
        waypoints.into_iter().map(|w| w.name.as_str()).collect()
    }

    #[test]
    fn fresh_store() {
        let s = store_with(3);
        assert_eq!(s.progress_percent(), 0);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.completed_count(), 0);
        assert_eq!(s.next_waypoint().unwrap().name, "Place 1");
        assert!(s.completed_waypoints().is_empty());
        assert!(!s.is_finished());
    }

    #[test]
    fn reset_discards_progress() {
        let mut s = store_with(3);
        s.complete(0).unwrap();
        s.complete(2).unwrap();
        assert_eq!(s.current_index(), 1);

        s.reset(vec![Waypoint::new("A"), Waypoint::new("B")]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.completed_count(), 0);
        assert_eq!(s.progress_percent(), 0);
    }

    #[test]
    fn completing_current_advances() {
        let mut s = store_with(3);

        s.complete(0).unwrap();
        assert_eq!(s.current_index(), 1);
        s.complete(1).unwrap();
        assert_eq!(s.current_index(), 2);

        // Last waypoint never advances
        s.complete(2).unwrap();
        assert_eq!(s.current_index(), 2);
        assert!(s.is_finished());
        assert_eq!(s.progress_percent(), 100);
    }

    #[test]
    fn completing_other_does_not_advance() {
        let mut s = store_with(4);
        s.complete(2).unwrap();
        s.complete(3).unwrap();
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.next_waypoint().unwrap().name, "Place 1");
    }

    #[test]
    fn complete_is_idempotent() {
        let mut s = store_with(3);
        s.complete(1).unwrap();
        s.complete(1).unwrap();
        assert_eq!(s.completed_count(), 1);
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn complete_current_again_after_advancing() {
        let mut s = store_with(3);
        s.complete(0).unwrap();
        s.complete(0).unwrap();
        assert_eq!(s.current_index(), 1);
    }

    #[test]
    fn uncomplete_keeps_cursor() {
        let mut s = store_with(3);
        s.complete(0).unwrap();
        assert_eq!(s.current_index(), 1);

        s.uncomplete(0).unwrap();
        assert!(!s.is_completed(0));
        assert_eq!(s.completed_count(), 0);
        assert_eq!(s.current_index(), 1);
    }

    #[test]
    fn uncomplete_missing_is_noop() {
        let mut s = store_with(3);
        s.complete(2).unwrap();
        s.uncomplete(1).unwrap();
        assert_eq!(s.completed_count(), 1);
        assert!(s.is_completed(2));
    }

    #[test]
    fn out_of_range() {
        let mut s = store_with(2);
        assert_eq!(
            s.complete(2),
            Err(ProgressError::OutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            s.uncomplete(7),
            Err(ProgressError::OutOfRange { index: 7, len: 2 })
        );
        assert_eq!(s.completed_count(), 0);
    }

    #[test]
    fn empty_store() {
        let mut s = ProgressStore::default();
        assert_eq!(s.progress_percent(), 0);
        assert!(s.next_waypoint().is_none());
        assert!(s.completed_waypoints().is_empty());
        assert!(!s.is_finished());
        assert_eq!(
            s.complete(0),
            Err(ProgressError::OutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn progress_rounding() {
        let mut s = store_with(3);
        s.complete(1).unwrap();
        assert_eq!(s.progress_percent(), 33);
        s.complete(2).unwrap();
        assert_eq!(s.progress_percent(), 67);

        let mut s = store_with(8);
        s.complete(0).unwrap();
        assert_eq!(s.progress_percent(), 13); // 12.5 rounds up
    }

    #[test]
    fn completed_waypoints_in_route_order() {
        let mut s = store_with(5);
        s.complete(4).unwrap();
        s.complete(1).unwrap();
        s.complete(3).unwrap();
        assert_eq!(
            names(s.completed_waypoints()),
            ["Place 2", "Place 4", "Place 5"]
        );
    }
}
