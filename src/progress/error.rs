// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Error conditions which may occur when marking waypoints in a
/// [ProgressStore](crate::ProgressStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressError {
    /// The waypoint index is outside of `0..len`.
    ///
    /// Indices are derived from the route itself, so this always signals
    /// a bug in the caller.
    OutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for ProgressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { index, len } => {
                write!(f, "waypoint index {} out of range (route has {})", index, len)
            }
        }
    }
}

impl std::error::Error for ProgressError {}
