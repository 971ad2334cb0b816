// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::*;

use std::ffi::{c_char, CStr, OsStr};
use std::os::unix::ffi::OsStrExt;

#[derive(Copy, Clone)]
#[repr(C)]
pub enum CRouteFormat {
    Unknown = 0,
    Xml = 1,
    XmlGz = 2,
    XmlBz2 = 3,
}

impl From<CRouteFormat> for route_file::FileFormat {
    fn from(value: CRouteFormat) -> Self {
        match value {
            CRouteFormat::Unknown => route_file::FileFormat::Unknown,
            CRouteFormat::Xml => route_file::FileFormat::Xml,
            CRouteFormat::XmlGz => route_file::FileFormat::XmlGz,
            CRouteFormat::XmlBz2 => route_file::FileFormat::XmlBz2,
        }
    }
}

#[repr(C)]
pub struct CSessionOptions {
    pub proximity_threshold: f64,
    pub min_age: u8,
    pub max_age: u8,
}

impl From<&CSessionOptions> for SessionOptions {
    fn from(value: &CSessionOptions) -> Self {
        SessionOptions {
            proximity_threshold: value.proximity_threshold,
            challenge_context: ChallengeContext {
                min_age: value.min_age,
                max_age: value.max_age,
            },
        }
    }
}

/// Creates a new session. If `options` is NULL, defaults are used.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn routequest_session_new(options: *const CSessionOptions) -> *mut RouteSession {
    let options = options.as_ref().map(SessionOptions::from).unwrap_or_default();
    Box::into_raw(Box::new(RouteSession::new(options)))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routequest_session_delete(ptr: *mut RouteSession) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr));
    }
}

/// Loads a route file and selects it in the session. Returns `false` if the file
/// couldn't be loaded, in which case the session is left untouched.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn routequest_session_load_route_file(
    session: *mut RouteSession,
    format: CRouteFormat,
    c_filename: *const c_char,
) -> bool {
    if c_filename.is_null() {
        return false;
    }

    if let Some(session) = session.as_mut() {
        let filename = OsStr::from_bytes(CStr::from_ptr(c_filename).to_bytes());
        let options = route_file::Options {
            file_format: format.into(),
        };

        match route_file::read_route_from_file(&options, filename) {
            Ok(route) => {
                session.select_route(route);
                true
            }
            Err(e) => {
                log::error!("{}: {}", filename.to_string_lossy(), e);
                false
            }
        }
    } else {
        false
    }
}

/// Stores the latest user position. Pass NaN for either component if the position is unknown.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn routequest_session_update_position(
    session: *mut RouteSession,
    lat: f64,
    lon: f64,
) {
    if let Some(session) = session.as_mut() {
        session.update_position(Some(Coordinate::new(lat, lon)));
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routequest_session_waypoint_count(session: *const RouteSession) -> usize {
    session.as_ref().map(|s| s.progress().len()).unwrap_or(0)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routequest_session_complete(
    session: *mut RouteSession,
    index: usize,
) -> bool {
    session
        .as_mut()
        .map(|s| s.complete(index).is_ok())
        .unwrap_or(false)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routequest_session_uncomplete(
    session: *mut RouteSession,
    index: usize,
) -> bool {
    session
        .as_mut()
        .map(|s| s.uncomplete(index).is_ok())
        .unwrap_or(false)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routequest_session_is_completed(
    session: *const RouteSession,
    index: usize,
) -> bool {
    session
        .as_ref()
        .map(|s| s.progress().is_completed(index))
        .unwrap_or(false)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routequest_session_progress_percent(session: *const RouteSession) -> u8 {
    session
        .as_ref()
        .map(|s| s.progress().progress_percent())
        .unwrap_or(0)
}

/// Returns the index of the next suggested waypoint, or -1 if no route is loaded.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn routequest_session_current_index(session: *const RouteSession) -> i64 {
    match session.as_ref() {
        Some(s) if !s.progress().is_empty() => s.progress().current_index() as i64,
        _ => -1,
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routequest_session_start_challenge(
    session: *mut RouteSession,
    index: usize,
) -> bool {
    session
        .as_mut()
        .and_then(|s| s.start_challenge(index))
        .is_some()
}

/// Reports a finished challenge by the name of its waypoint.
/// Returns `false` if the name doesn't match any waypoint of the active route.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn routequest_session_complete_challenge_by_name(
    session: *mut RouteSession,
    c_name: *const c_char,
) -> bool {
    if c_name.is_null() {
        return false;
    }

    if let Some(session) = session.as_mut() {
        let result = ChallengeResult {
            waypoint: WaypointRef::Name(CStr::from_ptr(c_name).to_string_lossy().into_owned()),
        };
        session.on_challenge_completed(&result).is_some()
    } else {
        false
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routequest_session_cancel_challenge(session: *mut RouteSession) {
    if let Some(session) = session.as_mut() {
        session.cancel_challenge();
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routequest_earth_distance(a: Coordinate, b: Coordinate) -> f64 {
    earth_distance(a, b)
}
