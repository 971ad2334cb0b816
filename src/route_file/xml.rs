// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;

use quick_xml::events::{BytesStart, Event};

use super::Error;
use crate::{Connection, Coordinate, Route, Waypoint};

/// Parser is a trait for objects which can parse XML.
///
/// This trait only exists to fix the mismatch of
/// [quick_xml::Reader::read_event] when working on buffered data
/// and [quick_xml::Reader::read_event_into] when working on IO.
pub(super) trait Parser {
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>>;
}

/// IoParser implements [Parser] over an [std::io::BufRead].
pub(super) struct IoParser<R: io::BufRead>(quick_xml::Reader<R>, Vec<u8>);

impl<R: io::BufRead> IoParser<R> {
    #[inline]
    pub(super) fn new(reader: R) -> Self {
        let mut r = quick_xml::Reader::from_reader(reader);
        r.config_mut().trim_text(true);
        Self(r, Vec::default())
    }
}

impl<R: io::BufRead> Parser for IoParser<R> {
    #[inline]
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>> {
        self.1.clear();
        self.0.read_event_into(&mut self.1)
    }
}

/// BufParser implements [Parser] over a slice of bytes (`&[u8]`).
pub(super) struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> BufParser<'a> {
    #[inline]
    pub(super) fn new(data: &'a [u8]) -> Self {
        let mut r = quick_xml::Reader::from_reader(data);
        r.config_mut().trim_text(true);
        Self(r)
    }
}

impl<'a> Parser for BufParser<'a> {
    #[inline]
    fn read_event<'b>(&'b mut self) -> quick_xml::Result<Event<'b>> {
        self.0.read_event()
    }
}

/// Element whose text content is being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    RouteDescription,
    WaypointDescription,
    Challenge,
    Reward,
}

/// Connection as written in the file, before waypoint references are resolved.
struct RawConnection {
    from: String,
    to: String,
    name: Option<String>,
}

/// Reads the first `<route>` element from the parser.
///
/// Only direct children of `<route>` and `<waypoint>` are interpreted;
/// anything nested deeper (e.g. a `<description>` of a `<connection>`) is skipped.
pub(super) fn read_route<P: Parser>(mut parser: P) -> Result<Route, Error> {
    let mut route: Option<Route> = None;
    let mut waypoint: Option<Waypoint> = None;
    let mut text: Option<TextField> = None;
    let mut connections: Vec<RawConnection> = Vec::default();

    // Number of currently open elements, and the depths at which
    // the route and the current waypoint were opened.
    let mut depth: usize = 0;
    let mut route_depth: Option<usize> = None;
    let mut waypoint_depth: Option<usize> = None;

    loop {
        let in_route = route_depth.is_some_and(|d| d + 1 == depth);
        let in_waypoint = waypoint_depth.is_some_and(|d| d + 1 == depth);

        match parser.read_event()? {
            Event::Start(start) => {
                match start.local_name().as_ref() {
                    b"route" if route.is_none() => {
                        route = Some(parse_route(&start)?);
                        route_depth = Some(depth);
                    }
                    b"waypoint" if in_route => {
                        waypoint = Some(parse_waypoint(&start)?);
                        waypoint_depth = Some(depth);
                    }
                    b"connection" if in_route => connections.push(parse_connection(&start)?),
                    b"description" if in_waypoint => text = Some(TextField::WaypointDescription),
                    b"description" if in_route => text = Some(TextField::RouteDescription),
                    b"challenge" if in_waypoint => text = Some(TextField::Challenge),
                    b"reward" if in_waypoint => text = Some(TextField::Reward),
                    _ => text = None,
                }
                depth += 1;
            }

            Event::Empty(start) => match start.local_name().as_ref() {
                b"route" if route.is_none() => {
                    route = Some(parse_route(&start)?);
                    break;
                }
                b"waypoint" if in_route => {
                    if let Some(r) = route.as_mut() {
                        r.waypoints.push(parse_waypoint(&start)?);
                    }
                }
                b"connection" if in_route => connections.push(parse_connection(&start)?),
                _ => {}
            },

            Event::Text(t) => {
                if let Some(field) = text {
                    let content = t.unescape()?;
                    append_text(field, &content, &mut route, &mut waypoint);
                }
            }

            Event::CData(c) => {
                if let Some(field) = text {
                    let content = String::from_utf8_lossy(&c);
                    append_text(field, content.trim(), &mut route, &mut waypoint);
                }
            }

            Event::End(_) => {
                depth = depth.saturating_sub(1);
                text = None;

                if waypoint_depth == Some(depth) {
                    waypoint_depth = None;
                    if let (Some(r), Some(w)) = (route.as_mut(), waypoint.take()) {
                        r.waypoints.push(w);
                    }
                } else if route_depth == Some(depth) {
                    break;
                }
            }

            Event::Eof => break,

            _ => {}
        }
    }

    let mut route = route.ok_or(Error::MissingRoute)?;
    route.connections = resolve_connections(&route.waypoints, connections)?;
    Ok(route)
}

fn append_text(
    field: TextField,
    content: &str,
    route: &mut Option<Route>,
    waypoint: &mut Option<Waypoint>,
) {
    let target = match field {
        TextField::RouteDescription => route.as_mut().map(|r| &mut r.description),
        TextField::WaypointDescription => waypoint.as_mut().map(|w| &mut w.description),
        TextField::Challenge => waypoint.as_mut().map(|w| &mut w.challenge),
        TextField::Reward => waypoint.as_mut().map(|w| &mut w.reward),
    };

    if let Some(target) = target {
        target.get_or_insert_with(String::default).push_str(content);
    }
}

/// Collects all attributes of an element into a map, unescaping their values.
fn attributes(start: &BytesStart<'_>) -> Result<HashMap<Vec<u8>, String>, Error> {
    let mut attrs = HashMap::default();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(attr.key.as_ref().to_vec(), value);
    }
    Ok(attrs)
}

fn parse_route(start: &BytesStart<'_>) -> Result<Route, Error> {
    let mut attrs = attributes(start)?;
    Ok(Route {
        id: attrs.remove(b"id".as_slice()),
        name: attrs.remove(b"name".as_slice()).unwrap_or_default(),
        difficulty: attrs.remove(b"difficulty".as_slice()),
        estimated_duration: attrs.remove(b"duration".as_slice()),
        ..Default::default()
    })
}

fn parse_waypoint(start: &BytesStart<'_>) -> Result<Waypoint, Error> {
    let mut attrs = attributes(start)?;

    let name = attrs
        .remove(b"name".as_slice())
        .ok_or(Error::MissingAttribute {
            element: "waypoint",
            attribute: "name",
        })?;

    let lat = parse_degrees(attrs.remove(b"lat".as_slice()), "lat")?;
    let lon = parse_degrees(attrs.remove(b"lon".as_slice()), "lon")?;
    let coordinate = match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
        (None, None) => None,
        _ => {
            log::warn!("waypoint {:?} has only one of lat/lon - ignoring its position", name);
            None
        }
    };

    Ok(Waypoint {
        id: attrs.remove(b"id".as_slice()),
        name,
        coordinate,
        ..Default::default()
    })
}

fn parse_degrees(value: Option<String>, attribute: &'static str) -> Result<Option<f64>, Error> {
    match value {
        Some(value) => match value.trim().parse() {
            Ok(x) => Ok(Some(x)),
            Err(_) => Err(Error::InvalidAttribute {
                element: "waypoint",
                attribute,
                value,
            }),
        },
        None => Ok(None),
    }
}

fn parse_connection(start: &BytesStart<'_>) -> Result<RawConnection, Error> {
    let mut attrs = attributes(start)?;

    let from = attrs
        .remove(b"from".as_slice())
        .ok_or(Error::MissingAttribute {
            element: "connection",
            attribute: "from",
        })?;

    let to = attrs
        .remove(b"to".as_slice())
        .ok_or(Error::MissingAttribute {
            element: "connection",
            attribute: "to",
        })?;

    Ok(RawConnection {
        from,
        to,
        name: attrs.remove(b"name".as_slice()),
    })
}

/// Converts waypoint references of connections into waypoint indices.
///
/// Waypoints are referenced by their id, or by their position if they don't have one.
fn resolve_connections(
    waypoints: &[Waypoint],
    raw: Vec<RawConnection>,
) -> Result<Vec<Connection>, Error> {
    let mut keys: HashMap<String, usize> = waypoints
        .iter()
        .enumerate()
        .filter(|(_, w)| w.id.is_none())
        .map(|(idx, _)| (idx.to_string(), idx))
        .collect();

    // Explicit ids take precedence over positions
    for (idx, w) in waypoints.iter().enumerate() {
        if let Some(id) = &w.id {
            keys.insert(id.clone(), idx);
        }
    }

    let lookup = |key: String| keys.get(&key).copied().ok_or(Error::UnknownWaypoint(key));

    raw.into_iter()
        .map(|c| {
            Ok(Connection {
                from: lookup(c.from)?,
                to: lookup(c.to)?,
                name: c.name,
            })
        })
        .collect()
}
