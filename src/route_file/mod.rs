// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Loading [Routes](crate::Route) from route XML documents.
//!
//! A route document has a single `<route>` root element with `<waypoint>` children
//! (in visiting order) and optional `<connection>` elements:
//!
//! ```xml
//! <route id="madrid" name="Ruta Clásica de Madrid" difficulty="Fácil" duration="2-3 horas">
//!   <description>Los lugares más emblemáticos de Madrid</description>
//!   <waypoint id="sol" name="Puerta del Sol" lat="40.4168" lon="-3.7038">
//!     <description>Kilómetro cero</description>
//!     <challenge>Encuentra la placa</challenge>
//!     <reward>Moneda de oro</reward>
//!   </waypoint>
//!   <waypoint id="mayor" name="Plaza Mayor" lat="40.4154" lon="-3.7074"/>
//!   <connection from="sol" to="mayor" name="Calle Mayor"/>
//! </route>
//! ```
//!
//! Connections refer to waypoints by their `id`, or by their 0-based position
//! if a waypoint has no `id`.

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use crate::Route;

mod xml;

/// Format of the input route file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the compression based on the content
    #[default]
    Unknown,

    /// Force uncompressed XML
    Xml,

    /// Force XML with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force XML with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,
}

impl FileFormat {
    /// Guesses the format of a file based on its first few bytes.
    pub fn detect(head: &[u8]) -> Self {
        if head.starts_with(&[0x1f, 0x8b]) {
            FileFormat::XmlGz
        } else if head.starts_with(b"BZh") {
            FileFormat::XmlBz2
        } else {
            FileFormat::Xml
        }
    }
}

/// Additional controls for loading route files.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Format of the input data.
    pub file_format: FileFormat,
}

/// Error which can occur when loading a route file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("missing attribute {attribute:?} on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("invalid value {value:?} for attribute {attribute:?} on <{element}>")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },

    #[error("no <route> element")]
    MissingRoute,

    #[error("connection references unknown waypoint {0:?}")]
    UnknownWaypoint(String),
}

/// Parse a [Route] from a reader as per the provided [Options].
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn read_route_from_io<R: io::Read>(options: &Options, reader: R) -> Result<Route, Error> {
    let mut b = io::BufReader::new(reader);

    let format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(b.fill_buf()?),
        format => format,
    };

    match format {
        FileFormat::Unknown | FileFormat::Xml => xml::read_route(xml::IoParser::new(b)),

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            xml::read_route(xml::IoParser::new(io::BufReader::new(d)))
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            xml::read_route(xml::IoParser::new(io::BufReader::new(d)))
        }
    }
}

/// Parse a [Route] from a file at the provided path as per the provided [Options].
pub fn read_route_from_file<P: AsRef<Path>>(options: &Options, path: P) -> Result<Route, Error> {
    let f = File::open(path)?;
    read_route_from_io(options, f)
}

/// Parse a [Route] from a static buffer as per the provided [Options].
pub fn read_route_from_buffer(options: &Options, data: &[u8]) -> Result<Route, Error> {
    let format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(data),
        format => format,
    };

    if format == FileFormat::Xml {
        // Fast path is available for in-memory XML data
        xml::read_route(xml::BufParser::new(data))
    } else {
        let options = Options {
            file_format: format,
        };
        read_route_from_io(&options, io::Cursor::new(data))
    }
}
