use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use routequest::{Coordinate, Route, RouteSession, SessionOptions};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct RouteLoadError(PathBuf, #[source] routequest::route_file::Error);

#[derive(Parser)]
struct Cli {
    /// The path to the route file
    route_file: PathBuf,

    /// Latitude of the user
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude of the user
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Maximum distance to a waypoint (in meters) for its challenge to be available
    #[arg(long, default_value_t = routequest::DEFAULT_PROXIMITY_THRESHOLD)]
    threshold: f64,

    /// Indices of waypoints to mark as completed, in order
    #[arg(long = "complete", value_name = "INDEX")]
    completed: Vec<usize>,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let route = load_route(&cli.route_file)?;

    let mut session = RouteSession::new(SessionOptions {
        proximity_threshold: cli.threshold,
        ..Default::default()
    });
    session.select_route(route);

    if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
        session.update_position(Some(Coordinate::new(lat, lon)));
    }

    for &index in &cli.completed {
        session.complete(index)?;
    }

    let progress = session.progress();
    log::info!(
        "{} of {} waypoints completed ({}%)",
        progress.completed_count(),
        progress.len(),
        progress.progress_percent()
    );
    if let Some(next) = progress.next_waypoint() {
        log::info!("next waypoint: {}", next.name);
    }

    println!("{{");
    println!("  \"type\": \"FeatureCollection\",");
    println!("  \"features\": [");

    let mut features = Vec::new();

    for (idx, waypoint) in progress.waypoints().iter().enumerate() {
        let Some(c) = Coordinate::known(waypoint.coordinate) else {
            continue;
        };

        let distance = session
            .waypoint_distance(idx)
            .map(|d| format!("{:.1}", d))
            .unwrap_or_else(|| "null".to_string());
        let eligibility = session
            .eligibility(idx)
            .map(|e| e.to_string())
            .unwrap_or_default();

        features.push(format!(
            concat!(
                "    {{\n",
                "      \"type\": \"Feature\",\n",
                "      \"properties\": {{\"index\": {}, \"name\": {}, \"completed\": {}, ",
                "\"current\": {}, \"eligibility\": \"{}\", \"distance\": {}}},\n",
                "      \"geometry\": {{\"type\": \"Point\", \"coordinates\": [{}, {}]}}\n",
                "    }}"
            ),
            idx,
            json_string(&waypoint.name),
            progress.is_completed(idx),
            idx == progress.current_index(),
            eligibility,
            distance,
            c.lon,
            c.lat,
        ));
    }

    let connections = session
        .route()
        .map(|r| r.connections.as_slice())
        .unwrap_or_default();
    for connection in connections {
        let from = progress.get(connection.from).and_then(|w| Coordinate::known(w.coordinate));
        let to = progress.get(connection.to).and_then(|w| Coordinate::known(w.coordinate));
        if let (Some(from), Some(to)) = (from, to) {
            features.push(format!(
                concat!(
                    "    {{\n",
                    "      \"type\": \"Feature\",\n",
                    "      \"properties\": {{\"name\": {}}},\n",
                    "      \"geometry\": {{\"type\": \"LineString\", \"coordinates\": [[{}, {}], [{}, {}]]}}\n",
                    "    }}"
                ),
                json_string(connection.name.as_deref().unwrap_or("")),
                from.lon,
                from.lat,
                to.lon,
                to.lat,
            ));
        }
    }

    println!("{}", features.join(",\n"));
    println!("  ]");
    println!("}}");

    Ok(())
}

fn load_route<P: AsRef<Path>>(path: P) -> Result<Route, RouteLoadError> {
    let options = routequest::route_file::Options::default();
    match routequest::route_file::read_route_from_file(&options, path.as_ref()) {
        Ok(r) => Ok(r),
        Err(e) => Err(RouteLoadError(PathBuf::from(path.as_ref()), e)),
    }
}

/// Formats a string as a quoted JSON string literal.
fn json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32))
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
