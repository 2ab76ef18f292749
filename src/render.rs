//! Presentation of route plans: cards, weather panel, map layers and GPX

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::LatLng;
use crate::safety::WeatherAnalysis;
use crate::scoring::{ScoredRoute, ScoringStrategy};

pub const BEST_ROUTE_COLOR: &str = "#4CAF50";
pub const ALTERNATIVE_ROUTE_COLOR: &str = "#FFD700";
pub const FROM_MARKER_COLOR: &str = "#4CAF50";
pub const TO_MARKER_COLOR: &str = "#ff0000";

const WEATHER_CAUTION: &str = "⚠️ Consider weather conditions before traveling";
const WEATHER_SAFE: &str = "Weather conditions are safe for travel";

/// Text block describing one route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteCard {
    pub index: usize,
    pub heading: String,
    pub lines: Vec<String>,
    pub is_best: bool,
}

impl RouteCard {
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = self.heading.clone();
        for line in &self.lines {
            text.push('\n');
            text.push_str(line);
        }
        text
    }
}

/// One card per route, in provider order
#[must_use]
pub fn route_cards(
    routes: &[ScoredRoute],
    strategy: ScoringStrategy,
    weather: &WeatherAnalysis,
) -> Vec<RouteCard> {
    routes
        .iter()
        .enumerate()
        .map(|(index, route)| route_card(index, route, strategy, weather))
        .collect()
}

fn route_card(
    index: usize,
    route: &ScoredRoute,
    strategy: ScoringStrategy,
    weather: &WeatherAnalysis,
) -> RouteCard {
    let heading = match (route.is_best, strategy) {
        (true, ScoringStrategy::Model) => "🌟 Best Route (ML Recommended)".to_string(),
        (true, ScoringStrategy::ClosedForm) => "🌟 Best Route".to_string(),
        (false, _) => format!("Route {}", index + 1),
    };

    let candidate = &route.candidate;
    let score_line = match strategy {
        ScoringStrategy::Model => format!("ML Prediction Score: {:.1}%", route.score * 100.0),
        ScoringStrategy::ClosedForm => format!("Score: {:.1}%", route.score * 100.0),
    };

    let mut lines = vec![
        format!("Distance: {}", candidate.distance.text),
        format!("Duration: {}", candidate.duration.text),
        score_line,
        format!("Carbon Footprint: {:.2} kg CO2e", route.carbon_kg),
        format!("Start: {}", candidate.start_address),
        format!("End: {}", candidate.end_address),
    ];
    if !weather.safe {
        lines.push(WEATHER_CAUTION.to_string());
    }

    RouteCard {
        index,
        heading,
        lines,
        is_best: route.is_best,
    }
}

/// Weather summary shown next to the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherPanel {
    pub safe: bool,
    pub lines: Vec<String>,
}

impl WeatherPanel {
    #[must_use]
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

#[must_use]
pub fn weather_panel(analysis: &WeatherAnalysis) -> WeatherPanel {
    let Some(conditions) = &analysis.conditions else {
        let lines = match &analysis.message {
            Some(message) => vec![message.clone()],
            None => analysis.warnings.clone(),
        };
        return WeatherPanel {
            safe: analysis.safe,
            lines,
        };
    };

    let mut lines = vec![
        format!("🌡️ {}", conditions.format_temperature()),
        format!("💨 {}", conditions.format_wind()),
        format!("👁️ {}", conditions.format_visibility()),
        format!("🌤️ {}", conditions.description),
    ];
    if analysis.safe {
        lines.push(WEATHER_SAFE.to_string());
    } else {
        lines.push(format!("⚠️ Weather warnings: {}", analysis.warnings.join(", ")));
    }

    WeatherPanel {
        safe: analysis.safe,
        lines,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: &'static str,
    pub weight: u8,
    pub opacity: f64,
    /// SVG dash pattern, `None` for a solid line
    pub dash_array: Option<&'static str>,
}

impl LineStyle {
    #[must_use]
    pub fn best() -> Self {
        Self {
            color: BEST_ROUTE_COLOR,
            weight: 6,
            opacity: 1.0,
            dash_array: None,
        }
    }

    #[must_use]
    pub fn alternative() -> Self {
        Self {
            color: ALTERNATIVE_ROUTE_COLOR,
            weight: 3,
            opacity: 0.7,
            dash_array: Some("5, 10"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteLayer {
    pub index: usize,
    pub path: Vec<LatLng>,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: LatLng,
    pub label: String,
    pub color: &'static str,
}

/// South-west and north-east corners enclosing every drawn path
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

/// Everything drawn on the map for a plan or a selected route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapOverlay {
    pub routes: Vec<RouteLayer>,
    pub markers: Vec<Marker>,
    pub bounds: Option<MapBounds>,
}

/// Layers for every route; alternatives come first so the best route is drawn on top
#[must_use]
pub fn map_overlay(routes: &[ScoredRoute]) -> MapOverlay {
    let mut layers: Vec<RouteLayer> = routes
        .iter()
        .enumerate()
        .map(|(index, route)| route_layer(index, route))
        .collect();
    layers.sort_by_key(|layer| layer.style.color == BEST_ROUTE_COLOR);

    let markers = routes
        .iter()
        .find(|r| r.is_best)
        .or(routes.first())
        .map(endpoint_markers)
        .unwrap_or_default();

    let bounds = bounds(layers.iter().flat_map(|l| l.path.iter()));
    MapOverlay {
        routes: layers,
        markers,
        bounds,
    }
}

/// Layer and endpoint markers for a single selected route, drawn as the primary line
#[must_use]
pub fn route_overlay(index: usize, route: &ScoredRoute) -> MapOverlay {
    let layer = RouteLayer {
        index,
        path: route.candidate.overview_path.clone(),
        style: LineStyle::best(),
    };
    let bounds = bounds(layer.path.iter());
    MapOverlay {
        routes: vec![layer],
        markers: endpoint_markers(route),
        bounds,
    }
}

fn route_layer(index: usize, route: &ScoredRoute) -> RouteLayer {
    RouteLayer {
        index,
        path: route.candidate.overview_path.clone(),
        style: if route.is_best {
            LineStyle::best()
        } else {
            LineStyle::alternative()
        },
    }
}

fn endpoint_markers(route: &ScoredRoute) -> Vec<Marker> {
    vec![
        Marker {
            position: route.candidate.start_location,
            label: route.candidate.start_address.clone(),
            color: FROM_MARKER_COLOR,
        },
        Marker {
            position: route.candidate.end_location,
            label: route.candidate.end_address.clone(),
            color: TO_MARKER_COLOR,
        },
    ]
}

fn bounds<'a>(points: impl Iterator<Item = &'a LatLng>) -> Option<MapBounds> {
    points.fold(None, |acc, p| {
        Some(match acc {
            None => MapBounds {
                south_west: *p,
                north_east: *p,
            },
            Some(b) => MapBounds {
                south_west: LatLng::new(b.south_west.lat.min(p.lat), b.south_west.lng.min(p.lng)),
                north_east: LatLng::new(b.north_east.lat.max(p.lat), b.north_east.lng.max(p.lng)),
            },
        })
    })
}

#[derive(Debug, Serialize)]
struct Gpx {
    #[serde(rename = "@version")]
    version: &'static str,
    #[serde(rename = "@creator")]
    creator: &'static str,
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "wpt")]
    waypoints: Vec<GpxWaypoint>,
    trk: GpxTrack,
}

#[derive(Debug, Serialize)]
struct GpxWaypoint {
    #[serde(rename = "@lat")]
    lat: f64,
    #[serde(rename = "@lon")]
    lon: f64,
    name: String,
}

#[derive(Debug, Serialize)]
struct GpxTrack {
    name: String,
    trkseg: GpxSegment,
}

#[derive(Debug, Serialize)]
struct GpxSegment {
    trkpt: Vec<GpxPoint>,
}

#[derive(Debug, Serialize)]
struct GpxPoint {
    #[serde(rename = "@lat")]
    lat: f64,
    #[serde(rename = "@lon")]
    lon: f64,
}

/// GPX 1.1 document with the overview path as a track and the endpoints as waypoints
pub fn to_gpx(route: &ScoredRoute) -> Result<String> {
    let candidate = &route.candidate;
    let gpx = Gpx {
        version: "1.1",
        creator: "ecoroute",
        xmlns: "http://www.topografix.com/GPX/1/1",
        waypoints: vec![
            GpxWaypoint {
                lat: candidate.start_location.lat,
                lon: candidate.start_location.lng,
                name: candidate.start_address.clone(),
            },
            GpxWaypoint {
                lat: candidate.end_location.lat,
                lon: candidate.end_location.lng,
                name: candidate.end_address.clone(),
            },
        ],
        trk: GpxTrack {
            name: if candidate.summary.is_empty() {
                format!("{} to {}", candidate.start_address, candidate.end_address)
            } else {
                candidate.summary.clone()
            },
            trkseg: GpxSegment {
                trkpt: candidate
                    .overview_path
                    .iter()
                    .map(|p| GpxPoint {
                        lat: p.lat,
                        lon: p.lng,
                    })
                    .collect(),
            },
        },
    };

    let body = quick_xml::se::to_string_with_root("gpx", &gpx).context("Failed to serialize GPX")?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}"))
}
