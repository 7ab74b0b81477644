//! Map rendering of safety snapshots.
//!
//! Renderers turn a [`SafetySnapshot`] and a [`Viewport`] into something a
//! display can draw. The monitor never depends on a particular renderer;
//! consumers pick one through the [`MapRenderer`] trait.
//!
//! # Renderers
//!
//! - [`GeoJsonRenderer`]: a GeoJSON `FeatureCollection` for tile-based maps
//! - [`MarkerRenderer`]: projected screen-space markers for canvas drawing

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::geo;
use crate::model::{MotionState, Position, SafetySnapshot, VesselClass, VesselContact, VesselRiskTier};

/// Pixel size of one map tile.
pub const TILE_SIZE: f64 = 256.0;

/// Colour of stationary vessels regardless of class.
pub const STATIONARY_COLOR: &str = "#6b7280";

/// The visible area of a map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: Position,
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(center: Position, zoom: u8, width: u32, height: u32) -> Self {
        Self {
            center,
            zoom,
            width,
            height,
        }
    }

    /// Screen coordinates of a position.
    ///
    /// Linear in degrees: `x = (lon - center.lon) * 2^zoom * 256 + width / 2`,
    /// `y = (center.lat - lat) * 2^zoom * 256 + height / 2`.
    pub fn project(&self, position: &Position) -> (f64, f64) {
        let scale = 2f64.powi(i32::from(self.zoom)) * TILE_SIZE;
        let x = geo::longitude_delta(&self.center, position) * scale + f64::from(self.width) / 2.0;
        let y = (self.center.latitude - position.latitude) * scale + f64::from(self.height) / 2.0;
        (x, y)
    }

    /// Whether a screen point lies inside the viewport.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=f64::from(self.width)).contains(&x) && (0.0..=f64::from(self.height)).contains(&y)
    }
}

/// A way of drawing a snapshot.
pub trait MapRenderer {
    type Output: Serialize;

    /// Render `snapshot` as seen through `viewport`.
    fn render(&self, snapshot: &SafetySnapshot, viewport: &Viewport) -> Self::Output;
}

// ============================================================================
// GeoJSON
// ============================================================================

/// GeoJSON point geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,

    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
}

impl Geometry {
    fn point(position: &Position) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: [position.longitude, position.latitude],
        }
    }
}

/// GeoJSON feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry,
    pub properties: serde_json::Value,
}

/// GeoJSON feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

/// Renders the user position and every vessel as GeoJSON points.
///
/// The viewport is ignored; tile maps do their own clipping.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonRenderer;

impl MapRenderer for GeoJsonRenderer {
    type Output = FeatureCollection;

    fn render(&self, snapshot: &SafetySnapshot, _viewport: &Viewport) -> FeatureCollection {
        let user = Feature {
            kind: "Feature".to_string(),
            geometry: Geometry::point(&snapshot.position),
            properties: json!({
                "kind": "user",
                "overall_status": snapshot.overall_status,
                "status_message": snapshot.status_message,
                "data_source": snapshot.data_source,
                "generated_at": snapshot.generated_at,
            }),
        };

        let vessels = snapshot.vessels.iter().map(|vessel| Feature {
            kind: "Feature".to_string(),
            geometry: Geometry::point(&vessel.position),
            properties: json!({
                "kind": "vessel",
                "mmsi": vessel.mmsi,
                "name": vessel.name,
                "class": vessel.class.label(),
                "risk_tier": vessel.risk_tier,
                "motion_state": vessel.motion_state,
                "distance_km": vessel.distance_km,
                "speed_knots": vessel.speed_knots,
                "heading_deg": vessel.heading_deg,
            }),
        });

        FeatureCollection {
            kind: "FeatureCollection".to_string(),
            features: std::iter::once(user).chain(vessels).collect(),
        }
    }
}

// ============================================================================
// Screen markers
// ============================================================================

/// Marker glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShape {
    /// Moving vessel, pointing along its heading.
    Triangle,
    /// Stationary vessel.
    Circle,
}

/// A vessel marker in screen space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub mmsi: u64,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub shape: MarkerShape,

    /// Clockwise rotation from north, degrees.
    pub rotation_deg: f64,
    pub color: String,
    pub size: u32,

    /// DANGER markers are drawn pulsing.
    pub pulse: bool,
    pub risk_tier: VesselRiskTier,
}

/// Screen-space rendering of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerLayer {
    pub viewport: Viewport,

    /// User position in screen space.
    pub user_x: f64,
    pub user_y: f64,
    pub markers: Vec<Marker>,

    /// Vessels left out because they fall outside the viewport.
    pub culled: usize,
}

/// Projects vessels into screen-space markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerRenderer;

impl MarkerRenderer {
    /// Marker for a contact, before culling.
    pub fn marker(&self, vessel: &VesselContact, viewport: &Viewport) -> Marker {
        let (x, y) = viewport.project(&vessel.position);
        let (shape, rotation_deg, color) = match vessel.motion_state {
            MotionState::Moving => (
                MarkerShape::Triangle,
                vessel.heading_deg,
                class_color(vessel.class),
            ),
            MotionState::Stationary => (MarkerShape::Circle, 0.0, STATIONARY_COLOR),
        };

        Marker {
            mmsi: vessel.mmsi,
            name: vessel.name.clone(),
            x,
            y,
            shape,
            rotation_deg,
            color: color.to_string(),
            size: class_size(vessel.class),
            pulse: vessel.risk_tier == VesselRiskTier::Danger,
            risk_tier: vessel.risk_tier,
        }
    }
}

impl MapRenderer for MarkerRenderer {
    type Output = MarkerLayer;

    fn render(&self, snapshot: &SafetySnapshot, viewport: &Viewport) -> MarkerLayer {
        let (user_x, user_y) = viewport.project(&snapshot.position);

        let (markers, culled): (Vec<Marker>, Vec<Marker>) = snapshot
            .vessels
            .iter()
            .map(|vessel| self.marker(vessel, viewport))
            .partition(|marker| viewport.contains(marker.x, marker.y));

        MarkerLayer {
            viewport: *viewport,
            user_x,
            user_y,
            markers,
            culled: culled.len(),
        }
    }
}

/// Marker colour for a moving vessel of `class`.
pub fn class_color(class: VesselClass) -> &'static str {
    match class {
        VesselClass::Cargo => "#3b82f6",
        VesselClass::Tanker => "#ef4444",
        VesselClass::Fishing => "#10b981",
        VesselClass::Passenger => "#f59e0b",
        _ => "#8b5cf6",
    }
}

/// Marker size in pixels for `class`.
pub fn class_size(class: VesselClass) -> u32 {
    match class {
        VesselClass::Tanker => 20,
        VesselClass::Cargo => 16,
        VesselClass::Fishing => 12,
        _ => 14,
    }
}
