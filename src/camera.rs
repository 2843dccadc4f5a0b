use serde::Deserialize;
use std::collections::HashMap;

use crate::boundaries::BoundaryFeature;
use crate::error::CameraError;

/// Duration of the fly-to animation after a selection.
pub const TRANSITION_MS: u32 = 1000;

/// Longitude step applied on every auto-rotation tick.
pub const ROTATION_STEP_DEG: f64 = 0.3;
pub const ROTATION_TICK_MS: u64 = 30;

const ALTITUDE_FAR: f64 = 2.5;
const ALTITUDE_MEDIUM_FAR: f64 = 1.8;
const ALTITUDE_MEDIUM: f64 = 1.2;
const ALTITUDE_NEAR: f64 = 0.8;

/// Camera target: where to look and how far above the surface, in globe radii.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointOfView {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
}

impl PointOfView {
    pub const WORLD: PointOfView = PointOfView {
        lat: 0.0,
        lng: 0.0,
        altitude: ALTITUDE_FAR,
    };
}

/// Partial camera target for one country; missing fields keep the computed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct CameraOverride {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub altitude: Option<f64>,
}

impl CameraOverride {
    fn apply(&self, pov: PointOfView) -> PointOfView {
        PointOfView {
            lat: self.lat.unwrap_or(pov.lat),
            lng: self.lng.unwrap_or(pov.lng),
            altitude: self.altitude.unwrap_or(pov.altitude),
        }
    }
}

/// Camera overrides keyed by numeric country id.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraOverrides(HashMap<u16, CameraOverride>);

impl Default for CameraOverrides {
    /// Large countries whose bounding box is a poor aim point.
    fn default() -> Self {
        let entries: [(u16, f64, f64, f64); 7] = [
            (643, 60.0, 100.0, 2.5), // Russia
            (124, 60.0, -95.0, 2.0), // Canada
            (840, 39.0, -98.0, 1.6), // United States
            (156, 35.0, 104.0, 1.8), // China
            (76, -10.0, -52.0, 1.6), // Brazil
            (36, -25.0, 134.0, 1.6), // Australia
            (356, 22.0, 79.0, 1.2),  // India
        ];
        CameraOverrides(
            entries
                .into_iter()
                .map(|(id, lat, lng, altitude)| {
                    (
                        id,
                        CameraOverride {
                            lat: Some(lat),
                            lng: Some(lng),
                            altitude: Some(altitude),
                        },
                    )
                })
                .collect(),
        )
    }
}

impl CameraOverrides {
    pub fn empty() -> Self {
        CameraOverrides(HashMap::new())
    }

    pub fn insert(&mut self, id: u16, entry: CameraOverride) {
        self.0.insert(id, entry);
    }

    pub fn get(&self, id: u16) -> Option<&CameraOverride> {
        self.0.get(&id)
    }
}

/// Four altitude tiers keyed on the larger angular extent.
pub fn altitude_for_extent(width: f64, height: f64) -> f64 {
    let size = width.max(height);
    if size > 50.0 {
        ALTITUDE_FAR
    } else if size > 20.0 {
        ALTITUDE_MEDIUM_FAR
    } else if size > 10.0 {
        ALTITUDE_MEDIUM
    } else {
        ALTITUDE_NEAR
    }
}

pub fn camera_for_feature(
    feature: &BoundaryFeature,
    overrides: &CameraOverrides,
) -> Result<PointOfView, CameraError> {
    let extent = feature.view_extent().ok_or(CameraError::EmptyGeometry)?;
    let (lat, lng) = extent.centroid();
    let (width, height) = (extent.width(), extent.height());
    if ![lat, lng, width, height].iter().all(|v| v.is_finite()) {
        return Err(CameraError::NonFinite);
    }

    let computed = PointOfView {
        lat,
        lng,
        altitude: altitude_for_extent(width, height),
    };
    Ok(match feature.id.and_then(|id| overrides.get(id)) {
        Some(entry) => entry.apply(computed),
        None => computed,
    })
}

/// Like [`camera_for_feature`] but never fails: falls back to the world view.
pub fn point_of_view(feature: &BoundaryFeature, overrides: &CameraOverrides) -> PointOfView {
    camera_for_feature(feature, overrides).unwrap_or_else(|e| {
        log::warn!("Camera fallback for {}: {}", feature.name, e);
        PointOfView::WORLD
    })
}

/// Maps globe altitude onto a slippy-map zoom level.
pub fn zoom_for_altitude(altitude: f64, min_zoom: f64, max_zoom: f64) -> f64 {
    let altitude = altitude.max(0.01);
    ((5.0 / altitude).log2() + 1.0).clamp(min_zoom, max_zoom)
}

/// Advances a longitude by `step` degrees, wrapped into `[-180, 180)`.
pub fn rotate_longitude(lng: f64, step: f64) -> f64 {
    (lng + step + 180.0).rem_euclid(360.0) - 180.0
}
