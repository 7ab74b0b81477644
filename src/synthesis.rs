//! Local vessel synthesis.
//!
//! When neither remote source answers, the monitor still needs traffic to
//! show. This module generates a plausible population around a position:
//! uniformly spread within the configured radius, classes drawn from a
//! weighted catalog, one vessel in five at anchor.
//!
//! With a fixed seed every call for the same center yields exactly the same
//! population, which is what the tests rely on.

use std::f64::consts::{PI, TAU};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::geo;
use crate::model::{Position, VesselClass, VesselReport};

/// Share of synthesized vessels that are stationary.
pub const STATIONARY_SHARE: f64 = 0.2;

/// Maximum deviation (knots) from a class's base speed.
pub const SPEED_VARIANCE_KNOTS: f64 = 2.0;

/// Upper bound of the random addition to the base vessel count.
pub const COUNT_VARIANCE: usize = 5;

/// Attempts at placing a vessel before it is skipped.
const MAX_PLACEMENT_ATTEMPTS: usize = 16;

/// Identity numbers for synthesized vessels start here.
const SYNTHETIC_MMSI_BASE: u64 = 1_234_567_000;

/// Traffic density around the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VesselDensity {
    Low,
    #[default]
    Medium,
    High,
}

impl VesselDensity {
    /// Vessel count before variance.
    pub fn base_count(&self) -> usize {
        match self {
            VesselDensity::Low => 20,
            VesselDensity::Medium => 50,
            VesselDensity::High => 80,
        }
    }

    /// Parse a configuration value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "low" => Some(VesselDensity::Low),
            "medium" => Some(VesselDensity::Medium),
            "high" => Some(VesselDensity::High),
            _ => None,
        }
    }
}

/// One entry of the vessel catalog.
#[derive(Debug, Clone, Copy)]
pub struct ClassProfile {
    pub class: VesselClass,
    pub weight: u32,
    pub base_speed_knots: f64,
    pub names: &'static [&'static str],
}

/// Weighted catalog of synthesized vessel classes.
pub static CATALOG: &[ClassProfile] = &[
    ClassProfile {
        class: VesselClass::Cargo,
        weight: 18,
        base_speed_knots: 14.0,
        names: &[
            "MV Mumbai Express",
            "MV Arabian Sea",
            "MV Indian Ocean",
            "MV Bay of Bengal",
            "MV Lakshadweep",
        ],
    },
    ClassProfile {
        class: VesselClass::Tanker,
        weight: 12,
        base_speed_knots: 12.0,
        names: &[
            "MT Oil Pioneer",
            "MT Crude Carrier",
            "MT Petroleum Star",
            "MT Fuel Master",
            "MT Energy Voyager",
        ],
    },
    ClassProfile {
        class: VesselClass::Fishing,
        weight: 30,
        base_speed_knots: 8.0,
        names: &[
            "FV Sea Harvest",
            "FV Ocean Bounty",
            "FV Fish Master",
            "FV Deep Sea",
            "FV Coastal Catcher",
        ],
    },
    ClassProfile {
        class: VesselClass::Passenger,
        weight: 10,
        base_speed_knots: 16.0,
        names: &[
            "MV Ferry Express",
            "MV Coastal Cruiser",
            "MV Island Hopper",
            "MV Bay Ferry",
            "MV Harbor Shuttle",
        ],
    },
    ClassProfile {
        class: VesselClass::Container,
        weight: 10,
        base_speed_knots: 18.0,
        names: &[
            "MSC Nhava Sheva",
            "Maersk Konkan",
            "CMA CGM Malabar",
            "Evergreen Ratnagiri",
        ],
    },
    ClassProfile {
        class: VesselClass::BulkCarrier,
        weight: 8,
        base_speed_knots: 13.0,
        names: &["MV Iron Monarch", "MV Grain Voyager", "MV Coal Pilgrim", "MV Ore Trader"],
    },
    ClassProfile {
        class: VesselClass::Tug,
        weight: 7,
        base_speed_knots: 7.0,
        names: &["Tug Hercules", "Tug Bhima", "Tug Samson", "Tug Sentinel"],
    },
    ClassProfile {
        class: VesselClass::Pilot,
        weight: 5,
        base_speed_knots: 10.0,
        names: &["Pilot Boat Sagar", "Pilot Boat Dhruv", "Pilot Boat Tara"],
    },
];

/// Synthesis parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    pub density: VesselDensity,

    /// Vessels are placed within this distance of the center.
    pub radius_km: f64,

    /// Fixed seed; `None` draws fresh entropy on every call.
    pub seed: Option<u64>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            density: VesselDensity::Medium,
            radius_km: 50.0,
            seed: None,
        }
    }
}

/// Generates vessel populations.
#[derive(Debug, Clone, Default)]
pub struct VesselSynthesizer {
    config: SynthesisConfig,
}

impl VesselSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Generate a population around `center`, sorted by distance from it.
    pub fn generate(&self, center: &Position) -> Vec<VesselReport> {
        match self.config.seed {
            Some(seed) => self.generate_with(&mut StdRng::seed_from_u64(seed), center),
            None => self.generate_with(&mut StdRng::from_entropy(), center),
        }
    }

    /// Generate a population using the caller's random source.
    pub fn generate_with(&self, rng: &mut impl Rng, center: &Position) -> Vec<VesselReport> {
        let count = self.config.density.base_count() + rng.gen_range(0..=COUNT_VARIANCE);
        let radius_km = self.config.radius_km.max(0.0);

        let mut vessels: Vec<(f64, VesselReport)> = (0..count)
            .filter_map(|i| {
                let mmsi = SYNTHETIC_MMSI_BASE + i as u64;
                let vessel = synthesize_vessel(rng, center, radius_km, mmsi)?;
                Some((geo::distance_km(center, &vessel.position), vessel))
            })
            .collect();

        vessels.sort_by(|a, b| a.0.total_cmp(&b.0));
        vessels.into_iter().map(|(_, vessel)| vessel).collect()
    }
}

fn pick_profile(rng: &mut impl Rng) -> &'static ClassProfile {
    let total: u32 = CATALOG.iter().map(|p| p.weight).sum();
    let mut roll = rng.gen_range(0..total);
    for profile in CATALOG {
        if roll < profile.weight {
            return profile;
        }
        roll -= profile.weight;
    }
    &CATALOG[0]
}

fn synthesize_vessel(
    rng: &mut impl Rng,
    center: &Position,
    radius_km: f64,
    mmsi: u64,
) -> Option<VesselReport> {
    let position = (0..MAX_PLACEMENT_ATTEMPTS).find_map(|_| {
        let bearing = rng.gen_range(0.0..TAU);
        let distance = rng.gen_range(0.0..=radius_km);
        // Past a pole, mirror the bearing north/south.
        [bearing, PI - bearing]
            .into_iter()
            .map(|bearing| geo::offset(center, distance, bearing))
            .find(Position::is_valid)
    })?;

    let profile = pick_profile(rng);
    let name = profile.names[rng.gen_range(0..profile.names.len())];

    let (speed_knots, heading_deg) = if rng.gen_bool(STATIONARY_SHARE) {
        (0.0, 0.0)
    } else {
        let speed = profile.base_speed_knots
            + rng.gen_range(-SPEED_VARIANCE_KNOTS..=SPEED_VARIANCE_KNOTS);
        (speed.max(0.0), rng.gen_range(0.0..360.0))
    };

    Some(VesselReport {
        mmsi,
        name: name.to_string(),
        class: profile.class,
        position,
        heading_deg,
        speed_knots,
    })
}
