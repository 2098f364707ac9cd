//! Fixed district catalog: topology, base load/capacity, demographics and
//! stressor sensitivities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Number of districts in the catalog.
pub const DISTRICT_COUNT: usize = 8;

/// Identifier of one of the eight fixed city districts.
///
/// The declaration order is the catalog order; every per-district iteration,
/// stable sort and tie-break in the crate follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistrictId {
    Downtown,
    Industrial,
    University,
    Medical,
    Eastside,
    North,
    South,
    Waterfront,
}

impl DistrictId {
    /// All district ids in catalog order.
    pub const ALL: [DistrictId; DISTRICT_COUNT] = [
        DistrictId::Downtown,
        DistrictId::Industrial,
        DistrictId::University,
        DistrictId::Medical,
        DistrictId::Eastside,
        DistrictId::North,
        DistrictId::South,
        DistrictId::Waterfront,
    ];

    /// Position of this district in catalog order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable lowercase key, also used in config files and hash inputs.
    pub fn as_str(self) -> &'static str {
        match self {
            DistrictId::Downtown => "downtown",
            DistrictId::Industrial => "industrial",
            DistrictId::University => "university",
            DistrictId::Medical => "medical",
            DistrictId::Eastside => "eastside",
            DistrictId::North => "north",
            DistrictId::South => "south",
            DistrictId::Waterfront => "waterfront",
        }
    }

    /// `true` for the districts hosting critical infrastructure.
    pub fn is_critical(self) -> bool {
        matches!(self, DistrictId::Medical | DistrictId::Downtown)
    }

    /// Catalog entry for this id.
    pub fn district(self) -> &'static District {
        &DISTRICTS[self.index()]
    }

    /// Human-readable district name.
    pub fn name(self) -> &'static str {
        self.district().name
    }
}

impl fmt::Display for DistrictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown district key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown district \"{0}\"")]
pub struct UnknownDistrict(pub String);

impl FromStr for DistrictId {
    type Err = UnknownDistrict;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DistrictId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDistrict(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for DistrictId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}

/// Stressor sensitivity multipliers of a district.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sensitivity {
    pub heat: f64,
    pub storm: f64,
    pub event: f64,
}

/// Immutable catalog entry for one district.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct District {
    pub id: DistrictId,
    pub name: &'static str,
    /// Axial hex-grid column.
    pub q: i32,
    /// Axial hex-grid row.
    pub r: i32,
    pub base_load_mw: f64,
    pub base_capacity_mw: f64,
    pub population: u32,
    /// Baseline EV adoption fraction (0..1).
    pub ev_adoption: f64,
    /// Baseline rooftop solar penetration fraction (0..1).
    pub solar_penetration: f64,
    /// Criticality weight (0..1), biases overload probability upward.
    pub criticality: f64,
    pub sensitivity: Sensitivity,
}

/// The district catalog, in [`DistrictId::ALL`] order.
pub static DISTRICTS: [District; DISTRICT_COUNT] = [
    District {
        id: DistrictId::Downtown,
        name: "Downtown Core",
        q: 0,
        r: 0,
        base_load_mw: 62.0,
        base_capacity_mw: 92.0,
        population: 48_000,
        ev_adoption: 0.14,
        solar_penetration: 0.08,
        criticality: 0.9,
        sensitivity: Sensitivity {
            heat: 1.1,
            storm: 1.0,
            event: 1.0,
        },
    },
    District {
        id: DistrictId::Industrial,
        name: "Industrial Belt",
        q: 1,
        r: -1,
        base_load_mw: 78.0,
        base_capacity_mw: 118.0,
        population: 12_000,
        ev_adoption: 0.06,
        solar_penetration: 0.12,
        criticality: 0.6,
        sensitivity: Sensitivity {
            heat: 0.8,
            storm: 1.1,
            event: 0.2,
        },
    },
    District {
        id: DistrictId::University,
        name: "University District",
        q: -1,
        r: 0,
        base_load_mw: 40.0,
        base_capacity_mw: 62.0,
        population: 36_000,
        ev_adoption: 0.18,
        solar_penetration: 0.16,
        criticality: 0.5,
        sensitivity: Sensitivity {
            heat: 1.0,
            storm: 0.9,
            event: 0.6,
        },
    },
    District {
        id: DistrictId::Medical,
        name: "Medical Campus",
        q: 0,
        r: -1,
        base_load_mw: 45.0,
        base_capacity_mw: 66.0,
        population: 15_000,
        ev_adoption: 0.10,
        solar_penetration: 0.10,
        criticality: 1.0,
        sensitivity: Sensitivity {
            heat: 1.2,
            storm: 1.0,
            event: 0.3,
        },
    },
    District {
        id: DistrictId::Eastside,
        name: "Eastside",
        q: 1,
        r: 0,
        base_load_mw: 38.0,
        base_capacity_mw: 56.0,
        population: 52_000,
        ev_adoption: 0.12,
        solar_penetration: 0.14,
        criticality: 0.4,
        sensitivity: Sensitivity {
            heat: 1.15,
            storm: 1.0,
            event: 0.2,
        },
    },
    District {
        id: DistrictId::North,
        name: "North Hills",
        q: -1,
        r: -1,
        base_load_mw: 34.0,
        base_capacity_mw: 54.0,
        population: 44_000,
        ev_adoption: 0.20,
        solar_penetration: 0.22,
        criticality: 0.3,
        sensitivity: Sensitivity {
            heat: 0.95,
            storm: 0.9,
            event: 0.1,
        },
    },
    District {
        id: DistrictId::South,
        name: "South Park",
        q: 0,
        r: 1,
        base_load_mw: 36.0,
        base_capacity_mw: 55.0,
        population: 50_000,
        ev_adoption: 0.11,
        solar_penetration: 0.18,
        criticality: 0.35,
        sensitivity: Sensitivity {
            heat: 1.05,
            storm: 1.0,
            event: 0.1,
        },
    },
    District {
        id: DistrictId::Waterfront,
        name: "Waterfront",
        q: -1,
        r: 1,
        base_load_mw: 30.0,
        base_capacity_mw: 44.0,
        population: 22_000,
        ev_adoption: 0.15,
        solar_penetration: 0.20,
        criticality: 0.45,
        sensitivity: Sensitivity {
            heat: 0.9,
            storm: 1.4,
            event: 0.5,
        },
    },
];

/// Feeder interconnections between neighbouring districts.
pub const EDGES: [(DistrictId, DistrictId); 10] = [
    (DistrictId::Downtown, DistrictId::Industrial),
    (DistrictId::Downtown, DistrictId::University),
    (DistrictId::Downtown, DistrictId::Medical),
    (DistrictId::Downtown, DistrictId::Eastside),
    (DistrictId::Downtown, DistrictId::South),
    (DistrictId::Downtown, DistrictId::Waterfront),
    (DistrictId::Industrial, DistrictId::Medical),
    (DistrictId::University, DistrictId::North),
    (DistrictId::Medical, DistrictId::North),
    (DistrictId::South, DistrictId::Waterfront),
];

/// Returns the catalog in catalog order.
pub fn districts() -> &'static [District; DISTRICT_COUNT] {
    &DISTRICTS
}

/// Districts directly connected to `id`.
pub fn neighbours(id: DistrictId) -> Vec<DistrictId> {
    EDGES
        .iter()
        .filter_map(|&(a, b)| match (a == id, b == id) {
            (true, _) => Some(b),
            (_, true) => Some(a),
            _ => None,
        })
        .collect()
}
