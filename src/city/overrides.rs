//! Per-district intervention overrides.

use serde::{Deserialize, Serialize};

use super::catalog::{DISTRICT_COUNT, DistrictId};

/// Upper bound for a district's local storage (MWh).
pub const MAX_LOCAL_STORAGE_MWH: f64 = 5.0;
/// Upper bound for a district's rooftop solar boost (fraction).
pub const MAX_SOLAR_BOOST: f64 = 0.35;

/// Interventions applied to a single district.
///
/// `Copy` value; every mutator returns a new override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistrictOverride {
    /// Local storage (MWh), 0..=5 after [`DistrictOverride::add_storage`].
    pub storage_mwh: f64,
    /// Transformer upgrade (MW). Unbounded accumulator.
    pub cap_boost_mw: f64,
    /// Additional rooftop solar penetration, 0..=0.35 after
    /// [`DistrictOverride::add_solar`].
    pub solar_boost: f64,
    /// Local managed demand response.
    pub dr_enabled: bool,
}

impl DistrictOverride {
    /// Adds `mwh` of local storage, clamped to `0..=5`.
    ///
    /// ```
    /// use citygrid_twin::city::DistrictOverride;
    ///
    /// let o = DistrictOverride::default().add_storage(4.0).add_storage(4.0);
    /// assert_eq!(o.storage_mwh, 5.0);
    /// ```
    pub fn add_storage(self, mwh: f64) -> Self {
        Self {
            storage_mwh: (self.storage_mwh + mwh).clamp(0.0, MAX_LOCAL_STORAGE_MWH),
            ..self
        }
    }

    pub fn add_capacity(self, mw: f64) -> Self {
        Self {
            cap_boost_mw: self.cap_boost_mw + mw,
            ..self
        }
    }

    /// Adds solar penetration, clamped to `0..=0.35`.
    pub fn add_solar(self, boost: f64) -> Self {
        Self {
            solar_boost: (self.solar_boost + boost).clamp(0.0, MAX_SOLAR_BOOST),
            ..self
        }
    }

    pub fn toggle_dr(self) -> Self {
        Self {
            dr_enabled: !self.dr_enabled,
            ..self
        }
    }

    pub fn with_dr(self, on: bool) -> Self {
        Self {
            dr_enabled: on,
            ..self
        }
    }

    /// Number of active intervention fields (0..=4).
    pub fn active_count(&self) -> usize {
        [
            self.storage_mwh > 0.0,
            self.cap_boost_mw > 0.0,
            self.solar_boost > 0.0,
            self.dr_enabled,
        ]
        .into_iter()
        .filter(|on| *on)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }
}

/// Exactly one [`DistrictOverride`] per catalog district.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DistrictOverrides {
    entries: [DistrictOverride; DISTRICT_COUNT],
}

impl DistrictOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: DistrictId) -> &DistrictOverride {
        &self.entries[id.index()]
    }

    /// Returns a copy with `id`'s override replaced by `f(current)`.
    ///
    /// ```
    /// use citygrid_twin::city::{DistrictId, DistrictOverrides};
    ///
    /// let a = DistrictOverrides::new();
    /// let b = a.updated(DistrictId::Medical, |o| o.add_capacity(10.0));
    /// assert_eq!(a.get(DistrictId::Medical).cap_boost_mw, 0.0);
    /// assert_eq!(b.get(DistrictId::Medical).cap_boost_mw, 10.0);
    /// ```
    pub fn updated(&self, id: DistrictId, f: impl FnOnce(DistrictOverride) -> DistrictOverride) -> Self {
        let mut next = *self;
        next.entries[id.index()] = f(self.entries[id.index()]);
        next
    }

    /// Returns a copy with `id` reset to the default override.
    pub fn cleared(&self, id: DistrictId) -> Self {
        self.updated(id, |_| DistrictOverride::default())
    }

    /// Iterates `(id, override)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (DistrictId, &DistrictOverride)> {
        DistrictId::ALL.into_iter().zip(self.entries.iter())
    }

    /// Total active override fields across all districts.
    pub fn count_interventions(&self) -> usize {
        self.entries.iter().map(DistrictOverride::active_count).sum()
    }

    pub fn has_overrides(&self) -> bool {
        self.count_interventions() > 0
    }

    /// Number of districts with local demand response on.
    pub fn local_dr_count(&self) -> usize {
        self.entries.iter().filter(|o| o.dr_enabled).count()
    }
}
