use std::collections::HashMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Unit of an area constraint value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaUnit {
    /// Raw floor area, normalized against total GFA.
    Sqm,
    /// Percentage of total floor area.
    #[default]
    Percent,
}

/// A per-zone area target. A missing `value` leaves the zone's share to be
/// derived from the unassigned remainder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AreaConstraint {
    pub zone: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: AreaUnit,
}

impl AreaConstraint {
    pub fn new(zone: impl Into<String>, value: Option<f64>, unit: AreaUnit) -> Self {
        Self { zone: zone.into(), value, unit }
    }

    /// Express the constraint as a share of total floor area in `[0, 1]`.
    fn normalized(&self, total_gfa: f64) -> Option<f64> {
        self.value.map(|v| match self.unit {
            AreaUnit::Sqm if total_gfa > 0.0 => v / total_gfa,
            AreaUnit::Sqm => 0.0,
            AreaUnit::Percent => v / 100.0,
        })
    }
}

/// The zone catalog: short codes, a pairwise affinity/repulsion matrix
/// (negative = attract, positive = repel, diagonal unused), and the selected
/// zones with their area constraints.
#[derive(Clone, Debug)]
pub struct RoomData {
    codes: Vec<String>,
    index: HashMap<String, usize>,
    affinity: Array2<f64>,
    selected: Vec<AreaConstraint>,
}

impl RoomData {
    /// Build a catalog from zone codes, a square affinity matrix in code
    /// order, and the selected-zone constraints.
    pub fn new(
        codes: Vec<String>,
        affinity: Vec<Vec<f64>>,
        selected: Vec<AreaConstraint>,
    ) -> Result<Self, LayoutError> {
        let n = codes.len();
        if affinity.len() != n || affinity.iter().any(|row| row.len() != n) {
            return Err(LayoutError::Configuration(format!(
                "affinity matrix must be {n}x{n} to match the zone codes"
            )));
        }
        let index: HashMap<String, usize> =
            codes.iter().enumerate().map(|(i, c)| (c.clone(), i)).collect();
        for constraint in &selected {
            if !index.contains_key(&constraint.zone) {
                return Err(LayoutError::Configuration(format!(
                    "selected zone '{}' is not in the catalog",
                    constraint.zone
                )));
            }
        }

        let mut matrix = Array2::zeros((n, n));
        for (i, row) in affinity.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                matrix[[i, j]] = v;
            }
        }

        Ok(Self { codes, index, affinity: matrix, selected })
    }

    #[inline] pub fn codes(&self) -> &[String] { &self.codes }

    /// Raw (un-symmetrized) affinity entry between two zone codes.
    #[inline]
    pub fn affinity(&self, a: &str, b: &str) -> f64 {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&i), Some(&j)) => self.affinity[[i, j]],
            _ => 0.0,
        }
    }

    /// The active zone codes in catalog order: the selected zones, or every
    /// catalog zone when no selection was made.
    pub fn selected_codes(&self) -> Vec<String> {
        if self.selected.is_empty() {
            return self.codes.clone();
        }
        self.codes.iter()
            .filter(|code| self.selected.iter().any(|c| &c.zone == *code))
            .cloned()
            .collect()
    }

    /// Per-selected-zone area shares in `[0, 1]`, aligned with
    /// [`Self::selected_codes`]. `None` marks a zone whose share is left to
    /// the unassigned remainder.
    pub fn normalized_shares(&self, total_gfa: f64) -> Vec<Option<f64>> {
        self.selected_codes().iter()
            .map(|code| {
                self.selected.iter()
                    .find(|c| &c.zone == code)
                    .and_then(|c| c.normalized(total_gfa))
            })
            .collect()
    }
}
