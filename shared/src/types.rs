//! Common types used across the ledger

use serde::{Deserialize, Serialize};

/// Sort direction for report columns
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Column a material reference report is sorted by
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSort {
    #[default]
    Dimensions,
    Material,
    TotalConsumed,
}

impl ReferenceSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceSort::Dimensions => "dimensions",
            ReferenceSort::Material => "material",
            ReferenceSort::TotalConsumed => "total_consumed",
        }
    }
}

/// Free-text filters for the active stock list
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LotSearch {
    pub dimensions: Option<String>,
    pub material: Option<String>,
    pub supplier: Option<String>,
}

impl LotSearch {
    pub fn is_empty(&self) -> bool {
        [&self.dimensions, &self.material, &self.supplier]
            .iter()
            .all(|f| f.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}
