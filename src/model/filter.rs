use crate::model::{Property, PropertyStatus, PropertyType};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Search criteria for the properties listing. Absent fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    /// Case-insensitive substring matched against name or location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PropertyStatus>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<PropertyType>,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => {
                let query = query.to_lowercase();
                property.name.to_lowercase().contains(&query)
                    || property.location.to_lowercase().contains(&query)
            }
        };
        let matches_status = self.status.map_or(true, |status| property.status == status);
        let matches_type = self.kind.map_or(true, |kind| property.kind == kind);

        matches_search && matches_status && matches_type
    }

    /// Keep matching properties, preserving their sequence
    pub fn apply<'a>(&self, properties: impl IntoIterator<Item = &'a Property>) -> Vec<Property> {
        properties
            .into_iter()
            .filter(|property| self.matches(property))
            .cloned()
            .collect()
    }
}

/// Per-status tally shown next to the map legend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub available: usize,
    pub pending: usize,
    pub sold: usize,
    pub rented: usize,
    pub total: usize,
}

impl StatusCounts {
    pub fn from_properties<'a>(properties: impl IntoIterator<Item = &'a Property>) -> Self {
        let counts = properties.into_iter().map(|p| p.status).counts();
        let get = |status| counts.get(&status).copied().unwrap_or(0);

        Self {
            available: get(PropertyStatus::Available),
            pending: get(PropertyStatus::Pending),
            sold: get(PropertyStatus::Sold),
            rented: get(PropertyStatus::Rented),
            total: counts.values().sum(),
        }
    }

    pub fn get(&self, status: PropertyStatus) -> usize {
        match status {
            PropertyStatus::Available => self.available,
            PropertyStatus::Pending => self.pending,
            PropertyStatus::Sold => self.sold,
            PropertyStatus::Rented => self.rented,
        }
    }
}
