use crate::model::{generate_id, Id};
use crate::logic::ordering::{self, Ordered};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Available,
    Pending,
    Sold,
    Rented,
}

impl PropertyStatus {
    pub const ALL: [PropertyStatus; 4] = [
        PropertyStatus::Available,
        PropertyStatus::Pending,
        PropertyStatus::Sold,
        PropertyStatus::Rented,
    ];

    /// Human readable badge text
    pub fn label(&self) -> &'static str {
        match self {
            PropertyStatus::Available => "For Sale",
            PropertyStatus::Pending => "Pending",
            PropertyStatus::Sold => "Sold",
            PropertyStatus::Rented => "Rented",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    House,
    Apartment,
    Condo,
    Villa,
}

impl PropertyType {
    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::House => "House",
            PropertyType::Apartment => "Apartment",
            PropertyType::Condo => "Condo",
            PropertyType::Villa => "Villa",
        }
    }
}

/// One gallery entry. The image with order 0 is the thumbnail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyImage {
    pub id: Id,
    pub url: String,
    pub order: usize,
}

impl PropertyImage {
    pub fn new(url: String, order: usize) -> Self {
        Self {
            id: generate_id(),
            url,
            order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFeature {
    pub id: Id,
    pub name: String,
    pub order: usize,
}

impl PropertyFeature {
    pub fn new(name: String, order: usize) -> Self {
        Self {
            id: generate_id(),
            name,
            order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: Id,
    pub name: String,
    pub location: String,
    pub price: u64,
    pub beds: u32,
    pub baths: u32,
    pub sqft: u32,
    pub images: Vec<PropertyImage>,
    pub features: Vec<PropertyFeature>,
    pub status: PropertyStatus,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    pub agent: String,
    pub listed: String, // YYYY-MM-DD
    pub order: usize,
}

impl Property {
    /// The thumbnail image, if the gallery is not empty
    pub fn main_image(&self) -> Option<&PropertyImage> {
        self.images.iter().find(|image| image.order == 0)
    }

    /// Bring nested collections back to dense, sorted order.
    /// Returns `true` if anything had to be repaired.
    pub fn normalize_nested(&mut self) -> bool {
        let images = ordering::normalize(&mut self.images);
        let features = ordering::normalize(&mut self.features);
        images || features
    }

    /// Give blank or repeated image and feature ids fresh values, keeping the
    /// first occurrence. Returns `true` if any id was replaced.
    pub fn repair_nested_ids(&mut self) -> bool {
        let images = reassign_duplicate_ids(&mut self.images, |image, id| image.id = id);
        let features = reassign_duplicate_ids(&mut self.features, |feature, id| feature.id = id);
        images || features
    }
}

macro_rules! impl_ordered {
    ($ty:ty) => {
        impl Ordered for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn order(&self) -> usize {
                self.order
            }

            fn set_order(&mut self, order: usize) {
                self.order = order;
            }
        }
    };
}

impl_ordered!(Property);
impl_ordered!(PropertyImage);
impl_ordered!(PropertyFeature);

/// Input model for creating a property; id and order are assigned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewProperty {
    pub name: String,
    pub location: String,
    pub price: u64,
    pub beds: u32,
    pub baths: u32,
    pub sqft: u32,
    #[serde(default)]
    pub images: Vec<PropertyImage>,
    #[serde(default)]
    pub features: Vec<PropertyFeature>,
    pub status: PropertyStatus,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    pub agent: String,
    pub listed: String,
}

impl NewProperty {
    /// Convert to a full Property with store-assigned fields.
    ///
    /// Nested items keep their relative order; blank or repeated nested ids
    /// are replaced with fresh ones.
    pub fn into_property(self, id: Id, order: usize) -> Property {
        let mut property = Property {
            id,
            name: self.name,
            location: self.location,
            price: self.price,
            beds: self.beds,
            baths: self.baths,
            sqft: self.sqft,
            images: self.images,
            features: self.features,
            status: self.status,
            kind: self.kind,
            agent: self.agent,
            listed: self.listed,
            order,
        };
        property.repair_nested_ids();
        property.normalize_nested();
        property
    }
}

fn reassign_duplicate_ids<T: Ordered>(
    items: &mut [T],
    mut set_id: impl FnMut(&mut T, Id),
) -> bool {
    let mut seen = HashSet::new();
    let mut replaced = false;
    for item in items.iter_mut() {
        if item.id().is_empty() || !seen.insert(item.id().to_string()) {
            let fresh = generate_id();
            seen.insert(fresh.clone());
            set_id(item, fresh);
            replaced = true;
        }
    }
    replaced
}

/// Partial update for a property. Identity, order and nested collections are
/// not patchable; unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baths: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqft: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PropertyStatus>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<PropertyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listed: Option<String>,
}

impl PropertyPatch {
    pub fn is_empty(&self) -> bool {
        *self == PropertyPatch::default()
    }

    /// Merge every present field into `property`
    pub fn apply_to(&self, property: &mut Property) {
        if let Some(name) = &self.name {
            property.name = name.clone();
        }
        if let Some(location) = &self.location {
            property.location = location.clone();
        }
        if let Some(price) = self.price {
            property.price = price;
        }
        if let Some(beds) = self.beds {
            property.beds = beds;
        }
        if let Some(baths) = self.baths {
            property.baths = baths;
        }
        if let Some(sqft) = self.sqft {
            property.sqft = sqft;
        }
        if let Some(status) = self.status {
            property.status = status;
        }
        if let Some(kind) = self.kind {
            property.kind = kind;
        }
        if let Some(agent) = &self.agent {
            property.agent = agent.clone();
        }
        if let Some(listed) = &self.listed {
            property.listed = listed.clone();
        }
    }
}
