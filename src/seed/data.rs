use crate::model::{Property, PropertyFeature, PropertyImage, PropertyStatus, PropertyType};

/// Storage slot the catalog snapshot lives under
pub const STORAGE_KEY: &str = "realestate_properties";

fn image_url(photo: &str) -> String {
    format!(
        "https://images.unsplash.com/photo-{}?w=400&h=300&fit=crop",
        photo
    )
}

/// Helper function to create a seed property with one gallery image
#[allow(clippy::too_many_arguments)]
fn seed_property(
    order: usize,
    name: &str,
    location: &str,
    price: u64,
    (beds, baths, sqft): (u32, u32, u32),
    photo: &str,
    features: &[(&str, &str)],
    status: PropertyStatus,
    kind: PropertyType,
    agent: &str,
    listed: &str,
) -> Property {
    let id = (order + 1).to_string();

    Property {
        images: vec![PropertyImage {
            id: format!("img{}", id),
            url: image_url(photo),
            order: 0,
        }],
        features: features
            .iter()
            .enumerate()
            .map(|(i, (feature_id, feature_name))| PropertyFeature {
                id: feature_id.to_string(),
                name: feature_name.to_string(),
                order: i,
            })
            .collect(),
        id,
        name: name.to_string(),
        location: location.to_string(),
        price,
        beds,
        baths,
        sqft,
        status,
        kind,
        agent: agent.to_string(),
        listed: listed.to_string(),
        order,
    }
}

/// The fixed catalog written on first use when storage holds no snapshot
pub fn default_properties() -> Vec<Property> {
    vec![
        seed_property(
            0,
            "Luxury Sunset Villa",
            "Beverly Hills, CA",
            2_450_000,
            (5, 4, 4500),
            "1613490493576-7fde63acd811",
            &[("f1", "Swimming Pool"), ("f2", "Smart Home")],
            PropertyStatus::Available,
            PropertyType::Villa,
            "Sarah Johnson",
            "2024-01-15",
        ),
        seed_property(
            1,
            "Modern Ocean View",
            "Malibu, CA",
            1_890_000,
            (4, 3, 3200),
            "1600596542815-ffad4c1539a9",
            &[("f3", "Ocean View"), ("f4", "Garage")],
            PropertyStatus::Pending,
            PropertyType::House,
            "Michael Chen",
            "2024-01-10",
        ),
        seed_property(
            2,
            "Downtown Penthouse",
            "Los Angeles, CA",
            1_250_000,
            (3, 2, 2100),
            "1600607687939-ce8a6c25118c",
            &[("f5", "Rooftop Terrace")],
            PropertyStatus::Available,
            PropertyType::Apartment,
            "Emily Davis",
            "2024-01-20",
        ),
        seed_property(
            3,
            "Garden Estate",
            "Pasadena, CA",
            3_200_000,
            (6, 5, 5800),
            "1564013799919-ab600027ffc6",
            &[("f6", "Garden"), ("f7", "Guest House")],
            PropertyStatus::Sold,
            PropertyType::House,
            "James Wilson",
            "2023-12-01",
        ),
        seed_property(
            4,
            "Coastal Retreat",
            "Santa Monica, CA",
            2_100_000,
            (4, 3, 3500),
            "1512917774080-9991f1c4c750",
            &[("f8", "Beach Access")],
            PropertyStatus::Available,
            PropertyType::Villa,
            "Sarah Johnson",
            "2024-01-18",
        ),
        seed_property(
            5,
            "Urban Loft",
            "Downtown LA, CA",
            750_000,
            (2, 2, 1400),
            "1502672260266-1c1ef2d93688",
            &[("f9", "High Ceilings")],
            PropertyStatus::Rented,
            PropertyType::Apartment,
            "Lisa Anderson",
            "2024-01-05",
        ),
    ]
}
