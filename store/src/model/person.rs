use serde::{Deserialize, Serialize};

use crate::consts::consts::PersonId;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub address: Address,
    pub phone: String,
    pub picture: PictureUrls,
    pub is_favourite: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Address {
    pub street_number: i32,
    pub street_name: String,
    pub city: String,
    pub country: String,
    /// Decimal strings, passed through from the remote document untouched
    pub latitude: String,
    pub longitude: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PictureUrls {
    pub medium: String,
    pub large: String,
}

impl Person {
    pub fn id(&self) -> PersonId {
        PersonId::new(self.first_name.clone(), self.last_name.clone())
    }

    pub fn new_test(first_name: &str, last_name: &str) -> Self {
        Person {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            gender: "female".to_string(),
            address: Address {
                street_number: 32,
                street_name: "Test Street".to_string(),
                city: "Test City".to_string(),
                country: "Test Country".to_string(),
                latitude: "-37.8136".to_string(),
                longitude: "144.9631".to_string(),
            },
            phone: "000-0000".to_string(),
            picture: PictureUrls {
                medium: "https://example.com/medium.jpg".to_string(),
                large: "https://example.com/large.jpg".to_string(),
            },
            is_favourite: false,
        }
    }
}
