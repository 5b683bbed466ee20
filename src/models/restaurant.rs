use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// A restaurant as returned by the places search, and as submitted by clients
/// when checking in or adding to a list before it has a stored id.
#[skip_serializing_none]
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct PlaceResult {
    pub google_place_id: Option<String>,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: Option<f64>,
    pub price_level: Option<i16>,
    pub image_url: Option<String>,
    pub cuisine_type: Option<String>,
}

#[skip_serializing_none]
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Restaurant {
    pub id: i64,
    pub google_place_id: Option<String>,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: Option<f64>,
    pub price_range: Option<i16>,
    pub cuisine_type: Option<String>,
    pub image_url: Option<String>,
}

#[skip_serializing_none]
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RestaurantSummary {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub image_url: Option<String>,
}
