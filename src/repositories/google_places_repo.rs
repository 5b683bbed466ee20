use anyhow::{anyhow, Context};
use serde::Deserialize;
use tracing::{debug, info};
use crate::config::Config;
use crate::discovery::query::NormalizedQuery;
use crate::models::restaurant::PlaceResult;

const CUISINE_TYPES: [&str; 4] = ["restaurant", "food", "meal_takeaway", "meal_delivery"];
const PHOTO_MAX_WIDTH: u32 = 400;

#[derive(Deserialize, Debug)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<TextSearchPlace>,
}

#[derive(Deserialize, Debug)]
struct TextSearchPlace {
    place_id: Option<String>,
    name: String,
    formatted_address: Option<String>,
    geometry: Option<Geometry>,
    rating: Option<f64>,
    price_level: Option<i16>,
    #[serde(default)]
    photos: Vec<PlacePhoto>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct Geometry {
    location: Option<LatLng>,
}

#[derive(Deserialize, Debug)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize, Debug)]
struct PlacePhoto {
    photo_reference: String,
}

pub struct GooglePlacesRepo {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    search_radius: u32,
}

impl GooglePlacesRepo {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.google_places_base_url.trim_end_matches('/').to_string(),
            api_key: config.google_places_api_key.clone(),
            search_radius: config.places_search_radius,
        }
    }

    pub async fn search_restaurants(
        &self,
        query: &NormalizedQuery,
    ) -> anyhow::Result<Vec<PlaceResult>> {
        let mut params: Vec<(&str, String)> = vec![
            ("query", format!("{} restaurant", query.text)),
            ("type", "restaurant".to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(location) = query.location {
            params.push(("location", format!("{},{}", location.lat, location.lng)));
            params.push(("radius", self.search_radius.to_string()));
        }

        info!(
            "Searching places for restaurants: {}, has location: {}",
            query.text,
            query.location.is_some()
        );

        let response = self
            .client
            .get(format!("{}/textsearch/json", self.base_url))
            .query(&params)
            .send()
            .await
            .context("Failed to reach the places search API")?
            .error_for_status()
            .context("Places search API rejected the request")?
            .json::<TextSearchResponse>()
            .await
            .context("Failed to decode places search response")?;

        if response.status != "OK" && response.status != "ZERO_RESULTS" {
            return Err(anyhow!("Places search API returned status: {}", response.status));
        }

        let restaurants: Vec<PlaceResult> = response
            .results
            .into_iter()
            .map(|place| self.parse_place_into_result(place))
            .collect();

        debug!("Places search returned {} restaurants", restaurants.len());
        Ok(restaurants)
    }

    fn photo_url(&self, photo_reference: &str) -> String {
        format!(
            "{}/photo?maxwidth={}&photoreference={}&key={}",
            self.base_url, PHOTO_MAX_WIDTH, photo_reference, self.api_key
        )
    }

    fn parse_place_into_result(
        &self,
        place: TextSearchPlace,
    ) -> PlaceResult {
        let location = place.geometry.and_then(|geometry| geometry.location);
        let cuisine_type = place
            .types
            .iter()
            .find(|place_type| CUISINE_TYPES.contains(&place_type.as_str()))
            .cloned()
            .unwrap_or_else(|| "restaurant".to_string());

        PlaceResult {
            google_place_id: place.place_id,
            name: place.name,
            address: place.formatted_address.unwrap_or_default(),
            latitude: location.as_ref().map(|l| l.lat),
            longitude: location.as_ref().map(|l| l.lng),
            rating: place.rating,
            price_level: place.price_level,
            image_url: place.photos.first().map(|photo| self.photo_url(&photo.photo_reference)),
            cuisine_type: Some(cuisine_type),
        }
    }
}
