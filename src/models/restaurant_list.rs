use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use time::OffsetDateTime;

pub const DEFAULT_LIST_COLOR: &str = "#ff6b9d";

#[skip_serializing_none]
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RestaurantList {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub color_theme: String,
    pub is_public: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub item_count: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListDetails {
    pub name: String,
    pub description: Option<String>,
    pub color_theme: String,
    pub is_public: bool,
}
