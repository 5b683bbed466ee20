use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use time::OffsetDateTime;
use crate::models::restaurant::RestaurantSummary;

#[skip_serializing_none]
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CheckIn {
    pub id: i64,
    pub user_id: String,
    pub notes: Option<String>,
    pub rating: Option<i16>,
    pub images: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub visited_at: OffsetDateTime,
    pub restaurant: RestaurantSummary,
}

/// The subset of a check-in needed to compute profile statistics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CheckInSummary {
    pub rating: Option<i16>,
    pub visited_at: OffsetDateTime,
}
