use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    CheckIn,
    List,
}

/// A restaurant pin on the user's map, sourced from either a visit or a list.
#[skip_serializing_none]
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct MapLocation {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "type")]
    pub kind: LocationKind,
    pub address: Option<String>,
    pub rating: Option<i16>,
    pub list_name: Option<String>,
    pub list_color: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisitPoint {
    pub check_in_id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: Option<i16>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListPoint {
    pub restaurant_id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub list_name: String,
    pub list_color: String,
}
