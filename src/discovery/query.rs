use serde_json::Value;
use thiserror::Error;
use crate::models::restaurant::Coordinate;

pub const MAX_QUERY_LENGTH: usize = 100;

const STRIPPED_CHARACTERS: [char; 6] = ['<', '>', '\\', '"', '\'', '&'];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    #[error("Query is required")]
    Required,

    #[error("Query cannot be empty")]
    Empty,

    #[error("Query too long (max 100 characters)")]
    TooLong,

    #[error("Query contains invalid characters")]
    InvalidCharacters,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("Invalid location format")]
    InvalidFormat,

    #[error("Location coordinates must be numbers")]
    NotNumeric,

    #[error("Latitude must be between -90 and 90")]
    LatitudeOutOfRange,

    #[error("Longitude must be between -180 and 180")]
    LongitudeOutOfRange,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchInputError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Location(#[from] CoordinateError),
}

impl SearchInputError {
    /// Stable machine readable reason, returned alongside the message.
    pub fn reason_code(&self) -> &'static str {
        match self {
            SearchInputError::Query(QueryError::Required) => "query_required",
            SearchInputError::Query(QueryError::Empty) => "query_empty",
            SearchInputError::Query(QueryError::TooLong) => "query_too_long",
            SearchInputError::Query(QueryError::InvalidCharacters) => "query_invalid_characters",
            SearchInputError::Location(CoordinateError::InvalidFormat) => "location_invalid_format",
            SearchInputError::Location(CoordinateError::NotNumeric) => "location_not_numeric",
            SearchInputError::Location(CoordinateError::LatitudeOutOfRange) => "latitude_out_of_range",
            SearchInputError::Location(CoordinateError::LongitudeOutOfRange) => "longitude_out_of_range",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedQuery {
    pub text: String,
    pub location: Option<Coordinate>,
}

pub fn sanitize_query(raw: Option<&str>) -> Result<String, QueryError> {
    let trimmed = raw.ok_or(QueryError::Required)?.trim();

    if trimmed.is_empty() {
        return Err(QueryError::Empty);
    }
    if trimmed.chars().count() > MAX_QUERY_LENGTH {
        return Err(QueryError::TooLong);
    }

    let sanitized: String = trimmed
        .chars()
        .filter(|c| !STRIPPED_CHARACTERS.contains(c))
        .collect();

    if sanitized.is_empty() {
        return Err(QueryError::InvalidCharacters);
    }

    Ok(sanitized)
}

/// A missing coordinate is valid, the search simply isn't biased to a location.
pub fn validate_coordinate(
    location: Option<Coordinate>,
) -> Result<Option<Coordinate>, CoordinateError> {
    let Some(coordinate) = location else {
        return Ok(None);
    };

    if !coordinate.lat.is_finite() || !coordinate.lng.is_finite() {
        return Err(CoordinateError::NotNumeric);
    }
    if !(-90.0..=90.0).contains(&coordinate.lat) {
        return Err(CoordinateError::LatitudeOutOfRange);
    }
    if !(-180.0..=180.0).contains(&coordinate.lng) {
        return Err(CoordinateError::LongitudeOutOfRange);
    }

    Ok(Some(coordinate))
}

/// Read a `{lat, lng}` object off an untyped request body. `null` counts as
/// no location, anything else that isn't an object with numeric `lat` and
/// `lng` is rejected.
pub fn parse_coordinate(
    raw: Option<&Value>,
) -> Result<Option<Coordinate>, CoordinateError> {
    let object = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(object)) => object,
        Some(_) => return Err(CoordinateError::InvalidFormat),
    };

    let (Some(lat), Some(lng)) = (object.get("lat"), object.get("lng")) else {
        return Err(CoordinateError::InvalidFormat);
    };
    let (Some(lat), Some(lng)) = (lat.as_f64(), lng.as_f64()) else {
        return Err(CoordinateError::NotNumeric);
    };

    validate_coordinate(Some(Coordinate { lat, lng }))
}

pub fn normalize_search(
    raw_query: Option<&str>,
    location: Option<&Value>,
) -> Result<NormalizedQuery, SearchInputError> {
    let text = sanitize_query(raw_query)?;
    let location = parse_coordinate(location)?;

    Ok(NormalizedQuery { text, location })
}
