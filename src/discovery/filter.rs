use serde::{Deserialize, Serialize};
use crate::models::restaurant::PlaceResult;

pub const DEFAULT_MAX_PRICE: i16 = 4;
pub const DEFAULT_MIN_RATING: f64 = 0.0;
pub const DEFAULT_MAX_DISTANCE_MILES: f64 = 15.0;

/// Post-filters applied to places search results.
///
/// `max_distance_miles` is carried through and echoed back to the caller, but
/// no distance is computed for results so it never excludes anything.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct ResultFilter {
    pub max_price: i16,
    pub min_rating: f64,
    #[serde(rename = "max_distance")]
    pub max_distance_miles: f64,
}

impl Default for ResultFilter {
    fn default() -> Self {
        Self {
            max_price: DEFAULT_MAX_PRICE,
            min_rating: DEFAULT_MIN_RATING,
            max_distance_miles: DEFAULT_MAX_DISTANCE_MILES,
        }
    }
}

impl ResultFilter {
    /// A rating or price of 0 is a real value and is compared like any
    /// other, only an absent field skips its check.
    pub fn retains(&self, place: &PlaceResult) -> bool {
        let rating_ok = place.rating.map_or(true, |rating| rating >= self.min_rating);
        let price_ok = place.price_level.map_or(true, |price| price <= self.max_price);
        rating_ok && price_ok
    }

    pub fn apply(&self, places: Vec<PlaceResult>) -> Vec<PlaceResult> {
        places
            .into_iter()
            .filter(|place| self.retains(place))
            .collect()
    }

    pub fn is_active(&self) -> bool {
        self.min_rating > DEFAULT_MIN_RATING
            || self.max_price < DEFAULT_MAX_PRICE
            || self.max_distance_miles < DEFAULT_MAX_DISTANCE_MILES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(name: &str, rating: Option<f64>, price_level: Option<i16>) -> PlaceResult {
        PlaceResult {
            name: name.to_string(),
            address: format!("{} street", name),
            rating,
            price_level,
            ..Default::default()
        }
    }

    #[test]
    fn keeps_only_places_meeting_both_thresholds() {
        let filter = ResultFilter {
            max_price: 2,
            min_rating: 4.5,
            ..Default::default()
        };
        let results = vec![
            place("first", Some(4.8), Some(1)),
            place("second", Some(3.9), Some(1)),
            place("third", Some(4.6), Some(3)),
        ];

        let filtered = filter.apply(results);
        assert_eq!(filtered, vec![place("first", Some(4.8), Some(1))]);
    }

    #[test]
    fn places_without_rating_or_price_are_kept() {
        let filter = ResultFilter {
            max_price: 1,
            min_rating: 4.9,
            ..Default::default()
        };
        let filtered = filter.apply(vec![
            place("unrated", None, Some(1)),
            place("unpriced", Some(5.0), None),
            place("unknown", None, None),
        ]);
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn zero_rating_is_compared_not_skipped() {
        let filter = ResultFilter {
            max_price: 1,
            min_rating: 1.0,
            ..Default::default()
        };
        let filtered = filter.apply(vec![
            place("zero rated", Some(0.0), None),
            place("free", Some(4.0), Some(0)),
        ]);
        let names: Vec<&str> = filtered.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["free"]);
    }

    #[test]
    fn preserves_input_order() {
        let filter = ResultFilter {
            min_rating: 4.0,
            ..Default::default()
        };
        let filtered = filter.apply(vec![
            place("c", Some(4.1), None),
            place("a", Some(2.0), None),
            place("b", Some(4.9), None),
            place("d", Some(4.0), None),
        ]);
        let names: Vec<&str> = filtered.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "d"]);
    }

    #[test]
    fn filtering_twice_changes_nothing() {
        let filter = ResultFilter {
            max_price: 3,
            min_rating: 4.2,
            max_distance_miles: 5.0,
        };
        let results = vec![
            place("a", Some(4.3), Some(4)),
            place("b", Some(4.4), Some(2)),
            place("c", None, Some(3)),
            place("d", Some(1.0), None),
        ];
        let once = filter.apply(results);
        let twice = filter.apply(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let filter = ResultFilter {
            min_rating: 5.0,
            ..Default::default()
        };
        assert!(filter.apply(vec![place("a", Some(3.0), None)]).is_empty());
        assert!(filter.apply(Vec::new()).is_empty());
    }

    #[test]
    fn distance_never_excludes_results() {
        let filter = ResultFilter {
            max_distance_miles: 0.1,
            ..Default::default()
        };
        assert_eq!(filter.apply(vec![place("far away", Some(4.0), Some(2))]).len(), 1);
        assert!(filter.is_active());
        assert!(!ResultFilter::default().is_active());
    }
}
