use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct UserStats {
    pub places_visited: usize,
    pub average_rating: f64,
    pub this_month: usize,
}
