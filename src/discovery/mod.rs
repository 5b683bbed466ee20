pub mod filter;
pub mod map_locations;
pub mod query;
pub mod stats;
