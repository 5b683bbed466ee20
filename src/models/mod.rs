pub mod check_in;
pub mod map_location;
pub mod restaurant;
pub mod restaurant_list;
pub mod stats;
