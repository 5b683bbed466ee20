pub mod google_places_repo;
pub mod postgres_repo;
