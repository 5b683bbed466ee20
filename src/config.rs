use clap::Parser;

#[derive(Parser, Clone, Debug)]
pub struct Config {
    #[clap(env, long, default_value = "development")]
    pub environment: String,

    #[clap(env, long, default_value_t = 3000)]
    pub port: u16,

    /// Postgres connection string, e.g. `host=localhost user=postgres dbname=checkins`
    #[clap(env, long)]
    pub database_url: String,

    /// Comma separated list of origins allowed through CORS
    #[clap(env, long, default_value = "http://localhost:5173")]
    pub origin_urls: String,

    #[clap(env, long)]
    pub pool_size: Option<u32>,

    #[clap(env, long)]
    pub google_places_api_key: String,

    #[clap(env, long, default_value = "https://maps.googleapis.com/maps/api/place")]
    pub google_places_base_url: String,

    /// Search radius in metres, only sent when the caller supplies a location
    #[clap(env, long, default_value_t = 10000)]
    pub places_search_radius: u32,

    #[clap(env, long)]
    pub mapbox_public_token: Option<String>,
}

impl Config {
    pub fn postgres_pool_size(&self) -> u32 {
        self.pool_size
            .unwrap_or_else(|| (num_cpus::get() as u32 * 2).max(4))
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(places_base_url: &str) -> Self {
        Self {
            environment: "test".to_string(),
            port: 0,
            database_url: "host=localhost user=postgres".to_string(),
            origin_urls: "http://localhost:5173".to_string(),
            pool_size: Some(1),
            google_places_api_key: "test-key".to_string(),
            google_places_base_url: places_base_url.to_string(),
            places_search_radius: 10000,
            mapbox_public_token: None,
        }
    }
}
