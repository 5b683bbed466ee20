use anyhow::{anyhow, Context};
use bb8_postgres::bb8::{Pool, PooledConnection};
use bb8_postgres::PostgresConnectionManager;
use bb8_postgres::tokio_postgres::{NoTls, Row};
use tracing::{debug, warn};
use crate::models::check_in::{CheckIn, CheckInSummary};
use crate::models::map_location::{ListPoint, VisitPoint};
use crate::models::restaurant::{PlaceResult, Restaurant, RestaurantSummary};
use crate::models::restaurant_list::{ListDetails, RestaurantList};

pub const RETRY_LIMIT: usize = 5;

pub type PostgresPool = Pool<PostgresConnectionManager<NoTls>>;

pub struct PostgresConnectionRepo {
    postgres_connection: PostgresPool,
}

impl PostgresConnectionRepo {
    pub fn new(
        postgres_connection: PostgresPool,
    ) -> Self {
        Self {
            postgres_connection
        }
    }

    async fn get_postgres_connection(
        &self,
    ) -> anyhow::Result<PooledConnection<PostgresConnectionManager<NoTls>>> {
        for _ in 0..RETRY_LIMIT {
            match self.postgres_connection.get().await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    warn!("Failed to retrieve postgres connection due to: {}, retrying in 3s", e);
                    tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;
                    continue;
                }
            }
        }

        Err(anyhow!("Failed to retrieve a valid connection from postgres pool, BAILING"))
    }

    /// Restaurants are identified by (name, address) until stored, so look the
    /// pair up first and only insert when nothing matches.
    pub async fn find_or_create_restaurant(
        &self,
        restaurant: &PlaceResult,
    ) -> anyhow::Result<i64> {
        let conn = self.get_postgres_connection().await?;
        let existing = conn
            .query_opt(
                "SELECT id FROM restaurants WHERE name = $1 AND address = $2 LIMIT 1;",
                &[&restaurant.name, &restaurant.address],
            )
            .await
            .with_context(|| format!("Failed to look up restaurant: {}", restaurant.name))?;

        if let Some(row) = existing {
            return Ok(row.get("id"));
        }

        let row = conn
            .query_one(
                "INSERT INTO restaurants \
                (google_place_id, name, address, latitude, longitude, rating, price_range, cuisine_type, image_url) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id;",
                &[
                    &restaurant.google_place_id,
                    &restaurant.name,
                    &restaurant.address,
                    &restaurant.latitude,
                    &restaurant.longitude,
                    &restaurant.rating,
                    &restaurant.price_level,
                    &restaurant.cuisine_type,
                    &restaurant.image_url,
                ],
            )
            .await
            .with_context(|| format!("Failed to create restaurant: {}", restaurant.name))?;

        let restaurant_id: i64 = row.get("id");
        debug!("Created restaurant {} with id: {}", restaurant.name, restaurant_id);
        Ok(restaurant_id)
    }

    pub async fn retrieve_restaurant(
        &self,
        restaurant_id: i64,
    ) -> anyhow::Result<Option<Restaurant>> {
        let conn = self.get_postgres_connection().await?;
        let row = conn
            .query_opt("SELECT * FROM restaurants WHERE id = $1 LIMIT 1;", &[&restaurant_id])
            .await
            .with_context(|| format!("Failed to retrieve restaurant with id: {}", restaurant_id))?;

        Ok(row.map(parse_row_into_restaurant))
    }

    pub async fn create_check_in(
        &self,
        user_id: &str,
        restaurant_id: i64,
        notes: &Option<String>,
        rating: Option<i16>,
        images: &[String],
    ) -> anyhow::Result<i64> {
        let conn = self.get_postgres_connection().await?;
        let row = conn
            .query_one(
                "INSERT INTO check_ins (user_id, restaurant_id, notes, rating, images) \
                VALUES ($1, $2, $3, $4, $5) RETURNING id;",
                &[&user_id, &restaurant_id, notes, &rating, &images],
            )
            .await
            .with_context(|| format!("Failed to create check-in for user: {}", user_id))?;

        Ok(row.get("id"))
    }

    /// Newest first. A `limit` of `None` returns the whole history.
    pub async fn retrieve_user_check_ins(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> anyhow::Result<Vec<CheckIn>> {
        let conn = self.get_postgres_connection().await?;
        let rows = conn
            .query(
                "SELECT c.id, c.user_id, c.notes, c.rating, c.images, c.visited_at, \
                r.id AS restaurant_id, r.name, r.address, r.image_url \
                FROM check_ins c JOIN restaurants r ON r.id = c.restaurant_id \
                WHERE c.user_id = $1 ORDER BY c.visited_at DESC, c.id DESC LIMIT $2;",
                &[&user_id, &limit],
            )
            .await
            .with_context(|| format!("Failed to retrieve check-ins for user: {}", user_id))?;

        Ok(rows.into_iter().map(parse_row_into_check_in).collect())
    }

    pub async fn retrieve_check_in_summaries(
        &self,
        user_id: &str,
    ) -> anyhow::Result<Vec<CheckInSummary>> {
        let conn = self.get_postgres_connection().await?;
        let rows = conn
            .query("SELECT rating, visited_at FROM check_ins WHERE user_id = $1;", &[&user_id])
            .await
            .with_context(|| format!("Failed to retrieve check-in ratings for user: {}", user_id))?;

        Ok(rows
            .into_iter()
            .map(|row| CheckInSummary {
                rating: row.get("rating"),
                visited_at: row.get("visited_at"),
            })
            .collect())
    }

    /// Photos are only replaced when new ones are supplied. Returns false when
    /// the check-in doesn't exist or belongs to someone else.
    pub async fn update_check_in(
        &self,
        check_in_id: i64,
        user_id: &str,
        notes: &Option<String>,
        rating: Option<i16>,
        images: &Option<Vec<String>>,
    ) -> anyhow::Result<bool> {
        let conn = self.get_postgres_connection().await?;
        let updated = conn
            .execute(
                "UPDATE check_ins SET notes = $3, rating = $4, images = COALESCE($5, images) \
                WHERE id = $1 AND user_id = $2;",
                &[&check_in_id, &user_id, notes, &rating, images],
            )
            .await
            .with_context(|| format!("Failed to update check-in: {}", check_in_id))?;

        Ok(updated > 0)
    }

    pub async fn delete_check_in(
        &self,
        check_in_id: i64,
        user_id: &str,
    ) -> anyhow::Result<bool> {
        let conn = self.get_postgres_connection().await?;
        let deleted = conn
            .execute(
                "DELETE FROM check_ins WHERE id = $1 AND user_id = $2;",
                &[&check_in_id, &user_id],
            )
            .await
            .with_context(|| format!("Failed to delete check-in: {}", check_in_id))?;

        Ok(deleted > 0)
    }

    pub async fn create_list(
        &self,
        user_id: &str,
        details: &ListDetails,
    ) -> anyhow::Result<i64> {
        let conn = self.get_postgres_connection().await?;
        let row = conn
            .query_one(
                "INSERT INTO restaurant_lists (user_id, name, description, color_theme, is_public) \
                VALUES ($1, $2, $3, $4, $5) RETURNING id;",
                &[
                    &user_id,
                    &details.name,
                    &details.description,
                    &details.color_theme,
                    &details.is_public,
                ],
            )
            .await
            .with_context(|| format!("Failed to create list for user: {}", user_id))?;

        Ok(row.get("id"))
    }

    pub async fn retrieve_user_lists(
        &self,
        user_id: &str,
    ) -> anyhow::Result<Vec<RestaurantList>> {
        let conn = self.get_postgres_connection().await?;
        let rows = conn
            .query(
                "SELECT l.*, COUNT(i.restaurant_id) AS item_count \
                FROM restaurant_lists l LEFT JOIN restaurant_list_items i ON i.list_id = l.id \
                WHERE l.user_id = $1 GROUP BY l.id ORDER BY l.created_at DESC;",
                &[&user_id],
            )
            .await
            .with_context(|| format!("Failed to retrieve lists for user: {}", user_id))?;

        Ok(rows.into_iter().map(parse_row_into_restaurant_list).collect())
    }

    pub async fn retrieve_list(
        &self,
        list_id: i64,
    ) -> anyhow::Result<Option<RestaurantList>> {
        let conn = self.get_postgres_connection().await?;
        let row = conn
            .query_opt(
                "SELECT l.*, COUNT(i.restaurant_id) AS item_count \
                FROM restaurant_lists l LEFT JOIN restaurant_list_items i ON i.list_id = l.id \
                WHERE l.id = $1 GROUP BY l.id;",
                &[&list_id],
            )
            .await
            .with_context(|| format!("Failed to retrieve list: {}", list_id))?;

        Ok(row.map(parse_row_into_restaurant_list))
    }

    pub async fn update_list(
        &self,
        list_id: i64,
        user_id: &str,
        details: &ListDetails,
    ) -> anyhow::Result<bool> {
        let conn = self.get_postgres_connection().await?;
        let updated = conn
            .execute(
                "UPDATE restaurant_lists SET name = $3, description = $4, color_theme = $5, is_public = $6 \
                WHERE id = $1 AND user_id = $2;",
                &[
                    &list_id,
                    &user_id,
                    &details.name,
                    &details.description,
                    &details.color_theme,
                    &details.is_public,
                ],
            )
            .await
            .with_context(|| format!("Failed to update list: {}", list_id))?;

        Ok(updated > 0)
    }

    pub async fn delete_list(
        &self,
        list_id: i64,
        user_id: &str,
    ) -> anyhow::Result<bool> {
        let conn = self.get_postgres_connection().await?;
        let deleted = conn
            .execute(
                "DELETE FROM restaurant_lists WHERE id = $1 AND user_id = $2;",
                &[&list_id, &user_id],
            )
            .await
            .with_context(|| format!("Failed to delete list: {}", list_id))?;

        Ok(deleted > 0)
    }

    /// Returns false when the restaurant was already a member of the list.
    pub async fn add_restaurant_to_list(
        &self,
        list_id: i64,
        restaurant_id: i64,
    ) -> anyhow::Result<bool> {
        let conn = self.get_postgres_connection().await?;
        let inserted = conn
            .execute(
                "INSERT INTO restaurant_list_items (list_id, restaurant_id) VALUES ($1, $2) \
                ON CONFLICT DO NOTHING;",
                &[&list_id, &restaurant_id],
            )
            .await
            .with_context(|| format!("Failed to add restaurant {} to list {}", restaurant_id, list_id))?;

        Ok(inserted > 0)
    }

    pub async fn remove_restaurant_from_list(
        &self,
        list_id: i64,
        restaurant_id: i64,
    ) -> anyhow::Result<bool> {
        let conn = self.get_postgres_connection().await?;
        let removed = conn
            .execute(
                "DELETE FROM restaurant_list_items WHERE list_id = $1 AND restaurant_id = $2;",
                &[&list_id, &restaurant_id],
            )
            .await
            .with_context(|| format!("Failed to remove restaurant {} from list {}", restaurant_id, list_id))?;

        Ok(removed > 0)
    }

    pub async fn retrieve_list_restaurants(
        &self,
        list_id: i64,
    ) -> anyhow::Result<Vec<Restaurant>> {
        let conn = self.get_postgres_connection().await?;
        let rows = conn
            .query(
                "SELECT r.* FROM restaurants r \
                JOIN restaurant_list_items i ON i.restaurant_id = r.id \
                WHERE i.list_id = $1 ORDER BY i.added_at;",
                &[&list_id],
            )
            .await
            .with_context(|| format!("Failed to retrieve restaurants of list: {}", list_id))?;

        Ok(rows.into_iter().map(parse_row_into_restaurant).collect())
    }

    pub async fn retrieve_visit_points(
        &self,
        user_id: &str,
    ) -> anyhow::Result<Vec<VisitPoint>> {
        let conn = self.get_postgres_connection().await?;
        let rows = conn
            .query(
                "SELECT c.id AS check_in_id, c.rating, r.name, r.address, r.latitude, r.longitude \
                FROM check_ins c JOIN restaurants r ON r.id = c.restaurant_id \
                WHERE c.user_id = $1 AND r.latitude IS NOT NULL AND r.longitude IS NOT NULL \
                ORDER BY c.visited_at DESC;",
                &[&user_id],
            )
            .await
            .with_context(|| format!("Failed to retrieve visited locations for user: {}", user_id))?;

        Ok(rows
            .into_iter()
            .map(|row| VisitPoint {
                check_in_id: row.get("check_in_id"),
                name: row.get("name"),
                address: row.get("address"),
                latitude: row.get("latitude"),
                longitude: row.get("longitude"),
                rating: row.get("rating"),
            })
            .collect())
    }

    pub async fn retrieve_list_points(
        &self,
        user_id: &str,
    ) -> anyhow::Result<Vec<ListPoint>> {
        let conn = self.get_postgres_connection().await?;
        let rows = conn
            .query(
                "SELECT r.id AS restaurant_id, r.name, r.address, r.latitude, r.longitude, \
                l.name AS list_name, l.color_theme \
                FROM restaurant_list_items i \
                JOIN restaurants r ON r.id = i.restaurant_id \
                JOIN restaurant_lists l ON l.id = i.list_id \
                WHERE l.user_id = $1 AND r.latitude IS NOT NULL AND r.longitude IS NOT NULL \
                ORDER BY i.added_at;",
                &[&user_id],
            )
            .await
            .with_context(|| format!("Failed to retrieve saved locations for user: {}", user_id))?;

        Ok(rows
            .into_iter()
            .map(|row| ListPoint {
                restaurant_id: row.get("restaurant_id"),
                name: row.get("name"),
                address: row.get("address"),
                latitude: row.get("latitude"),
                longitude: row.get("longitude"),
                list_name: row.get("list_name"),
                list_color: row.get("color_theme"),
            })
            .collect())
    }
}

fn parse_row_into_restaurant(
    row: Row
) -> Restaurant {
    Restaurant {
        id: row.get("id"),
        google_place_id: row.get("google_place_id"),
        name: row.get("name"),
        address: row.get("address"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        rating: row.get("rating"),
        price_range: row.get("price_range"),
        cuisine_type: row.get("cuisine_type"),
        image_url: row.get("image_url"),
    }
}

fn parse_row_into_check_in(
    row: Row,
) -> CheckIn {
    CheckIn {
        id: row.get("id"),
        user_id: row.get("user_id"),
        notes: row.get("notes"),
        rating: row.get("rating"),
        images: row.get("images"),
        visited_at: row.get("visited_at"),
        restaurant: RestaurantSummary {
            id: row.get("restaurant_id"),
            name: row.get("name"),
            address: row.get("address"),
            image_url: row.get("image_url"),
        },
    }
}

fn parse_row_into_restaurant_list(
    row: Row,
) -> RestaurantList {
    RestaurantList {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        description: row.get("description"),
        color_theme: row.get("color_theme"),
        is_public: row.get("is_public"),
        created_at: row.get("created_at"),
        item_count: row.get("item_count"),
    }
}

/// Pool against `DATABASE_URL` with `sql/schema.sql` applied.
#[cfg(test)]
pub async fn migrated_test_pool() -> PostgresPool {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must point at a disposable postgres database");
    let manager = PostgresConnectionManager::new_from_stringlike(database_url, NoTls).unwrap();
    let pool = Pool::builder().max_size(2).build(manager).await.unwrap();

    // tests run in parallel, serialize the CREATE TABLE statements
    let conn = pool.get().await.unwrap();
    conn.execute("SELECT pg_advisory_lock(7301);", &[]).await.unwrap();
    let migrated = conn.batch_execute(include_str!("../../sql/schema.sql")).await;
    conn.execute("SELECT pg_advisory_unlock(7301);", &[]).await.unwrap();
    migrated.unwrap();
    drop(conn);
    pool
}

/// Suffix that keeps rows from different test runs apart.
#[cfg(test)]
pub fn unique_suffix() -> String {
    time::OffsetDateTime::now_utc().unix_timestamp_nanos().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant(name: &str) -> PlaceResult {
        PlaceResult {
            name: name.to_string(),
            address: "575 Henry St, Brooklyn".to_string(),
            latitude: Some(40.68),
            longitude: Some(-73.99),
            ..Default::default()
        }
    }

    fn list_details(name: &str) -> ListDetails {
        ListDetails {
            name: name.to_string(),
            description: None,
            color_theme: "#8ecae6".to_string(),
            is_public: false,
        }
    }

    #[tokio::test]
    #[ignore = "needs a postgres database at DATABASE_URL"]
    async fn same_name_and_address_reuse_the_stored_restaurant() {
        let repo = PostgresConnectionRepo::new(migrated_test_pool().await);
        let name = format!("Lucali {}", unique_suffix());

        let first = repo.find_or_create_restaurant(&restaurant(&name)).await.unwrap();
        let second = repo.find_or_create_restaurant(&restaurant(&name)).await.unwrap();
        assert_eq!(first, second);

        let mut elsewhere = restaurant(&name);
        elsewhere.address = "1 Other Ave".to_string();
        let third = repo.find_or_create_restaurant(&elsewhere).await.unwrap();
        assert_ne!(first, third);
    }

    #[tokio::test]
    #[ignore = "needs a postgres database at DATABASE_URL"]
    async fn only_the_owner_can_change_a_check_in() {
        let repo = PostgresConnectionRepo::new(migrated_test_pool().await);
        let suffix = unique_suffix();
        let owner = format!("owner-{}", suffix);
        let stranger = format!("stranger-{}", suffix);

        let restaurant_id = repo
            .find_or_create_restaurant(&restaurant(&format!("Di Fara {}", suffix)))
            .await
            .unwrap();
        let check_in_id = repo
            .create_check_in(&owner, restaurant_id, &Some("square slice".to_string()), Some(4), &[])
            .await
            .unwrap();

        assert!(!repo.update_check_in(check_in_id, &stranger, &None, Some(1), &None).await.unwrap());
        assert!(!repo.delete_check_in(check_in_id, &stranger).await.unwrap());

        let check_ins = repo.retrieve_user_check_ins(&owner, None).await.unwrap();
        assert_eq!(check_ins.len(), 1);
        assert_eq!(check_ins[0].rating, Some(4));

        let photos = Some(vec!["https://cdn.example/slice.jpg".to_string()]);
        assert!(repo.update_check_in(check_in_id, &owner, &None, Some(5), &photos).await.unwrap());
        assert!(repo.update_check_in(check_in_id, &owner, &None, Some(5), &None).await.unwrap());
        let check_ins = repo.retrieve_user_check_ins(&owner, None).await.unwrap();
        assert_eq!(check_ins[0].rating, Some(5));
        assert_eq!(check_ins[0].images, vec!["https://cdn.example/slice.jpg".to_string()]);

        assert!(repo.delete_check_in(check_in_id, &owner).await.unwrap());
        assert!(repo.retrieve_user_check_ins(&owner, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "needs a postgres database at DATABASE_URL"]
    async fn check_in_history_can_be_limited() {
        let repo = PostgresConnectionRepo::new(migrated_test_pool().await);
        let suffix = unique_suffix();
        let owner = format!("owner-{}", suffix);
        let restaurant_id = repo
            .find_or_create_restaurant(&restaurant(&format!("Katz's {}", suffix)))
            .await
            .unwrap();

        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(repo.create_check_in(&owner, restaurant_id, &None, None, &[]).await.unwrap());
        }

        let recent = repo.retrieve_user_check_ins(&owner, Some(2)).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, ids[2]);
        assert_eq!(repo.retrieve_user_check_ins(&owner, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    #[ignore = "needs a postgres database at DATABASE_URL"]
    async fn only_the_owner_can_change_a_list() {
        let repo = PostgresConnectionRepo::new(migrated_test_pool().await);
        let suffix = unique_suffix();
        let owner = format!("owner-{}", suffix);
        let stranger = format!("stranger-{}", suffix);

        let list_id = repo.create_list(&owner, &list_details("Date night")).await.unwrap();

        assert!(!repo.update_list(list_id, &stranger, &list_details("Mine now")).await.unwrap());
        assert!(!repo.delete_list(list_id, &stranger).await.unwrap());
        assert_eq!(repo.retrieve_list(list_id).await.unwrap().unwrap().name, "Date night");

        assert!(repo.update_list(list_id, &owner, &list_details("Anniversary")).await.unwrap());
        assert_eq!(repo.retrieve_list(list_id).await.unwrap().unwrap().name, "Anniversary");

        assert!(repo.delete_list(list_id, &owner).await.unwrap());
        assert!(repo.retrieve_list(list_id).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "needs a postgres database at DATABASE_URL"]
    async fn a_restaurant_joins_a_list_once() {
        let repo = PostgresConnectionRepo::new(migrated_test_pool().await);
        let suffix = unique_suffix();
        let owner = format!("owner-{}", suffix);

        let list_id = repo.create_list(&owner, &list_details("Pizza")).await.unwrap();
        let restaurant_id = repo
            .find_or_create_restaurant(&restaurant(&format!("Roberta's {}", suffix)))
            .await
            .unwrap();

        assert!(repo.add_restaurant_to_list(list_id, restaurant_id).await.unwrap());
        assert!(!repo.add_restaurant_to_list(list_id, restaurant_id).await.unwrap());

        let list = repo.retrieve_list(list_id).await.unwrap().unwrap();
        assert_eq!(list.item_count, 1);
        assert_eq!(repo.retrieve_list_points(&owner).await.unwrap().len(), 1);

        assert!(repo.remove_restaurant_from_list(list_id, restaurant_id).await.unwrap());
        assert!(!repo.remove_restaurant_from_list(list_id, restaurant_id).await.unwrap());
        assert!(repo.retrieve_list_restaurants(list_id).await.unwrap().is_empty());
    }
}
