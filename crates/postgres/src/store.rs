use async_trait::async_trait;
use campspot_core::*;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const LOCATION_COLUMNS: &str = "id, owner_id, address, city, province_or_state, country, \
     postal_code, latitude, longitude, created_at";
const SPOT_COLUMNS: &str =
    "id, owner_id, location_id, name, description, nightly_rate, capacity, created_at";
const BOOKING_COLUMNS: &str =
    "id, spot_id, renter_id, start_date, end_date, status, total_price, created_at";
const REVIEW_COLUMNS: &str = "id, spot_id, author_id, rating, comment, date_posted";

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const EXCLUSION_VIOLATION: &str = "23P01";

fn sqlstate(error: &sqlx::Error) -> Option<String> {
    match error {
        sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
        _ => None,
    }
}

/// Maps a violation of one of `codes` to `mapped`, anything else to `Database`
fn constraint_error(error: sqlx::Error, codes: &[&str], mapped: CoreError) -> CoreError {
    match sqlstate(&error) {
        Some(code) if codes.contains(&code.as_str()) => mapped,
        _ => CoreError::Database(error),
    }
}

/// `%query%` for ILIKE, with wildcards in the query matched literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn location_from_row(row: &PgRow, prefix: &str) -> Location {
    let col = |name: &str| format!("{}{}", prefix, name);
    Location {
        id: row.get(col("id").as_str()),
        owner_id: row.get(col("owner_id").as_str()),
        address: row.get(col("address").as_str()),
        city: row.get(col("city").as_str()),
        province_or_state: row.get(col("province_or_state").as_str()),
        country: row.get(col("country").as_str()),
        postal_code: row.get(col("postal_code").as_str()),
        latitude: row.get(col("latitude").as_str()),
        longitude: row.get(col("longitude").as_str()),
        created_at: row.get(col("created_at").as_str()),
    }
}

/// Postgres-backed implementation of every repository.
///
/// Booking inserts lock the spot row for the duration of the availability
/// check. The `bookings_no_overlap` exclusion constraint backs this up for
/// the half-open policy.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LocationRepository for PgStore {
    async fn create_location(
        &self,
        owner_id: UserId,
        request: &LocationRequest,
    ) -> CoreResult<Location> {
        let location = sqlx::query_as::<_, Location>(&format!(
            r#"
            INSERT INTO locations (
                owner_id, address, city, province_or_state, country, postal_code,
                latitude, longitude
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(&request.address)
        .bind(&request.city)
        .bind(&request.province_or_state)
        .bind(&request.country)
        .bind(&request.postal_code)
        .bind(request.latitude)
        .bind(request.longitude)
        .fetch_one(&self.pool)
        .await?;

        Ok(location)
    }

    async fn find_location(&self, id: LocationId) -> CoreResult<Option<Location>> {
        let location = sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    async fn locations_by_owner(&self, owner_id: UserId) -> CoreResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE owner_id = $1 ORDER BY id"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    async fn update_location(
        &self,
        id: LocationId,
        request: &LocationRequest,
    ) -> CoreResult<Location> {
        let location = sqlx::query_as::<_, Location>(&format!(
            r#"
            UPDATE locations
            SET address = $1,
                city = $2,
                province_or_state = $3,
                country = $4,
                postal_code = $5,
                latitude = $6,
                longitude = $7
            WHERE id = $8
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(&request.address)
        .bind(&request.city)
        .bind(&request.province_or_state)
        .bind(&request.country)
        .bind(&request.postal_code)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        location.ok_or(CoreError::NotFound(Entity::Location))
    }

    async fn delete_location(&self, id: LocationId) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                constraint_error(
                    e,
                    &[FOREIGN_KEY_VIOLATION],
                    CoreError::Conflict(ConflictKind::LocationInUse),
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(Entity::Location));
        }
        Ok(())
    }

    async fn count_spots_at(&self, id: LocationId) -> CoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS spot_count FROM spots WHERE location_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("spot_count"))
    }

    async fn search_locations(&self, query: &str, limit: i64) -> CoreResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(&format!(
            r#"
            SELECT DISTINCT ON (city, country) {LOCATION_COLUMNS}
            FROM locations
            WHERE city ILIKE $1 OR country ILIKE $1 OR address ILIKE $1
            ORDER BY city, country, id
            LIMIT $2
            "#
        ))
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    async fn popular_locations(&self, limit: i64) -> CoreResult<Vec<PopularLocation>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id, l.owner_id, l.address, l.city, l.province_or_state, l.country,
                   l.postal_code, l.latitude, l.longitude, l.created_at,
                   COUNT(s.id) AS spot_count
            FROM locations l
            LEFT JOIN spots s ON s.location_id = l.id
            GROUP BY l.id
            ORDER BY spot_count DESC, l.id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| PopularLocation {
                location: location_from_row(row, ""),
                spot_count: row.get("spot_count"),
            })
            .collect())
    }
}

#[async_trait]
impl SpotRepository for PgStore {
    async fn create_spot(
        &self,
        owner_id: UserId,
        request: &CreateSpotRequest,
    ) -> CoreResult<Spot> {
        let spot = sqlx::query_as::<_, Spot>(&format!(
            r#"
            INSERT INTO spots (owner_id, location_id, name, description, nightly_rate, capacity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SPOT_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(request.location_id)
        .bind(&request.name)
        .bind(request.description.as_deref())
        .bind(request.nightly_rate)
        .bind(request.capacity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            constraint_error(
                e,
                &[FOREIGN_KEY_VIOLATION],
                CoreError::NotFound(Entity::Location),
            )
        })?;

        Ok(spot)
    }

    async fn find_spot(&self, id: SpotId) -> CoreResult<Option<Spot>> {
        let spot = sqlx::query_as::<_, Spot>(&format!(
            "SELECT {SPOT_COLUMNS} FROM spots WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(spot)
    }

    async fn spots_by_owner(&self, owner_id: UserId) -> CoreResult<Vec<Spot>> {
        let spots = sqlx::query_as::<_, Spot>(&format!(
            "SELECT {SPOT_COLUMNS} FROM spots WHERE owner_id = $1 ORDER BY id"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(spots)
    }

    async fn spot_listings(&self, place: Option<&str>) -> CoreResult<Vec<SpotListing>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.owner_id, s.location_id, s.name, s.description, s.nightly_rate,
                   s.capacity, s.created_at,
                   l.id AS l_id, l.owner_id AS l_owner_id, l.address AS l_address,
                   l.city AS l_city, l.province_or_state AS l_province_or_state,
                   l.country AS l_country, l.postal_code AS l_postal_code,
                   l.latitude AS l_latitude, l.longitude AS l_longitude,
                   l.created_at AS l_created_at
            FROM spots s
            JOIN locations l ON l.id = s.location_id
            WHERE $1::TEXT IS NULL OR l.city ILIKE $1 OR l.country ILIKE $1
            ORDER BY s.id
            "#,
        )
        .bind(place.map(like_pattern))
        .fetch_all(&self.pool)
        .await?;

        let spot_ids: Vec<SpotId> = rows.iter().map(|row| row.get("id")).collect();
        let amenities = sqlx::query_as::<_, Amenity>(
            "SELECT id, spot_id, name FROM amenities WHERE spot_id = ANY($1) ORDER BY id",
        )
        .bind(&spot_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let spot = Spot {
                    id: row.get("id"),
                    owner_id: row.get("owner_id"),
                    location_id: row.get("location_id"),
                    name: row.get("name"),
                    description: row.get("description"),
                    nightly_rate: row.get("nightly_rate"),
                    capacity: row.get("capacity"),
                    created_at: row.get("created_at"),
                };
                let amenities = amenities
                    .iter()
                    .filter(|a| a.spot_id == spot.id)
                    .cloned()
                    .collect();
                SpotListing {
                    location: location_from_row(row, "l_"),
                    spot,
                    amenities,
                    distance_km: None,
                }
            })
            .collect())
    }
}

#[async_trait]
impl AmenityRepository for PgStore {
    async fn create_amenity(&self, request: &CreateAmenityRequest) -> CoreResult<Amenity> {
        let amenity = sqlx::query_as::<_, Amenity>(
            "INSERT INTO amenities (spot_id, name) VALUES ($1, $2) RETURNING id, spot_id, name",
        )
        .bind(request.spot_id)
        .bind(&request.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            constraint_error(
                e,
                &[UNIQUE_VIOLATION],
                CoreError::Conflict(ConflictKind::DuplicateAmenity),
            )
        })?;

        Ok(amenity)
    }

    async fn find_amenity(&self, id: AmenityId) -> CoreResult<Option<Amenity>> {
        let amenity =
            sqlx::query_as::<_, Amenity>("SELECT id, spot_id, name FROM amenities WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(amenity)
    }

    async fn amenities(&self, spot_id: Option<SpotId>) -> CoreResult<Vec<Amenity>> {
        let amenities = sqlx::query_as::<_, Amenity>(
            "SELECT id, spot_id, name FROM amenities WHERE $1::INT IS NULL OR spot_id = $1 ORDER BY id",
        )
        .bind(spot_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(amenities)
    }

    async fn delete_amenity(&self, id: AmenityId) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM amenities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(Entity::Amenity));
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewRepository for PgStore {
    async fn create_review(
        &self,
        author_id: UserId,
        request: &CreateReviewRequest,
    ) -> CoreResult<Review> {
        let review = sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO reviews (spot_id, author_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(request.spot_id)
        .bind(author_id)
        .bind(request.rating)
        .bind(&request.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            constraint_error(
                e,
                &[UNIQUE_VIOLATION],
                CoreError::Conflict(ConflictKind::DuplicateReview),
            )
        })?;

        Ok(review)
    }

    async fn find_review(&self, id: ReviewId) -> CoreResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    async fn reviews_for_spot(&self, spot_id: SpotId) -> CoreResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE spot_id = $1 ORDER BY date_posted DESC, id DESC"
        ))
        .bind(spot_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    async fn delete_review(&self, id: ReviewId) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(Entity::Review));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for PgStore {
    async fn insert_if_available(
        &self,
        booking: &NewBooking,
        policy: OverlapPolicy,
    ) -> CoreResult<Booking> {
        let range = DateRange::new(booking.start_date, booking.end_date)?;
        let mut tx = self.pool.begin().await?;

        // serializes bookings on the same spot until commit
        let locked = sqlx::query("SELECT id FROM spots WHERE id = $1 FOR UPDATE")
            .bind(booking.spot_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(CoreError::NotFound(Entity::Spot));
        }

        let active = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE spot_id = $1 AND status <> 'CANCELLED'"
        ))
        .bind(booking.spot_id)
        .fetch_all(&mut *tx)
        .await?;

        if let Some(existing) = find_conflict(&active, booking.spot_id, &range, policy) {
            log::debug!(
                "Booking on spot {} collides with booking {}",
                booking.spot_id,
                existing.id
            );
            return Err(CoreError::Conflict(ConflictKind::Overlap));
        }

        let created = sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO bookings (spot_id, renter_id, start_date, end_date, status, total_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(booking.spot_id)
        .bind(booking.renter_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(BookingStatus::Pending)
        .bind(booking.total_price)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            constraint_error(
                e,
                &[EXCLUSION_VIOLATION],
                CoreError::Conflict(ConflictKind::Overlap),
            )
        })?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find_booking(&self, id: BookingId) -> CoreResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn active_bookings_for_spot(&self, spot_id: SpotId) -> CoreResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE spot_id = $1 AND status <> 'CANCELLED' ORDER BY start_date"
        ))
        .bind(spot_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn bookings_for_spot(&self, spot_id: SpotId) -> CoreResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE spot_id = $1 ORDER BY start_date, id"
        ))
        .bind(spot_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn bookings_for_renter(&self, renter_id: UserId) -> CoreResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE renter_id = $1 ORDER BY start_date DESC"
        ))
        .bind(renter_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn bookings_for_owner(&self, owner_id: UserId) -> CoreResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT b.id, b.spot_id, b.renter_id, b.start_date, b.end_date, b.status,
                   b.total_price, b.created_at
            FROM bookings b
            JOIN spots s ON s.id = b.spot_id
            WHERE s.owner_id = $1
            ORDER BY b.start_date DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn update_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        target: BookingStatus,
    ) -> CoreResult<Option<Booking>> {
        let updated = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET status = $1
            WHERE id = $2 AND status = $3
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(target)
        .bind(id)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_none() && self.find_booking(id).await?.is_none() {
            return Err(CoreError::NotFound(Entity::Booking));
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("banff"), "%banff%");
        assert_eq!(like_pattern("100%_a"), "%100\\%\\_a%");
    }

    #[test]
    fn non_database_errors_pass_through() {
        let error = constraint_error(
            sqlx::Error::RowNotFound,
            &[UNIQUE_VIOLATION],
            CoreError::Conflict(ConflictKind::DuplicateReview),
        );
        assert!(matches!(error, CoreError::Database(sqlx::Error::RowNotFound)));
    }
}
