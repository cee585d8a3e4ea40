use actix_web::{HttpResponse, error, guard, web};

use auth_services::jwt::JwtService;
use auth_services::middleware::AuthMiddleware;

use crate::*;

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": "validation_error",
        "message": message
    }))
}

/// JSON body limits and error rendering shared by every route
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            let response = bad_request(err.to_string());
            error::InternalError::from_response(err, response).into()
        })
}

/// Query string error rendering shared by every route
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = bad_request(err.to_string());
        error::InternalError::from_response(err, response).into()
    })
}

/// Path segment error rendering shared by every route
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        let response = bad_request(err.to_string());
        error::InternalError::from_response(err, response).into()
    })
}

/// Sign-up, login, token refresh, password recovery and the user profile.
///
/// Expects `web::Data<AuthService>` and `web::Data<JwtService>` in app data.
pub fn configure_accounts(cfg: &mut web::ServiceConfig, jwt: JwtService) {
    cfg.service(
        web::scope("/api/auth")
            .route("/health", web::get().to(auth_health))
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login))
            .route("/refresh", web::post().to(refresh))
            .route("/security-question", web::get().to(security_question))
            .route("/reset-password", web::post().to(reset_password)),
    )
    .service(
        web::scope("/api/user")
            .wrap(AuthMiddleware::new(jwt))
            .route("/profile", web::get().to(get_profile))
            .route("/profile", web::put().to(update_profile)),
    );
}

/// Locations, spots, amenities, reviews and bookings.
///
/// Expects `web::Data<Marketplace>` in app data. Public and authenticated
/// handlers on the same path are split into method-guarded resources so the
/// middleware only wraps the authenticated ones.
pub fn configure_marketplace(cfg: &mut web::ServiceConfig, jwt: JwtService) {
    let auth = AuthMiddleware::new(jwt);

    cfg.service(
        web::scope("/api")
            // locations
            .service(web::resource("/locations/search").route(web::get().to(search_locations)))
            .service(web::resource("/locations/popular").route(web::get().to(popular_locations)))
            .service(
                web::resource("/locations")
                    .wrap(auth.clone())
                    .route(web::post().to(create_location))
                    .route(web::get().to(my_locations)),
            )
            .service(
                web::resource("/locations/{id}")
                    .wrap(auth.clone())
                    .route(web::put().to(update_location))
                    .route(web::delete().to(delete_location)),
            )
            // spots
            .service(web::resource("/campspots/search").route(web::get().to(search_spots)))
            .service(web::resource("/campspots/{id}/quote").route(web::get().to(quote_spot)))
            .service(
                web::resource("/campspots")
                    .wrap(auth.clone())
                    .route(web::post().to(create_spot))
                    .route(web::get().to(my_spots)),
            )
            .service(
                web::resource("/campspots/{id}")
                    .wrap(auth.clone())
                    .route(web::get().to(spot_detail)),
            )
            // amenities
            .service(
                web::resource("/amenities")
                    .wrap(auth.clone())
                    .route(web::post().to(add_amenity))
                    .route(web::get().to(list_amenities)),
            )
            .service(
                web::resource("/amenities/{id}")
                    .wrap(auth.clone())
                    .route(web::delete().to(delete_amenity)),
            )
            // reviews
            .service(
                web::resource("/reviews")
                    .guard(guard::Get())
                    .route(web::get().to(list_reviews)),
            )
            .service(
                web::resource("/reviews")
                    .wrap(auth.clone())
                    .route(web::post().to(create_review)),
            )
            .service(
                web::resource("/reviews/{id}")
                    .wrap(auth.clone())
                    .route(web::delete().to(delete_review)),
            )
            // bookings
            .service(
                web::resource("/bookings")
                    .guard(guard::Get())
                    .route(web::get().to(list_spot_bookings)),
            )
            .service(
                web::resource("/bookings")
                    .wrap(auth.clone())
                    .route(web::post().to(create_booking)),
            )
            .service(
                web::resource("/bookings/mine")
                    .wrap(auth.clone())
                    .route(web::get().to(my_bookings)),
            )
            .service(
                web::resource("/bookings/owner")
                    .wrap(auth.clone())
                    .route(web::get().to(owner_bookings)),
            )
            .service(
                web::resource("/bookings/{id}")
                    .wrap(auth)
                    .route(web::put().to(update_booking_status)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use auth_services::types::User;
    use campspot_core::memory::InMemoryStore;
    use campspot_core::{Marketplace, OverlapPolicy};
    use chrono::Utc;
    use serde_json::{Value, json};
    use std::sync::Arc;

    const SECRET: &str = "routes-test-secret";
    const OWNER: i32 = 1;
    const RENTER: i32 = 2;

    fn bearer(user_id: i32) -> (&'static str, String) {
        let user = User {
            id: user_id,
            user_name: format!("user{}", user_id),
            email: format!("user{}@example.com", user_id),
            password_hash: String::new(),
            security_question: String::new(),
            security_answer_hash: String::new(),
            role: "user".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let token = JwtService::new(SECRET).generate_access_token(&user).unwrap();
        ("Authorization", format!("Bearer {}", token))
    }

    macro_rules! test_app {
        ($policy:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(Marketplace::with_store(
                        Arc::new(InMemoryStore::new()),
                        $policy,
                    )))
                    .app_data(json_config())
                    .app_data(query_config())
                    .app_data(path_config())
                    .configure(|cfg| configure_marketplace(cfg, JwtService::new(SECRET))),
            )
            .await
        };
    }

    /// Sends a request and returns the status with the decoded JSON body
    macro_rules! send {
        ($app:expr, $req:expr $(,)?) => {{
            let res = test::call_service(&$app, $req.to_request()).await;
            let status = res.status();
            let body = test::read_body(res).await;
            let value: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            (status, value)
        }};
    }

    /// Owner creates a location and a spot at 50 per night
    macro_rules! listed_spot {
        ($app:expr) => {{
            let (status, location) = send!(
                $app,
                test::TestRequest::post()
                    .uri("/api/locations")
                    .insert_header(bearer(OWNER))
                    .set_json(json!({
                        "address": "1 Lakeshore Rd",
                        "city": "Banff",
                        "province_or_state": "AB",
                        "country": "Canada",
                        "postal_code": "T1L 1A1",
                        "latitude": 51.1784,
                        "longitude": -115.5708
                    }))
            );
            assert_eq!(status, StatusCode::CREATED);

            let (status, spot) = send!(
                $app,
                test::TestRequest::post()
                    .uri("/api/campspots")
                    .insert_header(bearer(OWNER))
                    .set_json(json!({
                        "location_id": location["id"],
                        "name": "Lakeside",
                        "nightly_rate": 50.0,
                        "capacity": 4
                    }))
            );
            assert_eq!(status, StatusCode::CREATED);
            spot["id"].as_i64().unwrap()
        }};
    }

    fn book(spot_id: i64, user_id: i32, start: &str, end: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/bookings")
            .insert_header(bearer(user_id))
            .set_json(json!({ "spot_id": spot_id, "start_date": start, "end_date": end }))
    }

    fn set_status(booking_id: &Value, user_id: i32, status: &str) -> test::TestRequest {
        test::TestRequest::put()
            .uri(&format!("/api/bookings/{}", booking_id))
            .insert_header(bearer(user_id))
            .set_json(json!({ "status": status }))
    }

    #[actix_web::test]
    async fn booking_scenario_over_http() {
        let app = test_app!(OverlapPolicy::Turnover);
        let spot_id = listed_spot!(app);

        let (status, first) = send!(app, book(spot_id, RENTER, "2024-07-01", "2024-07-05"));
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["status"], "PENDING");
        assert_eq!(first["total_price"], 200.0);

        let (status, confirmed) = send!(app, set_status(&first["id"], OWNER, "CONFIRMED"));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(confirmed["status"], "CONFIRMED");

        let (status, body) = send!(app, book(spot_id, RENTER, "2024-07-04", "2024-07-06"));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");

        let (status, second) = send!(app, book(spot_id, RENTER, "2024-07-05", "2024-07-07"));
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(second["total_price"], 100.0);

        let (status, body) = send!(app, set_status(&first["id"], OWNER, "CANCELLED"));
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");
    }

    #[actix_web::test]
    async fn inclusive_policy_rejects_shared_checkout_day() {
        let app = test_app!(OverlapPolicy::Inclusive);
        let spot_id = listed_spot!(app);

        let (status, _) = send!(app, book(spot_id, RENTER, "2024-07-01", "2024-07-05"));
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send!(app, book(spot_id, RENTER, "2024-07-05", "2024-07-07"));
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn booking_error_statuses() {
        let app = test_app!(OverlapPolicy::Turnover);
        let spot_id = listed_spot!(app);

        let (status, _) = send!(app, book(spot_id, OWNER, "2024-08-01", "2024-08-03"));
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send!(app, book(spot_id, RENTER, "2024-08-03", "2024-08-03"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_range");

        let (status, _) = send!(app, book(9999, RENTER, "2024-08-01", "2024-08-03"));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send!(
            app,
            test::TestRequest::post()
                .uri("/api/bookings")
                .set_json(json!({ "spot_id": spot_id, "start_date": "2024-08-01", "end_date": "2024-08-03" })),
        );
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_token");

        let (status, booking) = send!(app, book(spot_id, RENTER, "2024-08-01", "2024-08-03"));
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send!(app, set_status(&booking["id"], RENTER, "CONFIRMED"));
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn public_listings_need_no_token() {
        let app = test_app!(OverlapPolicy::Turnover);
        let spot_id = listed_spot!(app);
        let (status, _) = send!(app, book(spot_id, RENTER, "2024-07-01", "2024-07-03"));
        assert_eq!(status, StatusCode::CREATED);

        let (status, bookings) = send!(
            app,
            test::TestRequest::get().uri(&format!("/api/bookings?spot_id={}", spot_id)),
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bookings.as_array().unwrap().len(), 1);

        let (status, quote) = send!(
            app,
            test::TestRequest::get().uri(&format!(
                "/api/campspots/{}/quote?start_date=2024-07-02&end_date=2024-07-04",
                spot_id
            )),
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["nights"], 2);
        assert_eq!(quote["available"], false);

        let (status, listings) = send!(
            app,
            test::TestRequest::get().uri("/api/campspots/search?lat=51.0&lng=-115.0"),
        );
        assert_eq!(status, StatusCode::OK);
        assert!(listings[0]["distance_km"].as_f64().unwrap() > 0.0);

        let (status, reviews) = send!(
            app,
            test::TestRequest::get().uri(&format!("/api/reviews?spot_id={}", spot_id)),
        );
        assert_eq!(status, StatusCode::OK);
        assert!(reviews.as_array().unwrap().is_empty());

        let (status, locations) =
            send!(app, test::TestRequest::get().uri("/api/locations/search?q=banff"));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(locations[0]["city"], "Banff");
    }

    #[actix_web::test]
    async fn reviews_and_amenities() {
        let app = test_app!(OverlapPolicy::Turnover);
        let spot_id = listed_spot!(app);

        let review = || {
            test::TestRequest::post()
                .uri("/api/reviews")
                .insert_header(bearer(RENTER))
                .set_json(json!({ "spot_id": spot_id, "rating": 5, "comment": "Great view" }))
        };
        let (status, _) = send!(app, review());
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send!(app, review());
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send!(
            app,
            test::TestRequest::post()
                .uri("/api/reviews")
                .insert_header(bearer(OWNER))
                .set_json(json!({ "spot_id": spot_id, "rating": 6, "comment": "Too good" })),
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let amenity = |user_id| {
            test::TestRequest::post()
                .uri("/api/amenities")
                .insert_header(bearer(user_id))
                .set_json(json!({ "spot_id": spot_id, "name": "Fire pit" }))
        };
        let (status, _) = send!(app, amenity(RENTER));
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, created) = send!(app, amenity(OWNER));
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send!(
            app,
            test::TestRequest::delete()
                .uri(&format!("/api/amenities/{}", created["id"]))
                .insert_header(bearer(OWNER)),
        );
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn malformed_input_is_a_json_bad_request() {
        let app = test_app!(OverlapPolicy::Turnover);

        let (status, body) = send!(
            app,
            test::TestRequest::post()
                .uri("/api/bookings")
                .insert_header(bearer(RENTER))
                .set_json(json!({ "spot_id": 1, "start_date": "July 1st" })),
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, body) = send!(
            app,
            test::TestRequest::get().uri("/api/bookings?spot_id=abc"),
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, body) = send!(
            app,
            test::TestRequest::put()
                .uri("/api/bookings/abc")
                .insert_header(bearer(OWNER))
                .set_json(json!({ "status": "CONFIRMED" })),
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[actix_web::test]
    async fn search_origin_must_be_a_real_coordinate() {
        let app = test_app!(OverlapPolicy::Turnover);
        listed_spot!(app);

        for uri in [
            "/api/campspots/search?lat=NaN&lng=0",
            "/api/campspots/search?lat=0&lng=inf",
            "/api/campspots/search?lat=95&lng=0",
        ] {
            let (status, body) = send!(app, test::TestRequest::get().uri(uri));
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["error"], "validation_error");
        }

        let (status, listings) = send!(
            app,
            test::TestRequest::get().uri("/api/campspots/search?lat=51.0&lng=-115.0"),
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listings.as_array().unwrap().len(), 1);
    }
}
