use actix_web::{HttpRequest, web};
use identity::AuthMiddleware;

use crate::booking_handlers::*;
use crate::car_handlers::*;
use crate::rental_types::RentalError;
use crate::user_handlers::*;

/// JSON body settings: malformed bodies are reported as validation errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        RentalError::Validation(format!("Invalid request body: {}", err)).into()
    })
}

/// Query string settings: malformed parameters are reported as validation errors.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        RentalError::Validation(format!("Invalid query string: {}", err)).into()
    })
}

/// Registers the users, cars and bookings endpoints.
///
/// Routes wrapped with `auth` require a bearer token; the rest are public.
pub fn rental_routes(cfg: &mut web::ServiceConfig, auth: &AuthMiddleware) {
    cfg.app_data(json_config())
        .app_data(query_config())
        // Users (public)
        .service(
            web::resource("/users")
                .route(web::get().to(list_users))
                .route(web::post().to(upsert_user)),
        )
        // Cars (reads public, writes private)
        .service(
            web::resource("/cars")
                .route(web::get().to(list_cars))
                .route(web::post().to(create_car).wrap(auth.clone())),
        )
        .service(web::resource("/cars/user/{email}").route(web::get().to(list_provider_cars)))
        .service(
            web::resource("/cars/{id}")
                .route(web::get().to(get_car))
                .route(web::put().to(update_car).wrap(auth.clone()))
                .route(web::patch().to(update_car_status).wrap(auth.clone()))
                .route(web::delete().to(delete_car).wrap(auth.clone())),
        )
        // Bookings (private)
        .service(
            web::resource("/bookings")
                .wrap(auth.clone())
                .route(web::get().to(list_bookings))
                .route(web::post().to(create_booking)),
        )
        .service(
            web::resource("/bookings/{id}")
                .wrap(auth.clone())
                .route(web::delete().to(delete_booking)),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use actix_web::{App, http::StatusCode, test};
    use chrono::Duration;
    use documents::Database;
    use identity::{CallerIdentity, JwtService};
    use serde_json::{Value, json};
    use std::sync::Arc;

    macro_rules! rental_app {
        ($db:expr, $jwt:expr) => {{
            let auth = AuthMiddleware::new(Arc::new($jwt.clone()));
            test::init_service(
                App::new()
                    .app_data(web::Data::new($db.clone()))
                    .configure(|cfg| rental_routes(cfg, &auth)),
            )
            .await
        }};
    }

    fn jwt() -> JwtService {
        JwtService::new("route-test-secret")
    }

    fn bearer(jwt: &JwtService, caller: &CallerIdentity) -> (&'static str, String) {
        let token = jwt.generate_token(caller, Duration::hours(1)).unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    #[actix_web::test]
    async fn test_car_lifecycle_scenario() {
        let (db, jwt) = (Database::in_memory(), jwt());
        let app = rental_app!(db, jwt);

        let req = test::TestRequest::post()
            .uri("/cars")
            .insert_header(bearer(&jwt, &alice()))
            .set_json(json!({
                "providerEmail": "a@x.com",
                "carName": "Model 3",
                "status": "available"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["acknowledged"], true);
        let id = created["insertedId"].as_str().unwrap().to_string();

        let req = test::TestRequest::patch()
            .uri(&format!("/cars/{id}"))
            .insert_header(bearer(&jwt, &alice()))
            .set_json(json!({"status": "booked"}))
            .to_request();
        let patched: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(patched["modifiedCount"], 1);

        let req = test::TestRequest::get().uri(&format!("/cars/{id}")).to_request();
        let car: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(car["status"], "booked");
        assert_eq!(car["_id"], id.as_str());

        let req = test::TestRequest::delete()
            .uri(&format!("/cars/{id}"))
            .insert_header(bearer(&jwt, &bob()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["message"].is_string());

        let req = test::TestRequest::get().uri(&format!("/cars/{id}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_private_routes_require_token() {
        let (db, jwt) = (Database::in_memory(), jwt());
        let app = rental_app!(db, jwt);

        let requests = [
            test::TestRequest::post()
                .uri("/cars")
                .set_json(json!({"carName": "Model 3"}))
                .to_request(),
            test::TestRequest::put()
                .uri("/cars/any")
                .set_json(json!({"carName": "Model 3"}))
                .to_request(),
            test::TestRequest::patch()
                .uri("/cars/any")
                .set_json(json!({"status": "booked"}))
                .to_request(),
            test::TestRequest::delete().uri("/cars/any").to_request(),
            test::TestRequest::get().uri("/bookings").to_request(),
            test::TestRequest::post()
                .uri("/bookings")
                .set_json(json!({"carId": "any"}))
                .to_request(),
            test::TestRequest::delete().uri("/bookings/any").to_request(),
        ];

        for req in requests {
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }

        let req = test::TestRequest::get()
            .uri("/bookings")
            .insert_header(("Authorization", "Bearer forged"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_public_routes_need_no_token() {
        let (db, jwt) = (Database::in_memory(), jwt());
        let app = rental_app!(db, jwt);

        for uri in ["/users", "/cars", "/cars/user/a@x.com"] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK, "GET {uri}");
        }
    }

    #[actix_web::test]
    async fn test_search_returns_only_matching_cars() {
        let (db, jwt) = (Database::in_memory(), jwt());
        let app = rental_app!(db, jwt);

        for (caller, name) in [
            (alice(), "Tesla Model S"),
            (alice(), "Toyota Corolla"),
            (bob(), "old TESLA roadster"),
        ] {
            let req = test::TestRequest::post()
                .uri("/cars")
                .insert_header(bearer(&jwt, &caller))
                .set_json(json!({"carName": name}))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get().uri("/cars?search=Tesla").to_request();
        let cars: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cars.len(), 2);
        for car in &cars {
            let name = car["carName"].as_str().unwrap().to_lowercase();
            assert!(name.contains("tesla"));
        }

        let req = test::TestRequest::get()
            .uri("/cars?email=b@x.com&search=tesla")
            .to_request();
        let cars: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cars.len(), 1);
        assert_eq!(cars[0]["providerEmail"], "b@x.com");

        let req = test::TestRequest::get().uri("/cars/user/a@x.com").to_request();
        let cars: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cars.len(), 2);
    }

    #[actix_web::test]
    async fn test_unknown_ids_are_not_found() {
        let (db, jwt) = (Database::in_memory(), jwt());
        let app = rental_app!(db, jwt);
        let missing = uuid::Uuid::new_v4();

        let req = test::TestRequest::get()
            .uri(&format!("/cars/{missing}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Car not found");

        let req = test::TestRequest::put()
            .uri(&format!("/cars/{missing}"))
            .insert_header(bearer(&jwt, &alice()))
            .set_json(json!({"carName": "Model 3"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete()
            .uri(&format!("/bookings/{missing}"))
            .insert_header(bearer(&jwt, &alice()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_user_upsert_keeps_one_record_per_email() {
        let (db, jwt) = (Database::in_memory(), jwt());
        let app = rental_app!(db, jwt);

        for name in ["A", "Alice"] {
            let req = test::TestRequest::post()
                .uri("/users")
                .set_json(json!({"email": "a@x.com", "name": name}))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get().uri("/users").to_request();
        let users: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["name"], "Alice");
    }

    #[actix_web::test]
    async fn test_bookings_are_owned_by_renter() {
        let (db, jwt) = (Database::in_memory(), jwt());
        let app = rental_app!(db, jwt);

        let req = test::TestRequest::post()
            .uri("/cars")
            .insert_header(bearer(&jwt, &alice()))
            .set_json(json!({"carName": "Model 3"}))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let car_id = created["insertedId"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/bookings")
            .insert_header(bearer(&jwt, &bob()))
            .set_json(json!({"carId": car_id, "startDate": "2026-06-01", "endDate": "2026-06-03"}))
            .to_request();
        let booked: Value = test::call_and_read_body_json(&app, req).await;
        let booking_id = booked["insertedId"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/bookings?renterId=uid-bob")
            .insert_header(bearer(&jwt, &alice()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/bookings")
            .insert_header(bearer(&jwt, &alice()))
            .to_request();
        let alices: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(alices.is_empty());

        let req = test::TestRequest::delete()
            .uri(&format!("/bookings/{booking_id}"))
            .insert_header(bearer(&jwt, &alice()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri(&format!("/bookings/{booking_id}"))
            .insert_header(bearer(&jwt, &bob()))
            .to_request();
        let deleted: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(deleted["deletedCount"], 1);
    }

    #[actix_web::test]
    async fn test_malformed_bodies_are_bad_requests() {
        let (db, jwt) = (Database::in_memory(), jwt());
        let app = rental_app!(db, jwt);

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({"name": "no email"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "validation_error");

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({"email": "nope"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/cars")
            .insert_header(bearer(&jwt, &alice()))
            .set_json(json!({"carName": "Model 3"}))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["insertedId"].as_str().unwrap().to_string();

        let req = test::TestRequest::patch()
            .uri(&format!("/cars/{id}"))
            .insert_header(bearer(&jwt, &alice()))
            .set_json(json!({"status": "stolen"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
