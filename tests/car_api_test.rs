mod common;

use axum::http::{Method, StatusCode};
use chrono::{Datelike, Utc};
use common::{car_body, send, test_app};
use serde_json::json;

#[tokio::test]
async fn create_returns_201_with_the_stored_car() {
    let (app, _store) = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/cars",
        Some(3),
        Some(car_body("Toyota", "Corolla", "TOY-1A23")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1);
    assert_eq!(body["brand"], "Toyota");
    assert_eq!(body["color"], "VERMELHO");
    assert_eq!(body["selling_date"], "2022-11-05");
    assert_eq!(body["created_user_id"], 3);
    assert_eq!(body["updated_user_id"], 3);
}

#[tokio::test]
async fn audit_fields_from_the_client_are_ignored() {
    let (app, _store) = test_app();
    let mut car = car_body("Toyota", "Corolla", "TOY-1A23");
    car["created_user_id"] = json!(999);
    car["updated_user_id"] = json!(999);

    let (status, body) = send(&app, Method::POST, "/cars", Some(4), Some(car)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created_user_id"], 4);
    assert_eq!(body["updated_user_id"], 4);
}

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let (app, store) = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/cars",
        None,
        Some(car_body("Toyota", "Corolla", "TOY-1A23")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
    assert_eq!(store.len().await, 0);

    let (status, _) = send(&app, Method::GET, "/cars", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn plates_of_wrong_length_yield_400_with_plates_key() {
    let (app, store) = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/cars",
        Some(1),
        Some(car_body("Toyota", "Corolla", "TOY-123")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"]["plates"],
        "plates must have exactly 8 characters."
    );
    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn year_manufacture_outside_range_is_rejected() {
    let (app, _store) = test_app();

    for year in [1959, Utc::now().year() + 1] {
        let mut car = car_body("Toyota", "Corolla", "TOY-1A23");
        car["year_manufacture"] = json!(year);
        let (status, body) = send(&app, Method::POST, "/cars", Some(1), Some(car)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "year {}", year);
        assert!(body["errors"]["year_manufacture"].is_string());
    }
}

#[tokio::test]
async fn wrong_typed_fields_yield_400_with_each_field_key() {
    let (app, store) = test_app();
    let mut car = car_body("Toyota", "Corolla", "TOY-1A23");
    car["plates"] = json!(12345678);
    car["brand"] = json!(12);

    let (status, body) = send(&app, Method::POST, "/cars", Some(1), Some(car)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["plates"], "plates must be a string.");
    assert_eq!(body["errors"]["brand"], "brand must be a string.");
    assert!(body.get("error").is_none());
    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn non_object_body_is_a_bad_request() {
    let (app, _store) = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/cars",
        Some(1),
        Some(json!(["Toyota", "Corolla"])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn updating_a_nonexistent_id_yields_404() {
    let (app, _store) = test_app();

    let (status, _) = send(
        &app,
        Method::PUT,
        "/cars/41",
        Some(1),
        Some(car_body("Toyota", "Corolla", "TOY-1A23")),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_replaces_fields_and_records_the_editor() {
    let (app, _store) = test_app();
    send(
        &app,
        Method::POST,
        "/cars",
        Some(1),
        Some(car_body("Toyota", "Corolla", "TOY-1A23")),
    )
    .await;

    let mut changed = car_body("Toyota", "Etios", "TOY-1A23");
    changed["selling_price"] = json!(null);
    let (status, body) = send(&app, Method::PUT, "/cars/1", Some(2), Some(changed)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, car) = send(&app, Method::GET, "/cars/1", Some(2), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(car["model"], "Etios");
    assert!(car["selling_price"].is_null());
    assert_eq!(car["created_user_id"], 1);
    assert_eq!(car["updated_user_id"], 2);
}

#[tokio::test]
async fn delete_then_delete_again_yields_404() {
    let (app, _store) = test_app();
    send(
        &app,
        Method::POST,
        "/cars",
        Some(1),
        Some(car_body("Toyota", "Corolla", "TOY-1A23")),
    )
    .await;

    let (status, _) = send(&app, Method::DELETE, "/cars/1", Some(1), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::DELETE, "/cars/1", Some(1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/cars/1", Some(1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_is_a_bad_request() {
    let (app, _store) = test_app();
    let (status, _) = send(&app, Method::GET, "/cars/abc", Some(1), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_is_ordered_by_brand_then_model() {
    let (app, _store) = test_app();
    for (brand, model, plates) in [
        ("Volkswagen", "Polo", "VWP-1111"),
        ("Fiat", "Toro", "FTT-2222"),
        ("Fiat", "Argo", "FTA-3333"),
    ] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/cars",
            Some(1),
            Some(car_body(brand, model, plates)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, Method::GET, "/cars", Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    let models: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|car| car["model"].as_str().expect("model"))
        .collect();
    assert_eq!(models, vec!["Argo", "Toro", "Polo"]);
}

#[tokio::test]
async fn include_embeds_customer_and_users() {
    let (app, store) = test_app();
    let customer = store.add_customer("Joana Prado").await;
    let user = store.add_user("Paulo Reis", "paulo").await;

    let mut car = car_body("Renault", "Kwid", "REN-4E56");
    car["customer_id"] = json!(customer.id);
    let (status, _) = send(&app, Method::POST, "/cars", Some(user.id), Some(car)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::GET,
        "/cars/1?include=customer,created_user",
        Some(user.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customer"]["name"], "Joana Prado");
    assert_eq!(body["created_user"]["username"], "paulo");
    assert!(body.get("updated_user").is_none());

    let (_, list) = send(&app, Method::GET, "/cars?include=customer", Some(user.id), None).await;
    assert_eq!(list[0]["customer"]["id"], customer.id);
}

#[tokio::test]
async fn unknown_customer_is_a_field_error() {
    let (app, _store) = test_app();
    let mut car = car_body("Renault", "Kwid", "REN-4E56");
    car["customer_id"] = json!(77);

    let (status, body) = send(&app, Method::POST, "/cars", Some(1), Some(car)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["customer_id"].is_string());
}

#[tokio::test]
async fn duplicate_plates_conflict() {
    let (app, _store) = test_app();
    let car = car_body("Renault", "Kwid", "REN-4E56");
    let (status, _) = send(&app, Method::POST, "/cars", Some(1), Some(car.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, "/cars", Some(1), Some(car)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);
}

#[tokio::test]
async fn health_check_should_return_ok() {
    let (app, _store) = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
