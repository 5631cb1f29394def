mod common;

use chrono::NaiveDate;
use common::{create_test_server, test_app, token};
use dealership_api::client::{
    BackAction, CarApiClient, CarForm, ClientError, Field, SubmitOutcome,
};
use dealership_api::models::CarPayload;
use serde_json::json;

fn fill_valid(form: &mut CarForm) {
    form.set_field(Field::Brand, "Hyundai");
    form.set_field(Field::Model, "HB20");
    form.set_field(Field::Color, "CINZA");
    form.set_field(Field::YearManufacture, "2019");
    form.set_field(Field::Plates, "hyu2b34");
    form.set_selling_date(NaiveDate::from_ymd_opt(2023, 1, 15));
    form.set_field(Field::SellingPrice, "61990.90");
}

#[tokio::test]
async fn test_form_create_flow_should_persist_and_navigate_to_list() {
    let (app, store) = test_app();
    let addr = create_test_server(app).await;
    let client = CarApiClient::new(format!("http://{}", addr)).with_token(token(5));

    let mut form = CarForm::new();
    fill_valid(&mut form);
    let outcome = form.submit(&client).await;

    assert_eq!(
        outcome,
        SubmitOutcome::Saved {
            car_id: Some(1),
            navigate_to: "/cars"
        }
    );
    assert!(!form.is_modified());
    assert_eq!(store.len().await, 1);

    let cars = client.list().await.expect("list");
    assert_eq!(cars.len(), 1);
    assert_eq!(cars[0].plates, "HYU-2B34");
    assert_eq!(cars[0].selling_price, Some(61990.90));
    assert_eq!(cars[0].created_user_id, Some(5));
}

#[tokio::test]
async fn test_form_with_invalid_input_should_not_reach_the_server() {
    let (app, store) = test_app();
    let addr = create_test_server(app).await;
    let client = CarApiClient::new(format!("http://{}", addr)).with_token(token(5));

    let mut form = CarForm::new();
    fill_valid(&mut form);
    form.set_field(Field::Plates, "hyu2");
    form.set_field(Field::SellingPrice, "100");

    match form.submit(&client).await {
        SubmitOutcome::Invalid(errors) => {
            assert!(errors.contains("plates"));
            assert!(errors.contains("selling_price"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(form.input_errors().contains("plates"));
    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn test_form_should_surface_server_side_field_errors() {
    let (app, store) = test_app();
    let addr = create_test_server(app).await;
    let client = CarApiClient::new(format!("http://{}", addr)).with_token(token(5));

    let mut form = CarForm::new();
    fill_valid(&mut form);
    form.set_field(Field::CustomerId, "404");

    match form.submit(&client).await {
        SubmitOutcome::Invalid(errors) => assert!(errors.contains("customer_id")),
        other => panic!("unexpected {:?}", other),
    }
    assert!(form.input_errors().contains("customer_id"));
    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn test_form_edit_flow_should_load_update_and_confirm_discard() {
    let (app, _store) = test_app();
    let addr = create_test_server(app).await;
    let client = CarApiClient::new(format!("http://{}", addr)).with_token(token(8));

    let mut creator = CarForm::new();
    fill_valid(&mut creator);
    let SubmitOutcome::Saved {
        car_id: Some(id), ..
    } = creator.submit(&client).await
    else {
        panic!("create failed");
    };

    let mut form = CarForm::edit(id);
    form.load(&client).await.expect("load");
    assert_eq!(form.title(), "Edit car");
    assert_eq!(form.values().plates, "HYU-2B34");
    assert_eq!(form.values().year_manufacture, "2019");
    assert_eq!(form.back(), BackAction::Navigate("/cars"));

    form.set_field(Field::Model, "Creta");
    assert!(matches!(form.back(), BackAction::ConfirmDiscard { .. }));

    let outcome = form.submit(&client).await;
    assert!(matches!(outcome, SubmitOutcome::Saved { car_id: Some(saved), .. } if saved == id));

    let car = client.get(id).await.expect("get");
    assert_eq!(car.model, "Creta");
    assert_eq!(car.updated_user_id, Some(8));
}

#[tokio::test]
async fn test_client_should_map_status_codes_to_errors() {
    let (app, _store) = test_app();
    let addr = create_test_server(app).await;
    let base = format!("http://{}", addr);

    let anonymous = CarApiClient::new(base.clone());
    let err = anonymous.list().await.expect_err("unauthorized");
    assert!(matches!(err, ClientError::Unauthorized(_)));

    let client = CarApiClient::new(base).with_token(token(1));
    let err = client.get(12).await.expect_err("missing");
    assert!(matches!(err, ClientError::NotFound));

    let err = client.delete(12).await.expect_err("missing");
    assert!(matches!(err, ClientError::NotFound));

    let payload: CarPayload = serde_json::from_value(json!({ "plates": "short" })).expect("payload");
    let err = client.create(&payload).await.expect_err("invalid");
    match err {
        ClientError::Validation(errors) => {
            assert!(errors.contains("plates"));
            assert!(errors.contains("brand"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_form_without_credentials_should_fail_with_a_message() {
    let (app, _store) = test_app();
    let addr = create_test_server(app).await;
    let client = CarApiClient::new(format!("http://{}", addr));

    let mut form = CarForm::new();
    fill_valid(&mut form);
    match form.submit(&client).await {
        SubmitOutcome::Failed(message) => assert!(message.contains("Not authorized")),
        other => panic!("unexpected {:?}", other),
    }
    assert!(form.is_modified());
}
