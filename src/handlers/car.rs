use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::constants::API_NAME;
use crate::error::AppError;
use crate::models::{Car, CarDetails, CarPayload, IncludeQuery};
use crate::service::CarService;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cars).post(create_car))
        .route("/:id", get(get_car).put(update_car).delete(delete_car))
}

async fn create_car(
    State(service): State<CarService>,
    caller: AuthUser,
    payload: Result<Json<CarPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Car>), AppError> {
    let Json(payload) = payload?;
    tracing::info!("{} Received create request from user {}", API_NAME, caller.id);

    let car = service.create(payload, caller).await?;
    Ok((StatusCode::CREATED, Json(car)))
}

async fn list_cars(
    State(service): State<CarService>,
    _caller: AuthUser,
    query: Result<Query<IncludeQuery>, QueryRejection>,
) -> Result<Json<Vec<CarDetails>>, AppError> {
    let Query(query) = query?;
    Ok(Json(service.list(query.include()).await?))
}

async fn get_car(
    State(service): State<CarService>,
    _caller: AuthUser,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<IncludeQuery>, QueryRejection>,
) -> Result<Json<CarDetails>, AppError> {
    let Path(id) = id?;
    let Query(query) = query?;
    Ok(Json(service.get(id, query.include()).await?))
}

async fn update_car(
    State(service): State<CarService>,
    caller: AuthUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CarPayload>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    tracing::info!(
        "{} Received update request for car {} from user {}",
        API_NAME,
        id,
        caller.id
    );

    service.update(id, payload, caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_car(
    State(service): State<CarService>,
    _caller: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
