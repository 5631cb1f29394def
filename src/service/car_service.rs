use std::sync::Arc;

use crate::auth::AuthUser;
use crate::constants::API_NAME;
use crate::error::AppError;
use crate::models::{Car, CarDetails, CarPayload, Include};
use crate::repository::CarStore;

#[derive(Clone)]
pub struct CarService {
    store: Arc<dyn CarStore>,
}

impl CarService {
    pub fn new(store: Arc<dyn CarStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, payload: CarPayload, caller: AuthUser) -> Result<Car, AppError> {
        let input = payload.validate_into().map_err(AppError::Validation)?;

        let car = self.store.insert(&input, caller.id).await?;
        tracing::info!(
            "{} Created car {} ({} {}) by user {}",
            API_NAME,
            car.id,
            car.brand,
            car.model,
            caller.id
        );
        Ok(car)
    }

    pub async fn list(&self, include: Include) -> Result<Vec<CarDetails>, AppError> {
        let cars = self.store.find_all().await?;
        tracing::debug!("{} Listing {} cars", API_NAME, cars.len());

        let mut details = Vec::with_capacity(cars.len());
        for car in cars {
            details.push(self.expand(car, include).await?);
        }
        Ok(details)
    }

    pub async fn get(&self, id: i64, include: Include) -> Result<CarDetails, AppError> {
        let car = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        self.expand(car, include).await
    }

    /// Replaces every client-editable field. The payload is validated before
    /// the row is looked up.
    pub async fn update(
        &self,
        id: i64,
        payload: CarPayload,
        caller: AuthUser,
    ) -> Result<Car, AppError> {
        let input = payload.validate_into().map_err(AppError::Validation)?;

        let car = self
            .store
            .update(id, &input, caller.id)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!("{} Updated car {} by user {}", API_NAME, id, caller.id);
        Ok(car)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if !self.store.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!("{} Deleted car {}", API_NAME, id);
        Ok(())
    }

    async fn expand(&self, car: Car, include: Include) -> Result<CarDetails, AppError> {
        let mut details = CarDetails::from(car);
        if include.is_empty() {
            return Ok(details);
        }

        if include.customer {
            if let Some(customer_id) = details.car.customer_id {
                details.customer = self.store.find_customer(customer_id).await?;
            }
        }
        if include.created_user {
            if let Some(user_id) = details.car.created_user_id {
                details.created_user = self.store.find_user(user_id).await?;
            }
        }
        if include.updated_user {
            if let Some(user_id) = details.car.updated_user_id {
                details.updated_user = self.store.find_user(user_id).await?;
            }
        }
        Ok(details)
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("car {} does not exist", id))
}
