use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use super::{CarStore, RepositoryError};
use crate::models::{Car, CarInput, Customer, UserSummary};

const CAR_COLUMNS: &str = "id, brand, model, color, year_manufacture, imported, plates, \
     selling_date, selling_price, customer_id, created_user_id, updated_user_id, \
     created_at, updated_at";

#[derive(Clone)]
pub struct PgCarStore {
    pool: PgPool,
}

impl PgCarStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CarStore for PgCarStore {
    async fn insert(&self, car: &CarInput, user_id: i64) -> Result<Car, RepositoryError> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO cars (brand, model, color, year_manufacture, imported, plates, \
             selling_date, selling_price, customer_id, created_user_id, updated_user_id, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10, $11, $11) \
             RETURNING {}",
            CAR_COLUMNS
        );

        sqlx::query_as::<_, Car>(&query)
            .bind(&car.brand)
            .bind(&car.model)
            .bind(car.color.as_str())
            .bind(car.year_manufacture)
            .bind(car.imported)
            .bind(&car.plates)
            .bind(car.selling_date)
            .bind(car.selling_price)
            .bind(car.customer_id)
            .bind(user_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)
    }

    async fn find_all(&self) -> Result<Vec<Car>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM cars ORDER BY brand ASC, model ASC, id ASC",
            CAR_COLUMNS
        );

        sqlx::query_as::<_, Car>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Car>, RepositoryError> {
        let query = format!("SELECT {} FROM cars WHERE id = $1", CAR_COLUMNS);

        sqlx::query_as::<_, Car>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)
    }

    async fn update(
        &self,
        id: i64,
        car: &CarInput,
        user_id: i64,
    ) -> Result<Option<Car>, RepositoryError> {
        let query = format!(
            "UPDATE cars SET brand = $1, model = $2, color = $3, year_manufacture = $4, \
             imported = $5, plates = $6, selling_date = $7, selling_price = $8, \
             customer_id = $9, updated_user_id = $10, updated_at = $11 \
             WHERE id = $12 \
             RETURNING {}",
            CAR_COLUMNS
        );

        sqlx::query_as::<_, Car>(&query)
            .bind(&car.brand)
            .bind(&car.model)
            .bind(car.color.as_str())
            .bind(car.year_manufacture)
            .bind(car.imported)
            .bind(&car.plates)
            .bind(car.selling_date)
            .bind(car.selling_price)
            .bind(car.customer_id)
            .bind(user_id)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>, RepositoryError> {
        sqlx::query_as::<_, Customer>("SELECT id, name FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)
    }

    async fn find_user(&self, id: i64) -> Result<Option<UserSummary>, RepositoryError> {
        sqlx::query_as::<_, UserSummary>("SELECT id, fullname, username FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)
    }
}
