pub mod car_repo;
pub mod errors;
pub mod memory;

use async_trait::async_trait;

use crate::models::{Car, CarInput, Customer, UserSummary};

pub use car_repo::PgCarStore;
pub use errors::RepositoryError;
pub use memory::MemoryCarStore;

/// Persistence for cars and the rows they reference.
///
/// `update` and `delete` report a missing row through `None` / `false`
/// rather than an error.
#[async_trait]
pub trait CarStore: Send + Sync {
    async fn insert(&self, car: &CarInput, user_id: i64) -> Result<Car, RepositoryError>;

    /// All cars ordered by brand, model and id.
    async fn find_all(&self) -> Result<Vec<Car>, RepositoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Car>, RepositoryError>;

    async fn update(
        &self,
        id: i64,
        car: &CarInput,
        user_id: i64,
    ) -> Result<Option<Car>, RepositoryError>;

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError>;

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>, RepositoryError>;

    async fn find_user(&self, id: i64) -> Result<Option<UserSummary>, RepositoryError>;
}
