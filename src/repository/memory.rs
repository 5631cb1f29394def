use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{CarStore, RepositoryError};
use crate::models::{Car, CarInput, Customer, UserSummary};

#[derive(Default)]
struct State {
    next_car_id: i64,
    next_customer_id: i64,
    next_user_id: i64,
    cars: BTreeMap<i64, Car>,
    customers: HashMap<i64, Customer>,
    users: HashMap<i64, UserSummary>,
}

impl State {
    fn check_references(&self, car: &CarInput) -> Result<(), RepositoryError> {
        if let Some(customer_id) = car.customer_id {
            if !self.customers.contains_key(&customer_id) {
                return Err(RepositoryError::foreign_key("customer_id"));
            }
        }
        Ok(())
    }

    fn check_plates(&self, car: &CarInput, except: Option<i64>) -> Result<(), RepositoryError> {
        let taken = self
            .cars
            .values()
            .any(|existing| existing.plates == car.plates && Some(existing.id) != except);
        if taken {
            return Err(RepositoryError::Duplicate(format!(
                "plates '{}' already registered",
                car.plates
            )));
        }
        Ok(())
    }
}

/// Non-persistent [`CarStore`] with the same constraints as the PostgreSQL
/// schema for customers and plates. Audit user ids are recorded as given.
#[derive(Clone, Default)]
pub struct MemoryCarStore {
    state: Arc<RwLock<State>>,
}

impl MemoryCarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_customer(&self, name: &str) -> Customer {
        let mut state = self.state.write().await;
        state.next_customer_id += 1;
        let customer = Customer {
            id: state.next_customer_id,
            name: name.to_string(),
        };
        state.customers.insert(customer.id, customer.clone());
        customer
    }

    pub async fn add_user(&self, fullname: &str, username: &str) -> UserSummary {
        let mut state = self.state.write().await;
        state.next_user_id += 1;
        let user = UserSummary {
            id: state.next_user_id,
            fullname: fullname.to_string(),
            username: username.to_string(),
        };
        state.users.insert(user.id, user.clone());
        user
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.cars.len()
    }
}

#[async_trait]
impl CarStore for MemoryCarStore {
    async fn insert(&self, car: &CarInput, user_id: i64) -> Result<Car, RepositoryError> {
        let mut state = self.state.write().await;
        state.check_references(car)?;
        state.check_plates(car, None)?;

        state.next_car_id += 1;
        let now = Utc::now();
        let stored = Car {
            id: state.next_car_id,
            brand: car.brand.clone(),
            model: car.model.clone(),
            color: car.color,
            year_manufacture: car.year_manufacture,
            imported: car.imported,
            plates: car.plates.clone(),
            selling_date: car.selling_date,
            selling_price: car.selling_price,
            customer_id: car.customer_id,
            created_user_id: Some(user_id),
            updated_user_id: Some(user_id),
            created_at: now,
            updated_at: now,
        };
        state.cars.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_all(&self) -> Result<Vec<Car>, RepositoryError> {
        let state = self.state.read().await;
        let mut cars: Vec<Car> = state.cars.values().cloned().collect();
        cars.sort_by(|a, b| {
            a.brand
                .cmp(&b.brand)
                .then_with(|| a.model.cmp(&b.model))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(cars)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Car>, RepositoryError> {
        Ok(self.state.read().await.cars.get(&id).cloned())
    }

    async fn update(
        &self,
        id: i64,
        car: &CarInput,
        user_id: i64,
    ) -> Result<Option<Car>, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.cars.contains_key(&id) {
            return Ok(None);
        }
        state.check_references(car)?;
        state.check_plates(car, Some(id))?;

        let Some(stored) = state.cars.get_mut(&id) else {
            return Ok(None);
        };
        stored.brand = car.brand.clone();
        stored.model = car.model.clone();
        stored.color = car.color;
        stored.year_manufacture = car.year_manufacture;
        stored.imported = car.imported;
        stored.plates = car.plates.clone();
        stored.selling_date = car.selling_date;
        stored.selling_price = car.selling_price;
        stored.customer_id = car.customer_id;
        stored.updated_user_id = Some(user_id);
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.state.write().await.cars.remove(&id).is_some())
    }

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.state.read().await.customers.get(&id).cloned())
    }

    async fn find_user(&self, id: i64) -> Result<Option<UserSummary>, RepositoryError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }
}
