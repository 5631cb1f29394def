use axum::extract::FromRef;

use crate::auth::TokenVerifier;
use crate::service::CarService;

#[derive(Clone)]
pub struct AppState {
    pub cars: CarService,
    pub tokens: TokenVerifier,
}

impl FromRef<AppState> for CarService {
    fn from_ref(state: &AppState) -> Self {
        state.cars.clone()
    }
}

impl FromRef<AppState> for TokenVerifier {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
