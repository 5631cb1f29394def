use reqwest::{Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::constants::CARS_ROUTE;
use crate::models::{Car, CarPayload, FieldErrors};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Car not found")]
    NotFound,

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct ValidationBody {
    errors: FieldErrors,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Typed client for the `/cars` endpoints.
#[derive(Clone)]
pub struct CarApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl CarApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, id: Option<i64>) -> String {
        match id {
            Some(id) => format!("{}{}/{}", self.base_url, CARS_ROUTE, id),
            None => format!("{}{}", self.base_url, CARS_ROUTE),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn list(&self) -> Result<Vec<Car>, ClientError> {
        let response = self.authorize(self.http.get(self.url(None))).send().await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Car, ClientError> {
        let response = self
            .authorize(self.http.get(self.url(Some(id))))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn create(&self, payload: &CarPayload) -> Result<Car, ClientError> {
        let response = self
            .authorize(self.http.post(self.url(None)))
            .json(payload)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn update(&self, id: i64, payload: &CarPayload) -> Result<(), ClientError> {
        let response = self
            .authorize(self.http.put(self.url(Some(id))))
            .json(payload)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        let response = self
            .authorize(self.http.delete(self.url(Some(id))))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    if status == StatusCode::BAD_REQUEST {
        if let Ok(body) = serde_json::from_str::<ValidationBody>(&text) {
            return Err(ClientError::Validation(body.errors));
        }
    }

    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(match status {
        StatusCode::NOT_FOUND => ClientError::NotFound,
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        _ => ClientError::Status {
            status: status.as_u16(),
            message,
        },
    })
}
