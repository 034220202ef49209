//! Recipe-service HTTP client (§4.1).
//!
//! Owns the connection pool, retry/backoff policy, and failure
//! classification for every call made to the remote recipe service.

use crate::config::Config;
use crate::constants;
use crate::error::Error;
use crate::logging::{self, SecretContext};
use crate::model::{BatchOperation, EntityId, Food, IngredientRef, Recipe, Unit};
use crate::resilience::{
    calculate_retry_delay_with_header, create_resilient_client, parse_retry_after_header,
    RetryConfig, TimeoutConfig,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// The outcome of classifying a failed remote call (§4.1, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Transient,
    PermanentConflict,
    PermanentNotFound,
    PermanentValidation,
    PermanentAuth,
    PermanentOther,
}

impl Failure {
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::PermanentAuth,
            404 => Self::PermanentNotFound,
            409 => Self::PermanentConflict,
            400 | 422 => Self::PermanentValidation,
            408 | 425 | 429 | 500 | 502 | 503 | 504 => Self::Transient,
            _ => Self::PermanentOther,
        }
    }

    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Transient)
    }
}

/// Behaviors the rest of the crate needs from the recipe service.
///
/// Abstracted as a trait so the Orchestrator and Batch Executor can be
/// tested against an in-memory double instead of a live HTTP server.
#[async_trait::async_trait]
pub trait RemoteClient: Send + Sync {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, Error>;
    async fn list_units(&self) -> Result<Vec<Unit>, Error>;
    async fn list_foods(&self) -> Result<Vec<Food>, Error>;
    async fn create_unit(&self, name: &str, abbreviation: Option<&str>) -> Result<EntityId, Error>;
    async fn create_food(&self, name: &str) -> Result<EntityId, Error>;
    async fn add_food_alias(&self, food_id: &str, alias: &str) -> Result<(), Error>;
    async fn update_ingredient(
        &self,
        ingredient_ref: &IngredientRef,
        unit_ref: Option<&str>,
        food_ref: Option<&str>,
    ) -> Result<(), Error>;
}

/// `reqwest`-backed `RemoteClient` with a bounded connection pool and
/// exponential-backoff retry for transient failures.
pub struct HttpRemoteClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    secret_ctx: SecretContext,
    retry_config: RetryConfig,
    pool: Arc<Semaphore>,
    max_body_len: usize,
}

impl HttpRemoteClient {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let timeout_config = TimeoutConfig {
            connect_timeout_ms: constants::DEFAULT_REQUEST_TIMEOUT_SECS * 1000,
            request_timeout_ms: config.request_timeout.as_millis().try_into().unwrap_or(u64::MAX),
        };
        let client = create_resilient_client(&timeout_config)?;
        let retry_config = RetryConfig {
            max_attempts: config.max_retries,
            initial_delay_ms: constants::RETRY_BASE_DELAY_MS,
            max_delay_ms: constants::RETRY_CAP_MS,
            backoff_multiplier: 2.0,
            jitter: true,
        };
        Ok(Self {
            client,
            base_url: config.service_url.trim_end_matches('/').to_string(),
            token: config.service_token.clone(),
            secret_ctx: SecretContext::from_token(config.service_token.clone()),
            retry_config,
            pool: Arc::new(Semaphore::new(constants::DEFAULT_CONNECTION_POOL_SIZE)),
            max_body_len: logging::get_max_body_len(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends one request, retrying transient failures per the §4.1 backoff
    /// policy, and returns the classified permanent failure otherwise.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        idempotency_key: Option<&str>,
    ) -> Result<reqwest::Response, Error> {
        let _permit = self
            .pool
            .acquire()
            .await
            .map_err(|e| Error::network_request_failed(format!("connection pool closed: {e}")))?;

        let url = self.url(path);
        let mut attempt: usize = 0;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(&self.token);
            if let Some(key) = idempotency_key {
                request = request.header("Idempotency-Key", key);
            }
            if let Some(ref b) = body {
                request = request.json(b);
            }

            logging::log_request(
                method.as_str(),
                &url,
                None,
                body.as_ref().map(|b| b.to_string()).as_deref(),
                Some(&self.secret_ctx),
            );

            let started = Instant::now();
            let outcome = request.send().await;
            let duration_ms = started.elapsed().as_millis();

            match outcome {
                Ok(response) => {
                    let status = response.status();
                    logging::log_response(status.as_u16(), duration_ms, None, None, self.max_body_len, Some(&self.secret_ctx));

                    if status.is_success() {
                        return Ok(response);
                    }

                    let failure = Failure::from_status(status.as_u16());
                    if failure.is_transient() && attempt + 1 < self.retry_config.max_attempts {
                        let retry_after = parse_retry_after_header(response.headers());
                        let delay = calculate_retry_delay_with_header(&self.retry_config, attempt, retry_after);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    let attempts_made: u32 = (attempt + 1).try_into().unwrap_or(u32::MAX);
                    return Err(classify_response_error(status, failure, attempts_made, response.text().await.ok()));
                }
                Err(err) => {
                    if is_network_transient(&err) && attempt + 1 < self.retry_config.max_attempts {
                        let delay = calculate_retry_delay_with_header(&self.retry_config, attempt, None);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(Error::network_request_failed(err.to_string()));
                }
            }
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        idempotency_key: Option<&str>,
    ) -> Result<T, Error> {
        let response = self.send(method, path, body, idempotency_key).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::network_request_failed(format!("invalid response body: {e}")))
    }
}

fn is_network_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

fn classify_response_error(status: StatusCode, failure: Failure, attempts_made: u32, body: Option<String>) -> Error {
    let detail = body.unwrap_or_default();
    match failure {
        Failure::PermanentAuth => Error::auth_failed(detail),
        Failure::PermanentNotFound => Error::not_found(detail),
        Failure::PermanentConflict => Error::conflict(detail),
        Failure::PermanentValidation => Error::validation_error(detail),
        Failure::Transient => Error::retry_limit_exceeded(attempts_made, detail),
        Failure::PermanentOther => Error::remote_other(status.as_u16(), detail),
    }
}

#[async_trait::async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, Error> {
        self.send_json(Method::GET, "/recipes", None, None).await
    }

    async fn list_units(&self) -> Result<Vec<Unit>, Error> {
        self.send_json(Method::GET, "/units", None, None).await
    }

    async fn list_foods(&self) -> Result<Vec<Food>, Error> {
        self.send_json(Method::GET, "/foods", None, None).await
    }

    async fn create_unit(&self, name: &str, abbreviation: Option<&str>) -> Result<EntityId, Error> {
        let body = serde_json::json!({ "name": name, "abbreviation": abbreviation });
        #[derive(serde::Deserialize)]
        struct Created {
            id: String,
        }
        let idempotency_key = uuid::Uuid::new_v4().to_string();
        let created: Created = self
            .send_json(Method::POST, "/units", Some(body), Some(&idempotency_key))
            .await?;
        Ok(created.id)
    }

    async fn create_food(&self, name: &str) -> Result<EntityId, Error> {
        let body = serde_json::json!({ "name": name });
        #[derive(serde::Deserialize)]
        struct Created {
            id: String,
        }
        let idempotency_key = uuid::Uuid::new_v4().to_string();
        let created: Created = self
            .send_json(Method::POST, "/foods", Some(body), Some(&idempotency_key))
            .await?;
        Ok(created.id)
    }

    async fn add_food_alias(&self, food_id: &str, alias: &str) -> Result<(), Error> {
        let body = serde_json::json!({ "alias": alias });
        let path = format!("/foods/{food_id}/aliases");
        let idempotency_key = uuid::Uuid::new_v4().to_string();
        self.send(Method::POST, &path, Some(body), Some(&idempotency_key)).await?;
        Ok(())
    }

    async fn update_ingredient(
        &self,
        ingredient_ref: &IngredientRef,
        unit_ref: Option<&str>,
        food_ref: Option<&str>,
    ) -> Result<(), Error> {
        let mut patch = serde_json::Map::new();
        if let Some(unit) = unit_ref {
            patch.insert("unit_ref".to_string(), Value::String(unit.to_string()));
        }
        if let Some(food) = food_ref {
            patch.insert("food_ref".to_string(), Value::String(food.to_string()));
        }
        let idempotency_key = uuid::Uuid::new_v4().to_string();
        let path = format!(
            "/recipes/{}/ingredients/{}",
            ingredient_ref.recipe_id, ingredient_ref.ingredient_id
        );
        self.send(Method::PATCH, &path, Some(Value::Object(patch)), Some(&idempotency_key))
            .await?;
        Ok(())
    }
}

/// Describes an in-flight operator decision sent to `update_ingredient`, kept
/// for callers that want to log which `BatchOperation` produced a given
/// remote-call failure.
#[must_use]
pub fn operation_label(op: &BatchOperation) -> &'static str {
    op.kind_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classification_matches_status_table() {
        assert_eq!(Failure::from_status(401), Failure::PermanentAuth);
        assert_eq!(Failure::from_status(403), Failure::PermanentAuth);
        assert_eq!(Failure::from_status(404), Failure::PermanentNotFound);
        assert_eq!(Failure::from_status(409), Failure::PermanentConflict);
        assert_eq!(Failure::from_status(400), Failure::PermanentValidation);
        assert_eq!(Failure::from_status(422), Failure::PermanentValidation);
        assert_eq!(Failure::from_status(429), Failure::Transient);
        assert_eq!(Failure::from_status(503), Failure::Transient);
        assert_eq!(Failure::from_status(418), Failure::PermanentOther);
    }

    #[test]
    fn test_is_transient() {
        assert!(Failure::Transient.is_transient());
        assert!(!Failure::PermanentAuth.is_transient());
    }
}
