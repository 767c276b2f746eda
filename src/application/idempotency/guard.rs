//! IdempotencyGuard - replay cache around side-effecting operations.
//!
//! The HTTP layer wraps guarded endpoints (order creation, payment
//! intent creation) in `execute`. A request without a key passes
//! through untouched. A request whose key already holds a completed
//! response gets that response replayed verbatim, and the operation is
//! never invoked. Only 2xx outcomes are cached; failures stay
//! uncached so the client's retry actually retries.

use std::future::Future;
use std::sync::Arc;

use http::StatusCode;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::domain::foundation::DomainError;
use crate::ports::{Clock, IdempotencyRecord, IdempotencyScope, IdempotencyStore, SaveResult};

/// Outcome of a guarded operation, as cached and replayed.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

impl OperationResponse {
    pub fn new(status: StatusCode, body: serde_json::Value) -> Self {
        Self { status, body }
    }
}

/// Failures surfaced by the guard itself.
#[derive(Debug, Error)]
pub enum IdempotencyError {
    /// The key was reused with a different request payload.
    #[error("idempotency key reused with a different request body")]
    KeyReuseMismatch,

    /// The underlying operation failed; nothing was cached.
    #[error(transparent)]
    Operation(DomainError),

    /// The cache itself failed.
    #[error(transparent)]
    Storage(DomainError),
}

/// Wraps side-effecting operations with replay semantics.
pub struct IdempotencyGuard {
    store: Arc<dyn IdempotencyStore>,
    clock: Arc<dyn Clock>,
    ttl_hours: u64,
}

impl IdempotencyGuard {
    pub fn new(store: Arc<dyn IdempotencyStore>, clock: Arc<dyn Clock>, ttl_hours: u64) -> Self {
        Self {
            store,
            clock,
            ttl_hours,
        }
    }

    /// Runs `op` under the idempotency contract.
    ///
    /// `scope` is `None` when the request carried no key header: the
    /// operation runs unconditionally and nothing is cached. With a
    /// scope, a live cached response short-circuits, a key reused for a
    /// different body is rejected, and a fresh 2xx result is stored
    /// with single-writer-wins semantics (the loser of a concurrent
    /// race replays the winner's record).
    pub async fn execute<F, Fut>(
        &self,
        scope: Option<IdempotencyScope>,
        request_body: &[u8],
        op: F,
    ) -> Result<OperationResponse, IdempotencyError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<OperationResponse, DomainError>>,
    {
        let scope = match scope {
            Some(scope) => scope,
            None => {
                return op().await.map_err(IdempotencyError::Operation);
            }
        };

        let request_hash = hash_body(request_body);
        let now = self.clock.now();

        if let Some(record) = self
            .store
            .find(&scope)
            .await
            .map_err(IdempotencyError::Storage)?
        {
            if record.expires_at.is_after(&now) {
                if record.request_hash != request_hash {
                    return Err(IdempotencyError::KeyReuseMismatch);
                }
                if record.used {
                    debug!(
                        key = %scope.key,
                        endpoint = %scope.endpoint,
                        "replaying cached idempotent response"
                    );
                    return Ok(replay(&record));
                }
            }
        }

        let response = op().await.map_err(IdempotencyError::Operation)?;

        if response.status.is_success() {
            let record = IdempotencyRecord {
                scope: scope.clone(),
                request_hash,
                response_status: response.status.as_u16(),
                response_body: response.body.clone(),
                used: true,
                expires_at: now.plus_hours(self.ttl_hours),
                created_at: now,
            };

            match self
                .store
                .put_if_absent(record)
                .await
                .map_err(IdempotencyError::Storage)?
            {
                SaveResult::Inserted => {}
                SaveResult::AlreadyExists => {
                    // A concurrent request with the same key finished
                    // first; its response is the canonical one.
                    if let Some(winner) = self
                        .store
                        .find(&scope)
                        .await
                        .map_err(IdempotencyError::Storage)?
                    {
                        if winner.used {
                            return Ok(replay(&winner));
                        }
                    }
                }
            }
        }

        Ok(response)
    }
}

fn replay(record: &IdempotencyRecord) -> OperationResponse {
    OperationResponse {
        status: StatusCode::from_u16(record.response_status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        body: record.response_body.clone(),
    }
}

/// SHA-256 hex of the raw request body.
fn hash_body(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}
