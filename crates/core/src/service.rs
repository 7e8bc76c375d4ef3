//! Client side of the cashier registration service.
//!
//! ## Endpoints
//!
//! All paths are relative to the configured base URL
//! (`https://api.sjtechsol.com/api/cashier` by default):
//!
//! - `GET  /list`: payment records, wrapped in `{ success, data }`
//! - `GET  /registrations`: registration records, same envelope
//! - `PUT  /registrations/status/{id}`: body `{ "status": "approved" | "declined" }`
//!
//! Nothing is retried. Callers decide what a failure means for their view.

use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::records::{
    Decision, ListResponse, PaymentRecord, RegistrationRecord, StatusUpdate,
};

/// Boxed future returned by [`RegistrationService`] methods.
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ServiceError>> + Send + 'a>>;

// =============================================================================
// Errors
// =============================================================================

/// Failures talking to the registration service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-2xx status, or an envelope with `success: false`.
    #[error("service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// The response body was not the expected JSON.
    #[error("failed to parse service response: {0}")]
    Parse(String),
}

impl ServiceError {
    /// True for failures that happened before the service answered.
    pub fn is_network(&self) -> bool {
        matches!(self, ServiceError::Network(_))
    }
}

// =============================================================================
// Trait: RegistrationService
// =============================================================================

/// Abstraction over the remote service for testability.
pub trait RegistrationService: Send + Sync {
    /// Full payment list as stored by the service.
    fn list_payments(&self) -> ServiceFuture<'_, Vec<PaymentRecord>>;

    /// Full registration list as stored by the service.
    fn list_registrations(&self) -> ServiceFuture<'_, Vec<RegistrationRecord>>;

    /// Record the registrar's decision for one registration.
    fn set_status<'a>(&'a self, id: &'a str, decision: Decision) -> ServiceFuture<'a, ()>;
}

// =============================================================================
// Production: HttpRegistrationService
// =============================================================================

/// [`RegistrationService`] backed by the cashier HTTP API.
pub struct HttpRegistrationService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRegistrationService {
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ServiceError::Network)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn fetch_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ServiceError> {
        let url = self.url(path);
        tracing::debug!(%url, "Fetching list");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ServiceError::Rejected {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let envelope: ListResponse<T> =
            serde_json::from_slice(&body).map_err(|e| ServiceError::Parse(e.to_string()))?;

        if !envelope.success {
            return Err(ServiceError::Rejected {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "success flag not set".to_string()),
            });
        }

        tracing::debug!(%url, count = envelope.data.len(), "List fetched");
        Ok(envelope.data)
    }
}

impl RegistrationService for HttpRegistrationService {
    fn list_payments(&self) -> ServiceFuture<'_, Vec<PaymentRecord>> {
        Box::pin(self.fetch_list("/list"))
    }

    fn list_registrations(&self) -> ServiceFuture<'_, Vec<RegistrationRecord>> {
        Box::pin(self.fetch_list("/registrations"))
    }

    fn set_status<'a>(&'a self, id: &'a str, decision: Decision) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            let url = self.url(&format!("/registrations/status/{id}"));
            let body = StatusUpdate {
                status: decision.status(),
            };

            let response = self.client.put(&url).json(&body).send().await?;
            let status = response.status();
            if status.is_success() {
                tracing::info!(id, %decision, "Registration status updated");
                return Ok(());
            }

            let message = response.text().await.unwrap_or_default();
            tracing::warn!(id, %decision, status = status.as_u16(), "Status update rejected");
            Err(ServiceError::Rejected {
                status: status.as_u16(),
                message: if message.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown status")
                        .to_string()
                } else {
                    message
                },
            })
        })
    }
}

// =============================================================================
// Mock: MockRegistrationService (test / testing feature)
// =============================================================================

/// In-memory service with call counters and failure switches.
#[cfg(any(test, feature = "testing"))]
pub struct MockRegistrationService {
    pub payments: std::sync::Mutex<Vec<PaymentRecord>>,
    pub registrations: std::sync::Mutex<Vec<RegistrationRecord>>,
    /// When set, list calls fail with this status (0 means an unreadable body).
    pub fail_lists: std::sync::Mutex<Option<u16>>,
    /// Same, for status updates.
    pub fail_updates: std::sync::Mutex<Option<u16>>,
    pub list_calls: std::sync::atomic::AtomicUsize,
    pub update_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "testing"))]
impl MockRegistrationService {
    pub fn new(payments: Vec<PaymentRecord>, registrations: Vec<RegistrationRecord>) -> Self {
        Self {
            payments: std::sync::Mutex::new(payments),
            registrations: std::sync::Mutex::new(registrations),
            fail_lists: std::sync::Mutex::new(None),
            fail_updates: std::sync::Mutex::new(None),
            list_calls: Default::default(),
            update_calls: Default::default(),
        }
    }

    /// Fail every call.
    pub fn set_failure(&self, status: Option<u16>) {
        self.set_list_failure(status);
        self.set_update_failure(status);
    }

    pub fn set_list_failure(&self, status: Option<u16>) {
        *self.fail_lists.lock().unwrap() = status;
    }

    pub fn set_update_failure(&self, status: Option<u16>) {
        *self.fail_updates.lock().unwrap() = status;
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn failure(switch: &std::sync::Mutex<Option<u16>>) -> Option<ServiceError> {
        (*switch.lock().unwrap()).map(|status| {
            if status == 0 {
                ServiceError::Parse("mock unreadable body".to_string())
            } else {
                ServiceError::Rejected {
                    status,
                    message: "mock failure".to_string(),
                }
            }
        })
    }
}

#[cfg(any(test, feature = "testing"))]
impl RegistrationService for MockRegistrationService {
    fn list_payments(&self) -> ServiceFuture<'_, Vec<PaymentRecord>> {
        self.list_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let result = match Self::failure(&self.fail_lists) {
            Some(e) => Err(e),
            None => Ok(self.payments.lock().unwrap().clone()),
        };
        Box::pin(async move { result })
    }

    fn list_registrations(&self) -> ServiceFuture<'_, Vec<RegistrationRecord>> {
        self.list_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let result = match Self::failure(&self.fail_lists) {
            Some(e) => Err(e),
            None => Ok(self.registrations.lock().unwrap().clone()),
        };
        Box::pin(async move { result })
    }

    fn set_status<'a>(&'a self, id: &'a str, decision: Decision) -> ServiceFuture<'a, ()> {
        self.update_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let result = match Self::failure(&self.fail_updates) {
            Some(e) => Err(e),
            None => {
                let mut registrations = self.registrations.lock().unwrap();
                match registrations.iter_mut().find(|r| r.id == id) {
                    Some(record) => {
                        record.registration_status = Some(decision.status());
                        Ok(())
                    }
                    None => Err(ServiceError::Rejected {
                        status: 404,
                        message: format!("no registration {id}"),
                    }),
                }
            }
        };
        Box::pin(async move { result })
    }
}

// =============================================================================
// Tests
// =============================================================================
