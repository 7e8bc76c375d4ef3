//! Client library for the event registration cashier service.
//!
//! Registrars approve or decline registrations; admins review payment
//! submissions. The service owns every record. This crate fetches full
//! snapshots, derives each registration's effective status, filters and
//! totals the snapshot locally, and sends status decisions back.
//!
//! - [`records`]: wire types
//! - [`status`]: effective status resolution
//! - [`filter`]: search, category filter, email dedup
//! - [`totals`]: dashboard sums
//! - [`service`]: the remote service seam and its HTTP client
//! - [`sync`]: snapshot refresh
//! - [`dispatch`]: status updates followed by a resync
//! - [`session`]: role sessions gating the staff views
//! - [`views`]: the registrar and admin pages

pub mod config;
pub mod dispatch;
pub mod filter;
pub mod logging;
pub mod records;
pub mod service;
pub mod session;
pub mod status;
pub mod sync;
pub mod totals;
pub mod views;

pub use config::Config;
pub use records::{Decision, PaymentRecord, RegistrationRecord, Status};
pub use service::{HttpRegistrationService, RegistrationService, ServiceError};
pub use session::{Role, Session, SessionStore};
pub use status::effective_status;
