//! View models for the two staff pages.
//!
//! [`RegistrationList`] is the registrar's approval page and
//! [`AdminDashboard`] is the admin payment overview. Both own a
//! [`RecordSet`], recompute their visible rows from it on demand, and report
//! outcomes as [`Notice`]s rather than failing: a view always stays usable,
//! possibly with stale or empty data.

use std::fmt;

use crate::dispatch::{self, Dispatched};
use crate::filter::{self, dedup_by_email, Category, RegionFilter, StatusFilter};
use crate::records::{Decision, PaymentRecord, Record, RegistrationRecord, Status};
use crate::service::{RegistrationService, ServiceError};
use crate::sync::{CloseHandle, RecordSet};
use crate::totals::Totals;

/// Short user-facing message about the last action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Success(msg) | Notice::Error(msg) => f.write_str(msg),
        }
    }
}

/// Actions offered for a row, derived from its effective status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowActions {
    /// Approve and decline buttons.
    Decide,
    /// Disabled marker for a final decision.
    Approved,
    Declined,
    /// Status the registrar cannot act on.
    None,
}

impl RowActions {
    pub fn for_status(status: &Status) -> Self {
        match status {
            Status::Pending => RowActions::Decide,
            Status::Approved => RowActions::Approved,
            Status::Declined => RowActions::Declined,
            Status::Paid | Status::Other(_) => RowActions::None,
        }
    }
}

// =============================================================================
// Registration list
// =============================================================================

/// One visible row of the registration list.
#[derive(Debug)]
pub struct RegistrationRow<'a> {
    /// 1-based position in the filtered list.
    pub serial: usize,
    pub record: &'a RegistrationRecord,
    pub status: Status,
    pub actions: RowActions,
}

/// Registrar approval page.
#[derive(Debug, Default)]
pub struct RegistrationList {
    records: RecordSet<RegistrationRecord>,
    pub search: String,
    pub status_filter: StatusFilter,
}

impl RegistrationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &RecordSet<RegistrationRecord> {
        &self.records
    }

    /// Load (or reload) the full registration list.
    pub async fn load<S>(&mut self, service: &S) -> Option<Notice>
    where
        S: RegistrationService + ?Sized,
    {
        match self
            .records
            .refresh(|| service.list_registrations(), |rows| rows)
            .await
        {
            Ok(count) => {
                tracing::info!(count, "Registrations loaded");
                None
            }
            Err(_) => Some(Notice::Error("Failed to load registrations".to_string())),
        }
    }

    /// Rows matching the current search and status filter.
    pub fn rows(&self) -> Vec<RegistrationRow<'_>> {
        let category = Category::from(self.status_filter);
        filter::filter(self.records.records(), &self.search, &category)
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                let status = record.effective_status();
                RegistrationRow {
                    serial: i + 1,
                    record,
                    actions: RowActions::for_status(&status),
                    status,
                }
            })
            .collect()
    }

    /// Approve or decline one registration.
    ///
    /// Only pending registrations can be decided. A registration that is not
    /// in the current snapshot is still sent; the service is authoritative.
    pub async fn decide<S>(&mut self, service: &S, id: &str, decision: Decision) -> Notice
    where
        S: RegistrationService + ?Sized,
    {
        if let Some(record) = self.records.records().iter().find(|r| r.id == id) {
            let status = record.effective_status();
            if RowActions::for_status(&status) != RowActions::Decide {
                tracing::warn!(id, %status, "Refusing to change a decided registration");
                return Notice::Error(format!("Registration is already {status}"));
            }
        }

        match dispatch::set_status(service, &mut self.records, id, decision).await {
            Ok(Dispatched::Applied) => updated(decision),
            Ok(Dispatched::AppliedStale(e)) => {
                tracing::warn!(id, error = %e, "Status updated but list refresh failed");
                updated(decision)
            }
            Err(e) => failure_notice(&e),
        }
    }

    /// Leave the page. Results arriving afterwards are ignored.
    pub fn close(&self) {
        self.records.close();
    }

    pub fn close_handle(&self) -> CloseHandle {
        self.records.close_handle()
    }
}

fn updated(decision: Decision) -> Notice {
    Notice::Success(format!(
        "Updated to {}",
        decision.status().as_str().to_uppercase()
    ))
}

fn failure_notice(e: &ServiceError) -> Notice {
    tracing::warn!(error = %e, "Status update failed");
    if e.is_network() {
        Notice::Error("Server Error".to_string())
    } else {
        Notice::Error("Action failed".to_string())
    }
}

// =============================================================================
// Admin dashboard
// =============================================================================

/// One visible row of the payment dashboard.
#[derive(Debug)]
pub struct PaymentRow<'a> {
    pub serial: usize,
    pub record: &'a PaymentRecord,
    pub balance_amount: f64,
}

/// Admin payment overview.
#[derive(Debug, Default)]
pub struct AdminDashboard {
    records: RecordSet<PaymentRecord>,
    pub search: String,
    pub region_filter: RegionFilter,
}

impl AdminDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &RecordSet<PaymentRecord> {
        &self.records
    }

    /// Load the payment list, keeping the first record per email.
    pub async fn load<S>(&mut self, service: &S) -> Option<Notice>
    where
        S: RegistrationService + ?Sized,
    {
        match self
            .records
            .refresh(|| service.list_payments(), dedup_by_email)
            .await
        {
            Ok(count) => {
                tracing::info!(count, "Payments loaded");
                None
            }
            Err(_) => Some(Notice::Error("Failed to load payments".to_string())),
        }
    }

    fn visible(&self) -> Vec<&PaymentRecord> {
        let category = Category::from(self.region_filter);
        filter::filter(self.records.records(), &self.search, &category)
    }

    pub fn rows(&self) -> Vec<PaymentRow<'_>> {
        self.visible()
            .into_iter()
            .enumerate()
            .map(|(i, record)| PaymentRow {
                serial: i + 1,
                record,
                balance_amount: record.balance_amount(),
            })
            .collect()
    }

    /// Displayed total over the visible rows; regional totals over everything.
    pub fn totals(&self) -> Totals {
        Totals::compute(self.visible(), self.records.records())
    }

    pub fn close(&self) {
        self.records.close();
    }

    pub fn close_handle(&self) -> CloseHandle {
        self.records.close_handle()
    }
}

// =============================================================================
// Tests
// =============================================================================
