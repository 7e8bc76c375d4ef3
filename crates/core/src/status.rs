//! Effective approval status of a registration.

use crate::records::{RegistrationRecord, Status};

/// Resolve the status a registration should be shown and filtered with.
///
/// An explicit, non-empty `registrationStatus` always wins. Otherwise the last
/// transaction's status is authoritative. With neither, the record is pending.
pub fn effective_status(record: &RegistrationRecord) -> Status {
    if let Some(explicit) = record.registration_status.as_ref().filter(|s| !is_blank(s)) {
        return explicit.clone();
    }

    record
        .transactions
        .last()
        .and_then(|tx| tx.status.as_ref())
        .filter(|s| !is_blank(s))
        .cloned()
        .unwrap_or(Status::Pending)
}

fn is_blank(status: &Status) -> bool {
    match status {
        Status::Other(s) => s.is_empty(),
        Status::Pending | Status::Approved | Status::Declined | Status::Paid => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Transaction;

    fn tx(status: &str) -> Transaction {
        Transaction {
            status: Some(Status::from(status)),
            ..Default::default()
        }
    }

    #[test]
    fn test_explicit_status_beats_transactions() {
        let record = RegistrationRecord {
            registration_status: Some(Status::Approved),
            transactions: vec![tx("declined")],
            ..Default::default()
        };
        assert_eq!(effective_status(&record), Status::Approved);
    }

    #[test]
    fn test_last_transaction_wins() {
        let record = RegistrationRecord {
            transactions: vec![tx("pending"), tx("approved")],
            ..Default::default()
        };
        assert_eq!(effective_status(&record), Status::Approved);
    }

    #[test]
    fn test_defaults_to_pending() {
        let record = RegistrationRecord::default();
        assert_eq!(effective_status(&record), Status::Pending);
    }

    #[test]
    fn test_empty_explicit_status_falls_through() {
        let record = RegistrationRecord {
            registration_status: Some(Status::from("")),
            transactions: vec![tx("declined")],
            ..Default::default()
        };
        assert_eq!(effective_status(&record), Status::Declined);
    }

    #[test]
    fn test_last_transaction_without_status_is_pending() {
        let record = RegistrationRecord {
            transactions: vec![tx("approved"), Transaction::default()],
            ..Default::default()
        };
        assert_eq!(effective_status(&record), Status::Pending);
    }

    #[test]
    fn test_unknown_status_returned_verbatim() {
        let record = RegistrationRecord {
            transactions: vec![tx("partially_paid")],
            ..Default::default()
        };
        assert_eq!(effective_status(&record).as_str(), "partially_paid");
    }
}
