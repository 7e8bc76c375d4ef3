//! Registrar status changes.
//!
//! A decision is sent to the service and, only once the service accepts it,
//! the registration list is refetched in full. Nothing is changed locally
//! ahead of the response, so a rejected update needs no rollback.

use crate::records::{Decision, RegistrationRecord};
use crate::service::{RegistrationService, ServiceError};
use crate::sync::RecordSet;

/// Outcome of a dispatched decision.
#[derive(Debug)]
pub enum Dispatched {
    /// Accepted and the list was refreshed.
    Applied,
    /// Accepted, but the follow-up refresh failed; the snapshot is stale.
    AppliedStale(ServiceError),
}

/// Send `decision` for registration `id` and resync `list` on success.
///
/// On failure the list is not touched and no refresh is issued.
pub async fn set_status<S>(
    service: &S,
    list: &mut RecordSet<RegistrationRecord>,
    id: &str,
    decision: Decision,
) -> Result<Dispatched, ServiceError>
where
    S: RegistrationService + ?Sized,
{
    service.set_status(id, decision).await?;

    match list
        .refresh(|| service.list_registrations(), |rows| rows)
        .await
    {
        Ok(_) => Ok(Dispatched::Applied),
        Err(e) => Ok(Dispatched::AppliedStale(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Status;
    use crate::service::MockRegistrationService;

    fn pending(id: &str) -> RegistrationRecord {
        RegistrationRecord {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_success_triggers_full_refresh() {
        let service = MockRegistrationService::new(Vec::new(), vec![pending("r1"), pending("r2")]);
        let mut list = RecordSet::new();
        list.refresh(|| service.list_registrations(), |rows| rows)
            .await
            .unwrap();

        let outcome = set_status(&service, &mut list, "r2", Decision::Decline)
            .await
            .unwrap();

        assert!(matches!(outcome, Dispatched::Applied));
        assert_eq!(service.list_calls(), 2);
        assert_eq!(list.generation(), 2);
        assert_eq!(
            list.records()[1].registration_status,
            Some(Status::Declined)
        );
    }

    #[tokio::test]
    async fn test_rejection_leaves_list_and_skips_refresh() {
        let service = MockRegistrationService::new(Vec::new(), vec![pending("r1")]);
        let mut list = RecordSet::new();
        list.refresh(|| service.list_registrations(), |rows| rows)
            .await
            .unwrap();
        let before = list.records().to_vec();

        service.set_failure(Some(500));
        let result = set_status(&service, &mut list, "r1", Decision::Approve).await;

        assert!(matches!(
            result,
            Err(ServiceError::Rejected { status: 500, .. })
        ));
        assert_eq!(service.list_calls(), 1);
        assert_eq!(list.records(), before.as_slice());
        assert_eq!(list.generation(), 1);
    }

    #[tokio::test]
    async fn test_failed_resync_reports_stale_success() {
        let service = MockRegistrationService::new(Vec::new(), vec![pending("r1")]);
        let mut list = RecordSet::new();
        list.refresh(|| service.list_registrations(), |rows| rows)
            .await
            .unwrap();
        let before = list.records().to_vec();

        service.set_list_failure(Some(503));
        let outcome = set_status(&service, &mut list, "r1", Decision::Approve)
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            Dispatched::AppliedStale(ServiceError::Rejected { status: 503, .. })
        ));
        assert_eq!(service.update_calls(), 1);
        assert_eq!(service.list_calls(), 2);
        assert_eq!(list.records(), before.as_slice());
        assert_eq!(list.generation(), 1);
        assert_eq!(
            service.registrations.lock().unwrap()[0].registration_status,
            Some(Status::Approved)
        );
    }
}
