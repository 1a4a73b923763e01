//! Reconciliation tests for `Role` records
//!
//! Roles are drift checked, and every pass after the first also brings the
//! role mapping of the same name in line with `spec.roleMappings`.

mod common;

use common::{reconciler, record_ref, role, FakeAdminApi};
use search_security_operator::client::ApiMethod;
use search_security_operator::controller::reconciler::{ReconcileOutcome, ReconcilerError};
use search_security_operator::crd::{Role, SyncState};
use serde_json::json;
use std::time::Duration;

const ROLE: &str = "_opendistro/_security/api/roles/analyst";
const MAPPING: &str = "_opendistro/_security/api/rolesmapping/analyst";
const FINALIZER: &str = "role.security.search-operator.io/finalizer";

#[tokio::test]
async fn test_fresh_role_is_created_and_mapping_follows() {
    let api = FakeAdminApi::new();
    let r = reconciler(&api, role("analyst", &["readers"]))
        .with_follow_up(Duration::from_secs(3));

    let outcome = r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Created { follow_up: true });
    assert_eq!(api.count(ApiMethod::Put, ROLE), 1);
    assert_eq!(api.count(ApiMethod::Put, MAPPING), 0);
    assert_eq!(r.store().finalizers("analyst"), vec![FINALIZER.to_string()]);
    assert_eq!(
        r.action_for(outcome),
        kube_runtime::controller::Action::requeue(Duration::from_secs(3))
    );

    // Follow-up pass: role unchanged, mapping created
    let outcome = r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Unchanged);
    assert_eq!(api.count(ApiMethod::Put, ROLE), 1);
    assert_eq!(api.count(ApiMethod::Put, MAPPING), 1);
    assert_eq!(api.object(MAPPING), Some(json!({"backend_roles": ["readers"]})));

    let status = r.store().status("analyst").unwrap();
    assert_eq!(status.state, Some(SyncState::Deployed));
    assert_eq!(status.id, None);
}

#[tokio::test]
async fn test_unchanged_role_issues_no_writes() {
    let api = FakeAdminApi::new();
    let r = reconciler(&api, role("analyst", &["readers"]));
    r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    let writes = api.writes().len();
    let status_writes = r.store().status_writes();

    let outcome = r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Unchanged);
    assert_eq!(api.writes().len(), writes);
    assert_eq!(r.store().status_writes(), status_writes);
}

#[tokio::test]
async fn test_mapping_edit_only_rewrites_mapping() {
    let api = FakeAdminApi::new();
    let r = reconciler(&api, role("analyst", &["readers"]));
    r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    api.clear_calls();

    r.store().edit("analyst", |role| {
        role.spec.role_mappings.backend_roles = vec!["readers".to_string(), "auditors".to_string()];
    });
    r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();

    assert_eq!(api.count(ApiMethod::Get, ROLE), 1);
    assert_eq!(api.count(ApiMethod::Get, MAPPING), 1);
    assert_eq!(api.count(ApiMethod::Put, ROLE), 0);
    assert_eq!(api.count(ApiMethod::Put, MAPPING), 1);
    assert_eq!(
        api.object(MAPPING),
        Some(json!({"backend_roles": ["readers", "auditors"]}))
    );
    assert_eq!(r.store().status("analyst").unwrap().observed_generation, Some(2));
}

#[tokio::test]
async fn test_remote_drift_is_corrected() {
    let api = FakeAdminApi::new();
    api.seed(
        ROLE,
        json!({"cluster_permissions": ["cluster_all"], "index_permissions": []}),
    );
    api.seed(MAPPING, json!({"backend_roles": ["readers"]}));
    let r = reconciler(&api, role("analyst", &["readers"]));

    let outcome = r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Updated);
    assert_eq!(api.count(ApiMethod::Put, ROLE), 1);
    assert_eq!(api.count(ApiMethod::Put, MAPPING), 0);
    assert_eq!(api.object(ROLE).unwrap()["cluster_permissions"], json!(["cluster_monitor"]));
}

#[tokio::test]
async fn test_rejected_mapping_marks_role_as_error() {
    let api = FakeAdminApi::new();
    let r = reconciler(&api, role("analyst", &["readers"]));
    r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();

    api.respond(
        ApiMethod::Put,
        MAPPING,
        400,
        r#"{"status":"BAD_REQUEST","message":"invalid backend role"}"#,
    );
    let outcome = r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Rejected);

    let status = r.store().status("analyst").unwrap();
    assert_eq!(status.state, Some(SyncState::Error));
    assert!(status.error.unwrap().contains("invalid backend role"));
}

#[tokio::test]
async fn test_mapping_recovery_clears_role_error() {
    let api = FakeAdminApi::new();
    let r = reconciler(&api, role("analyst", &["readers"]));
    r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();

    api.respond(ApiMethod::Put, MAPPING, 400, r#"{"status":"BAD_REQUEST"}"#);
    let outcome = r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Rejected);
    assert!(r.store().status("analyst").unwrap().error.is_some());

    let outcome = r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Unchanged);
    assert_eq!(api.object(MAPPING), Some(json!({"backend_roles": ["readers"]})));

    let status = r.store().status("analyst").unwrap();
    assert_eq!(status.state, Some(SyncState::Deployed));
    assert_eq!(status.error, None);
}

#[tokio::test]
async fn test_rejected_create_is_recorded() {
    let api = FakeAdminApi::new();
    api.respond(ApiMethod::Put, ROLE, 400, r#"{"status":"BAD_REQUEST"}"#);
    let r = reconciler(&api, role("analyst", &["readers"]));

    let outcome = r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Rejected);
    assert_eq!(
        r.store().status("analyst").unwrap().error.as_deref(),
        Some(r#"{"status":"BAD_REQUEST"}"#)
    );
}

#[tokio::test]
async fn test_failed_existence_check_issues_no_write() {
    let api = FakeAdminApi::new();
    api.respond(ApiMethod::Get, ROLE, 503, "service unavailable");
    let r = reconciler(&api, role("analyst", &["readers"]));

    let err = r.reconcile::<Role>(&record_ref("analyst")).await.unwrap_err();
    assert!(matches!(
        err,
        ReconcilerError::ExistenceCheckFailed { status: 503, .. }
    ));
    assert!(api.writes().is_empty());
}

#[tokio::test]
async fn test_status_write_failure_names_remote_outcome() {
    let api = FakeAdminApi::new();
    let mut record = role("analyst", &["readers"]);
    record.metadata.finalizers = Some(vec![FINALIZER.to_string()]);
    let r = reconciler(&api, record);
    r.store().fail_writes();

    let err = r.reconcile::<Role>(&record_ref("analyst")).await.unwrap_err();
    assert!(matches!(
        err,
        ReconcilerError::StatusUpdate {
            operation: "create",
            outcome: SyncState::Deployed,
            ..
        }
    ));
    assert_eq!(api.count(ApiMethod::Put, ROLE), 1);
}

#[tokio::test]
async fn test_delete_removes_role_by_name() {
    let api = FakeAdminApi::new();
    let r = reconciler(&api, role("analyst", &["readers"]));
    r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();

    r.store().request_deletion("analyst");
    let outcome = r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Finalized);
    assert_eq!(api.count(ApiMethod::Delete, ROLE), 1);
    assert!(api.object(ROLE).is_none());
    assert!(r.store().get("analyst").is_none());
}

#[tokio::test]
async fn test_delete_of_missing_role_still_releases_finalizer() {
    let api = FakeAdminApi::new();
    let mut record = role("analyst", &["readers"]);
    record.metadata.finalizers = Some(vec![FINALIZER.to_string()]);
    let r = reconciler(&api, record);

    r.store().request_deletion("analyst");
    let outcome = r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Finalized);
    assert!(r.store().get("analyst").is_none());
}

#[tokio::test]
async fn test_transport_failure_during_delete_keeps_finalizer() {
    let api = FakeAdminApi::new();
    let r = reconciler(&api, role("analyst", &["readers"]));
    r.reconcile::<Role>(&record_ref("analyst")).await.unwrap();

    api.set_unavailable(true);
    r.store().request_deletion("analyst");
    let err = r.reconcile::<Role>(&record_ref("analyst")).await.unwrap_err();
    assert!(matches!(err, ReconcilerError::Api(_)));
    assert_eq!(r.store().finalizers("analyst"), vec![FINALIZER.to_string()]);
}
