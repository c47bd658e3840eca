//! This crate provides the core logic of the cross-account policy manager:
//! - Policy document model and invocation payloads
//! - Ownership of generated statements and the reconcile pass
//! - STS role assumption and KMS / S3 policy stores
//! - The deployment-side accessor registry

mod aws;
pub mod commands;
mod config;
mod error;
mod policy;
mod registry;
mod types;

// Re-exports for a small, focused public API
pub use aws::kms_client::{KmsKeyPolicyStore, KEY_POLICY_NAME};
pub use aws::policy_store::PolicyStore;
pub use aws::s3_client::{bucket_objects_arn, S3BucketPolicyStore};
pub use aws::sts::{assume_management_role, role_session_name};
pub use aws::{AwsError, AwsResult};
pub use commands::{sync_with_store, PolicyManagerService};
pub use config::{ManagerConfig, LOCALSTACK_ENDPOINT, LOCALSTACK_REGION};
pub use error::{XaPolicyError, XaPolicyResult};
pub use policy::{build_cloudfront_statement, reconcile, ReconcileReport, StatementOwner};
pub use registry::{
    execution_role_name, management_role_arn, AccessorRegistry, KMS_DEFAULT_ACTIONS,
    S3_DEFAULT_ACTIONS,
};
pub use types::{
    ActionType, CloudfrontAccessors, ManagerEvent, ManagerKind, Operation, PolicyDocument,
    Statement, SyncOutcome, POLICY_VERSION,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kms_round_trip_through_public_api() {
        let owner = StatementOwner::new("111122223333", "web");
        let mut policy = PolicyDocument::empty();
        let mut registry = AccessorRegistry::new();
        registry
            .register(ManagerKind::Kms, "key-1", "E1ABC", None)
            .expect("register");
        let accessors = registry.consume(ManagerKind::Kms, "key-1").expect("consume");

        reconcile(
            &mut policy,
            &owner,
            "*",
            &ManagerEvent::new(Operation::Create, accessors.clone()),
        );
        assert_eq!(policy.statement.len(), 1);

        reconcile(
            &mut policy,
            &owner,
            "*",
            &ManagerEvent::new(Operation::Delete, accessors),
        );
        assert!(policy.statement.is_empty());
    }
}
