//! Policy synchronization for the KMS and S3 handlers

use crate::aws::kms_client::KmsKeyPolicyStore;
use crate::aws::policy_store::PolicyStore;
use crate::aws::s3_client::S3BucketPolicyStore;
use crate::aws::sts::{assume_management_role, role_session_name};
use crate::error::XaPolicyResult;
use crate::policy::{reconcile, StatementOwner};
use crate::types::{ManagerEvent, ManagerKind, SyncOutcome};
use aws_sdk_kms::Client as KmsClient;
use aws_sdk_s3::Client as S3Client;
use log::info;

impl super::service::PolicyManagerService {
    /// Assume the management role, then bring the target's policy in line with `event`.
    pub async fn sync(
        &self,
        kind: ManagerKind,
        event: &ManagerEvent,
    ) -> XaPolicyResult<SyncOutcome> {
        info!("operation: {}", event.operation);

        let session_name =
            role_session_name(&self.config.resource_id, event.operation.as_str());
        let assumed = assume_management_role(
            &self.sts_client,
            &self.sdk_config,
            &self.config.role_arn,
            &session_name,
        )
        .await?;

        let owner = self.config.owner();
        match kind {
            ManagerKind::Kms => {
                let store =
                    KmsKeyPolicyStore::new(KmsClient::new(&assumed), &self.config.resource_id);
                sync_with_store(&store, &owner, event).await
            }
            ManagerKind::S3 => {
                // LocalStack only serves path-style bucket addressing.
                let s3_config = aws_sdk_s3::config::Builder::from(&assumed)
                    .force_path_style(self.config.local)
                    .build();
                let store = S3BucketPolicyStore::new(
                    S3Client::from_conf(s3_config),
                    &self.config.resource_id,
                );
                sync_with_store(&store, &owner, event).await
            }
        }
    }

    pub async fn sync_kms_key_policy(
        &self,
        event: &ManagerEvent,
    ) -> XaPolicyResult<SyncOutcome> {
        self.sync(ManagerKind::Kms, event).await
    }

    pub async fn sync_s3_bucket_policy(
        &self,
        event: &ManagerEvent,
    ) -> XaPolicyResult<SyncOutcome> {
        self.sync(ManagerKind::S3, event).await
    }
}

/// Read the policy from `store`, reconcile the statements `owner` manages, write it back.
///
/// The write always replaces the whole document, even when nothing changed.
pub async fn sync_with_store<S>(
    store: &S,
    owner: &StatementOwner,
    event: &ManagerEvent,
) -> XaPolicyResult<SyncOutcome>
where
    S: PolicyStore + ?Sized,
{
    info!(
        "cloudfrontAccessors: {}",
        event.distribution_ids().join("\n- ")
    );

    let mut policy = store.get_policy().await?;
    let report = reconcile(&mut policy, owner, &store.statement_resource(), event);
    store.put_policy(&policy).await?;

    Ok(SyncOutcome {
        target: store.target_name().to_string(),
        operation: event.operation.clone(),
        removed: report.removed,
        added: report.added,
        statement_count: policy.statement.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::{AwsError, AwsResult};
    use crate::error::XaPolicyError;
    use crate::types::{CloudfrontAccessors, Operation, PolicyDocument};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct MemoryStore {
        policy: Mutex<PolicyDocument>,
        writes: Mutex<usize>,
        fail_put: bool,
    }

    impl MemoryStore {
        fn new(policy: PolicyDocument) -> Self {
            Self {
                policy: Mutex::new(policy),
                writes: Mutex::new(0),
                fail_put: false,
            }
        }

        fn snapshot(&self) -> PolicyDocument {
            self.policy.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl PolicyStore for MemoryStore {
        fn target_name(&self) -> &str {
            "assets"
        }

        fn statement_resource(&self) -> String {
            "arn:aws:s3:::assets/*".to_string()
        }

        async fn get_policy(&self) -> AwsResult<PolicyDocument> {
            Ok(self.snapshot())
        }

        async fn put_policy(&self, policy: &PolicyDocument) -> AwsResult<()> {
            if self.fail_put {
                return Err(AwsError::S3Error("AccessDenied".to_string()));
            }
            *self.policy.lock().expect("lock") = policy.clone();
            *self.writes.lock().expect("lock") += 1;
            Ok(())
        }
    }

    fn existing_policy() -> PolicyDocument {
        serde_json::from_value(json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Sid": "AllowSSLRequestsOnly",
                    "Effect": "Deny",
                    "Principal": "*",
                    "Action": "s3:*",
                    "Resource": ["arn:aws:s3:::assets", "arn:aws:s3:::assets/*"],
                    "Condition": {"Bool": {"aws:SecureTransport": "false"}}
                },
                {
                    "Sid": "111122223333 web : cf-STALE",
                    "Effect": "Allow",
                    "Principal": {"Service": "cloudfront.amazonaws.com"},
                    "Action": ["s3:GetObject"],
                    "Resource": "arn:aws:s3:::assets/*"
                }
            ]
        }))
        .expect("valid policy")
    }

    fn event(operation: &str, ids: &[&str]) -> ManagerEvent {
        let accessors: CloudfrontAccessors = ids
            .iter()
            .map(|id| ((*id).to_string(), vec!["s3:GetObject".to_string()]))
            .collect();
        ManagerEvent::new(operation, accessors)
    }

    #[tokio::test]
    async fn test_sync_replaces_stale_statements() {
        let store = MemoryStore::new(existing_policy());
        let owner = StatementOwner::new("111122223333", "web");

        let outcome = sync_with_store(&store, &owner, &event("create", &["E1"]))
            .await
            .expect("sync");

        assert_eq!(
            outcome,
            SyncOutcome {
                target: "assets".to_string(),
                operation: Operation::Create,
                removed: 1,
                added: 1,
                statement_count: 2,
            }
        );
        let policy = store.snapshot();
        assert_eq!(
            policy.statement[0].sid.as_deref(),
            Some("AllowSSLRequestsOnly")
        );
        assert_eq!(
            policy.statement[1].sid.as_deref(),
            Some("111122223333 web : cf-E1")
        );
        assert_eq!(*store.writes.lock().expect("lock"), 1);
    }

    #[tokio::test]
    async fn test_sync_twice_is_stable() {
        let store = MemoryStore::new(existing_policy());
        let owner = StatementOwner::new("111122223333", "web");
        let update = event("update", &["E2", "E1"]);

        sync_with_store(&store, &owner, &update).await.expect("sync");
        let first = store.snapshot();
        sync_with_store(&store, &owner, &update).await.expect("sync");

        assert_eq!(store.snapshot(), first);
    }

    #[tokio::test]
    async fn test_sync_delete_leaves_foreign_statements() {
        let store = MemoryStore::new(existing_policy());
        let owner = StatementOwner::new("111122223333", "web");

        let outcome = sync_with_store(&store, &owner, &event("delete", &["E1"]))
            .await
            .expect("sync");

        assert_eq!(outcome.added, 0);
        assert_eq!(outcome.removed, 1);
        let policy = store.snapshot();
        assert_eq!(policy.statement.len(), 1);
        assert_eq!(
            policy.statement[0].sid.as_deref(),
            Some("AllowSSLRequestsOnly")
        );
    }

    #[tokio::test]
    async fn test_sync_propagates_write_failure() {
        let mut store = MemoryStore::new(existing_policy());
        store.fail_put = true;
        let owner = StatementOwner::new("111122223333", "web");

        let err = sync_with_store(&store, &owner, &event("update", &["E1"]))
            .await
            .expect_err("put should fail");

        assert!(matches!(err, XaPolicyError::Aws(AwsError::S3Error(_))));
        assert_eq!(store.snapshot(), existing_policy());
    }
}
