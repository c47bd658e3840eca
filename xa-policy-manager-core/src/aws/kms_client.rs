//! KMS key policy store

use crate::aws::policy_store::{parse_policy, serialize_policy, PolicyStore};
use crate::aws::{AwsError, AwsResult};
use crate::types::PolicyDocument;
use async_trait::async_trait;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::Client as KmsClient;
use log::{error, info};

/// KMS only supports one key policy, always named `default`.
pub const KEY_POLICY_NAME: &str = "default";

pub struct KmsKeyPolicyStore {
    client: KmsClient,
    key_id: String,
}

impl KmsKeyPolicyStore {
    pub fn new(client: KmsClient, key_id: impl Into<String>) -> Self {
        Self {
            client,
            key_id: key_id.into(),
        }
    }
}

#[async_trait]
impl PolicyStore for KmsKeyPolicyStore {
    fn target_name(&self) -> &str {
        &self.key_id
    }

    // A key policy always applies to its own key.
    fn statement_resource(&self) -> String {
        "*".to_string()
    }

    async fn get_policy(&self) -> AwsResult<PolicyDocument> {
        let response = self
            .client
            .get_key_policy()
            .key_id(&self.key_id)
            .policy_name(KEY_POLICY_NAME)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to get key policy: {}", DisplayErrorContext(&e));
                AwsError::KmsError(format!(
                    "Failed to get key policy for '{}': {}",
                    self.key_id,
                    DisplayErrorContext(&e)
                ))
            })?;

        let raw = response.policy().ok_or_else(|| {
            AwsError::KmsError(format!(
                "GetKeyPolicy for '{}' returned no policy",
                self.key_id
            ))
        })?;
        parse_policy(raw)
    }

    async fn put_policy(&self, policy: &PolicyDocument) -> AwsResult<()> {
        let policy_json = serialize_policy(policy)?;
        self.client
            .put_key_policy()
            .key_id(&self.key_id)
            .policy_name(KEY_POLICY_NAME)
            .policy(policy_json)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to update key policy: {}", DisplayErrorContext(&e));
                AwsError::KmsError(format!(
                    "Failed to put key policy for '{}': {}",
                    self.key_id,
                    DisplayErrorContext(&e)
                ))
            })?;
        info!("Successfully updated key policy");
        Ok(())
    }
}
