//! S3 bucket policy store

use crate::aws::policy_store::{parse_policy, serialize_policy, PolicyStore};
use crate::aws::{AwsError, AwsResult};
use crate::types::PolicyDocument;
use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::Client as S3Client;
use log::{error, info};

/// Error code S3 returns when a bucket has no policy attached.
const NO_SUCH_BUCKET_POLICY: &str = "NoSuchBucketPolicy";

pub struct S3BucketPolicyStore {
    client: S3Client,
    bucket: String,
}

impl S3BucketPolicyStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

/// Object ARN pattern covering every key in `bucket`.
pub fn bucket_objects_arn(bucket: &str) -> String {
    format!("arn:aws:s3:::{bucket}/*")
}

fn is_missing_policy(code: Option<&str>) -> bool {
    code == Some(NO_SUCH_BUCKET_POLICY)
}

#[async_trait]
impl PolicyStore for S3BucketPolicyStore {
    fn target_name(&self) -> &str {
        &self.bucket
    }

    fn statement_resource(&self) -> String {
        bucket_objects_arn(&self.bucket)
    }

    async fn get_policy(&self) -> AwsResult<PolicyDocument> {
        let response = match self
            .client
            .get_bucket_policy()
            .bucket(&self.bucket)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if is_missing_policy(e.code()) => {
                info!(
                    "No bucket policy found for {}, starting fresh.",
                    self.bucket
                );
                return Ok(PolicyDocument::empty());
            }
            Err(e) => {
                error!("Failed to get bucket policy: {}", DisplayErrorContext(&e));
                return Err(AwsError::S3Error(format!(
                    "Failed to get bucket policy for '{}': {}",
                    self.bucket,
                    DisplayErrorContext(&e)
                )));
            }
        };

        match response.policy() {
            Some(raw) => parse_policy(raw),
            None => Ok(PolicyDocument::empty()),
        }
    }

    async fn put_policy(&self, policy: &PolicyDocument) -> AwsResult<()> {
        let policy_json = serialize_policy(policy)?;
        self.client
            .put_bucket_policy()
            .bucket(&self.bucket)
            .policy(policy_json)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to update bucket policy: {}", DisplayErrorContext(&e));
                AwsError::S3Error(format!(
                    "Failed to put bucket policy for '{}': {}",
                    self.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;
        info!("Successfully updated bucket policy");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_objects_arn() {
        assert_eq!(bucket_objects_arn("assets"), "arn:aws:s3:::assets/*");
    }

    #[test]
    fn test_missing_policy_code() {
        assert!(is_missing_policy(Some("NoSuchBucketPolicy")));
        assert!(!is_missing_policy(Some("AccessDenied")));
        assert!(!is_missing_policy(None));
    }
}
