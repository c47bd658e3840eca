//! Runtime configuration for a manager run

use crate::policy::StatementOwner;

/// LocalStack edge endpoint used when `local` is enabled.
pub const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";
pub const LOCALSTACK_REGION: &str = "ap-northeast-1";

/// Identifiers a manager needs, normally supplied through the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Management role in the target account (`XA_MGMT_ROLE_ARN`).
    pub role_arn: String,
    /// KMS key id or S3 bucket name whose policy is managed.
    pub resource_id: String,
    /// Account the CloudFront distributions live in (`ACCESSOR_AWS_ID`).
    pub accessor_aws_id: String,
    /// Stack that owns the generated statements (`ACCESSOR_STACK_NAME`).
    pub accessor_stack_name: String,
    /// Route every call to LocalStack with static test credentials.
    pub local: bool,
}

impl ManagerConfig {
    pub fn owner(&self) -> StatementOwner {
        StatementOwner::new(&self.accessor_aws_id, &self.accessor_stack_name)
    }
}
