//! AWS SDK integration: role assumption and the KMS / S3 policy stores.

pub mod kms_client;
pub mod policy_store;
pub mod s3_client;
pub mod sts;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("STS error: {0}")]
    StsError(String),
    #[error("KMS error: {0}")]
    KmsError(String),
    #[error("S3 error: {0}")]
    S3Error(String),
    #[error("Policy document error: {0}")]
    PolicyError(String),
}

pub type AwsResult<T> = Result<T, AwsError>;
