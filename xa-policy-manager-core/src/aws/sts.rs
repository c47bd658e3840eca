//! STS helpers for cross-account role assumption

use crate::aws::{AwsError, AwsResult};
use aws_config::SdkConfig;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::Client as StsClient;
use log::{error, info};
use std::time::SystemTime;

/// STS rejects session names longer than this.
const MAX_SESSION_NAME_LEN: usize = 64;

/// Build the role session name for a manager run: `{resource_id}-policy-{operation}`.
///
/// Characters STS does not accept are replaced with `-` and the result is cut to the STS
/// length limit.
pub fn role_session_name(resource_id: &str, operation: &str) -> String {
    format!("{resource_id}-policy-{operation}")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "_+=,.@-".contains(c) {
                c
            } else {
                '-'
            }
        })
        .take(MAX_SESSION_NAME_LEN)
        .collect()
}

/// Assume the cross-account management role and return an SDK configuration that signs
/// with the temporary credentials.
///
/// Everything else (region, endpoint override) is inherited from `base`.
pub async fn assume_management_role(
    client: &StsClient,
    base: &SdkConfig,
    role_arn: &str,
    session_name: &str,
) -> AwsResult<SdkConfig> {
    info!("assuming role: {role_arn}");
    let out = client
        .assume_role()
        .role_arn(role_arn)
        .role_session_name(session_name)
        .send()
        .await
        .map_err(|e| {
            error!("Failed to assume role '{role_arn}': {}", DisplayErrorContext(&e));
            AwsError::StsError(format!(
                "Failed to assume role '{role_arn}': {}",
                DisplayErrorContext(&e)
            ))
        })?;

    let creds = out
        .credentials()
        .ok_or_else(|| AwsError::StsError("STS AssumeRole missing Credentials".to_string()))?;

    let credentials = Credentials::new(
        creds.access_key_id(),
        creds.secret_access_key(),
        Some(creds.session_token().to_string()),
        SystemTime::try_from(creds.expiration().to_owned()).ok(),
        "xa-mgmt-role",
    );

    Ok(base
        .to_builder()
        .credentials_provider(SharedCredentialsProvider::new(credentials))
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_name_format() {
        assert_eq!(
            role_session_name("1234abcd-12ab-34cd-56ef-1234567890ab", "create"),
            "1234abcd-12ab-34cd-56ef-1234567890ab-policy-create"
        );
    }

    #[test]
    fn test_session_name_is_truncated() {
        let bucket = "a".repeat(63);
        let name = role_session_name(&bucket, "update");
        assert_eq!(name.len(), MAX_SESSION_NAME_LEN);
        assert!(name.starts_with(&bucket));
    }

    #[test]
    fn test_session_name_replaces_invalid_chars() {
        assert_eq!(role_session_name("my bucket", "re/sync"), "my-bucket-policy-re-sync");
    }
}
