//! Storage seam for resource policies

use crate::aws::{AwsError, AwsResult};
use crate::types::PolicyDocument;
use async_trait::async_trait;

/// A resource whose policy document can be read and replaced as a whole.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Human-readable identifier of the target (key id, bucket name).
    fn target_name(&self) -> &str;

    /// `Resource` value written into generated statements.
    fn statement_resource(&self) -> String;

    async fn get_policy(&self) -> AwsResult<PolicyDocument>;

    /// Replace the full policy document.
    async fn put_policy(&self, policy: &PolicyDocument) -> AwsResult<()>;
}

pub(crate) fn parse_policy(raw: &str) -> AwsResult<PolicyDocument> {
    serde_json::from_str(raw)
        .map_err(|e| AwsError::PolicyError(format!("Failed to parse policy document JSON: {e}")))
}

pub(crate) fn serialize_policy(policy: &PolicyDocument) -> AwsResult<String> {
    serde_json::to_string(policy)
        .map_err(|e| AwsError::PolicyError(format!("Failed to serialize policy: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy_rejects_garbage() {
        let err = parse_policy("not json").expect_err("should fail");
        assert!(matches!(err, AwsError::PolicyError(_)));
    }

    #[test]
    fn test_policy_json() {
        let json = serialize_policy(&PolicyDocument::empty()).expect("serialize");
        assert_eq!(json, r#"{"Version":"2012-10-17","Statement":[]}"#);
    }
}
