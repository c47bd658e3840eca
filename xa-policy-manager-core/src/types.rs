//! Policy document model and invocation payload types

use crate::error::{XaPolicyError, XaPolicyResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// IAM policy language version written into fresh documents.
pub const POLICY_VERSION: &str = "2012-10-17";

/// A resource-based policy document (KMS key policy or S3 bucket policy).
///
/// `Statement` is accepted as a single object or an array and always written back as an
/// array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version", skip_serializing_if = "Option::is_none", default)]
    pub version: Option<String>,
    #[serde(rename = "Id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    #[serde(
        rename = "Statement",
        default,
        deserialize_with = "deserialize_statements"
    )]
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    /// An empty document, used when a bucket has no policy yet.
    pub fn empty() -> Self {
        Self {
            version: Some(POLICY_VERSION.to_string()),
            id: None,
            statement: Vec::new(),
        }
    }
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::empty()
    }
}

fn deserialize_statements<'de, D>(deserializer: D) -> Result<Vec<Statement>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Statement>),
        One(Box<Statement>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(statement) => vec![*statement],
        OneOrMany::Many(statements) => statements,
    })
}

/// A single policy statement.
///
/// Only the keys this crate generates are typed; anything else (`NotAction`,
/// `NotPrincipal`, ...) is kept in `extra` so foreign statements survive a rewrite.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Sid", skip_serializing_if = "Option::is_none", default)]
    pub sid: Option<String>,
    #[serde(rename = "Effect", skip_serializing_if = "Option::is_none", default)]
    pub effect: Option<String>,
    #[serde(rename = "Principal", skip_serializing_if = "Option::is_none", default)]
    pub principal: Option<Value>,
    #[serde(rename = "Action", skip_serializing_if = "Option::is_none", default)]
    pub action: Option<ActionType>,
    #[serde(rename = "Resource", skip_serializing_if = "Option::is_none", default)]
    pub resource: Option<ActionType>,
    #[serde(rename = "Condition", skip_serializing_if = "Option::is_none", default)]
    pub condition: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A policy element that may be written as one string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionType {
    Single(String),
    Multiple(Vec<String>),
}

/// Lifecycle operation carried by an invocation.
///
/// Only `delete` changes behavior; any other value keeps its text for session naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Other(String),
}

impl Operation {
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Operation {
    fn from(value: String) -> Self {
        match value.as_str() {
            "create" => Self::Create,
            "update" => Self::Update,
            "delete" => Self::Delete,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Operation {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Operation> for String {
    fn from(value: Operation) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of cross-account resource a manager rewrites the policy of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ManagerKind {
    Kms,
    S3,
}

impl fmt::Display for ManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kms => f.write_str("kms"),
            Self::S3 => f.write_str("s3"),
        }
    }
}

/// CloudFront distribution id -> actions it needs on the target.
///
/// A `BTreeMap` so iteration is always in ascending distribution-id order.
pub type CloudfrontAccessors = BTreeMap<String, Vec<String>>;

/// Invocation payload for a manager run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerEvent {
    pub operation: Operation,
    #[serde(default)]
    pub cloudfront_accessors: CloudfrontAccessors,
}

impl ManagerEvent {
    pub fn new(operation: impl Into<Operation>, cloudfront_accessors: CloudfrontAccessors) -> Self {
        Self {
            operation: operation.into(),
            cloudfront_accessors,
        }
    }

    /// Parse an invocation payload from its JSON text.
    pub fn from_json(raw: &str) -> XaPolicyResult<Self> {
        serde_json::from_str(raw).map_err(|e| XaPolicyError::invalid_event(e.to_string()))
    }

    /// Sorted distribution ids carried by this event.
    pub fn distribution_ids(&self) -> Vec<&str> {
        self.cloudfront_accessors.keys().map(String::as_str).collect()
    }
}

/// Summary of one synchronization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub target: String,
    pub operation: Operation,
    pub removed: usize,
    pub added: usize,
    pub statement_count: usize,
}
