//! Deployment-side registry of CloudFront accessors
//!
//! Callers register which distributions need access to which cross-account target, then
//! consume the registrations once to build the payload passed to a manager run. After a
//! target has been consumed no further registrations are accepted for it.

use crate::error::{XaPolicyError, XaPolicyResult};
use crate::types::{CloudfrontAccessors, ManagerKind};
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub const KMS_DEFAULT_ACTIONS: &[&str] = &[
    "kms:Decrypt",
    "kms:Encrypt",
    "kms:GenerateDataKey*",
    "kms:DescribeKey",
];

pub const S3_DEFAULT_ACTIONS: &[&str] = &["s3:GetObject"];

impl ManagerKind {
    /// Actions granted when a registration does not name any.
    pub fn default_actions(self) -> Vec<String> {
        let defaults = match self {
            Self::Kms => KMS_DEFAULT_ACTIONS,
            Self::S3 => S3_DEFAULT_ACTIONS,
        };
        defaults.iter().map(|a| (*a).to_string()).collect()
    }
}

/// ARN of the management role living in the target's account.
pub fn management_role_arn(xa_aws_id: &str, resource_id: &str) -> String {
    format!("arn:aws:iam::{xa_aws_id}:role/{resource_id}-xa-mgmt")
}

/// Name of the execution role the manager runs under in the accessor's account.
pub fn execution_role_name(resource_id: &str) -> String {
    format!("{resource_id}-xa-mgmt-ex")
}

type TargetKey = (ManagerKind, String);

#[derive(Debug, Default)]
pub struct AccessorRegistry {
    accessors: BTreeMap<TargetKey, CloudfrontAccessors>,
    consumed: HashSet<TargetKey>,
}

impl AccessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `distribution_id` as needing `actions` (or the kind's defaults) on `target`.
    pub fn register(
        &mut self,
        kind: ManagerKind,
        target: &str,
        distribution_id: &str,
        actions: Option<Vec<String>>,
    ) -> XaPolicyResult<()> {
        let key = (kind, target.to_string());
        if self.consumed.contains(&key) {
            return Err(XaPolicyError::registry(format!(
                "Cannot register resources for {target} manager after creation \
                 (registering {distribution_id})."
            )));
        }

        let entries = self.accessors.entry(key).or_default();
        if entries.contains_key(distribution_id) {
            return Err(XaPolicyError::registry(format!(
                "Distribution {distribution_id} has already been registered for {target} manager."
            )));
        }

        let actions: BTreeSet<String> = actions
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| kind.default_actions())
            .into_iter()
            .collect();
        entries.insert(distribution_id.to_string(), actions.into_iter().collect());
        Ok(())
    }

    /// Take the accessors registered for `target` and seal it against further registration.
    pub fn consume(
        &mut self,
        kind: ManagerKind,
        target: &str,
    ) -> XaPolicyResult<CloudfrontAccessors> {
        let key = (kind, target.to_string());
        if !self.consumed.insert(key.clone()) {
            return Err(XaPolicyError::registry(format!(
                "Manager for {target} has already been consumed."
            )));
        }
        Ok(self.accessors.remove(&key).unwrap_or_default())
    }
}
