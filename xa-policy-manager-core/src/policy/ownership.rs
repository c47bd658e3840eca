//! Statement ownership: which statements this manager may remove and rewrite

use crate::types::Statement;

/// Identity of the stack that owns a set of statements in a foreign policy.
///
/// Statements whose `Sid` starts with `"{account_id} {stack_name} "` belong to this owner.
/// Everything else in the document is left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementOwner {
    account_id: String,
    stack_name: String,
    prefix: String,
}

impl StatementOwner {
    pub fn new(account_id: impl Into<String>, stack_name: impl Into<String>) -> Self {
        let account_id = account_id.into();
        let stack_name = stack_name.into();
        let prefix = format!("{account_id} {stack_name} ");
        Self {
            account_id,
            stack_name,
            prefix,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// Sid prefix, including its trailing space.
    pub fn sid_prefix(&self) -> &str {
        &self.prefix
    }

    pub fn owns(&self, statement: &Statement) -> bool {
        statement
            .sid
            .as_deref()
            .is_some_and(|sid| sid.starts_with(&self.prefix))
    }

    /// Sid for the statement granting `distribution_id` access.
    pub fn sid_for(&self, distribution_id: &str) -> String {
        format!("{}: cf-{distribution_id}", self.prefix)
    }

    /// `AWS:SourceArn` value scoping a grant to one distribution in the owner's account.
    pub fn distribution_arn(&self, distribution_id: &str) -> String {
        format!(
            "arn:aws:cloudfront::{}:distribution/{distribution_id}",
            self.account_id
        )
    }
}
