//! Owned-statement reconciliation (pure, no I/O)

use super::ownership::StatementOwner;
use crate::types::{ActionType, ManagerEvent, PolicyDocument, Statement};
use serde_json::json;

const CLOUDFRONT_SERVICE_PRINCIPAL: &str = "cloudfront.amazonaws.com";

/// Counts describing what a reconcile pass changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub removed: usize,
    pub added: usize,
}

/// Build the statement letting one CloudFront distribution use `resource`.
pub fn build_cloudfront_statement(
    owner: &StatementOwner,
    distribution_id: &str,
    actions: &[String],
    resource: &str,
) -> Statement {
    Statement {
        sid: Some(owner.sid_for(distribution_id)),
        effect: Some("Allow".to_string()),
        principal: Some(json!({ "Service": CLOUDFRONT_SERVICE_PRINCIPAL })),
        action: Some(ActionType::Multiple(actions.to_vec())),
        resource: Some(ActionType::Single(resource.to_string())),
        condition: Some(json!({
            "StringEquals": {
                "AWS:SourceArn": owner.distribution_arn(distribution_id)
            }
        })),
        extra: serde_json::Map::new(),
    }
}

/// Drop every statement `owner` wrote earlier, then re-add one statement per accessor
/// unless the event is a deletion.
///
/// Foreign statements keep their relative order. New statements are appended in ascending
/// distribution-id order, so applying the same event twice yields the same document.
pub fn reconcile(
    policy: &mut PolicyDocument,
    owner: &StatementOwner,
    resource: &str,
    event: &ManagerEvent,
) -> ReconcileReport {
    let before = policy.statement.len();
    policy.statement.retain(|statement| !owner.owns(statement));
    let removed = before - policy.statement.len();

    let mut added = 0;
    if !event.operation.is_delete() {
        for (distribution_id, actions) in &event.cloudfront_accessors {
            policy.statement.push(build_cloudfront_statement(
                owner,
                distribution_id,
                actions,
                resource,
            ));
            added += 1;
        }
    }

    ReconcileReport { removed, added }
}
