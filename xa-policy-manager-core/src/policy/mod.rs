//! Policy rewriting: ownership rules and the reconcile pass

pub mod ownership;
pub mod reconcile;

pub use ownership::StatementOwner;
pub use reconcile::{build_cloudfront_statement, reconcile, ReconcileReport};
