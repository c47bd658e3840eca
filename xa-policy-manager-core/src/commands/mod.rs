//! Commands module - service layer for policy manager runs

pub(crate) mod service;
mod sync;

pub use service::PolicyManagerService;
pub use sync::sync_with_store;
