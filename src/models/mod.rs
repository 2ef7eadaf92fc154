//! Data models for the check-in dashboard.
//!
//! Wire shapes use camelCase to match the upstream check-in API and the dashboard client.

mod claim;
mod criteria;
mod record;

pub use claim::*;
pub use criteria::*;
pub use record::*;
