//! 분봉 동기화.

mod reconciler;
mod report;

pub use reconciler::SyncReconciler;
pub use report::SyncReport;
