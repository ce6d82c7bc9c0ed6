/// Application Services
///
/// Pool-facing workflows of the hook.
///
/// - `crossing`: post-swap boundary scan, crossing cap and resume
/// - `execution`: unlock round trip that swaps a bucket against the pool

pub mod crossing;
pub mod execution;

pub use crossing::TriggerReport;
pub use execution::ExecutionRecord;
