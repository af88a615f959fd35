pub mod queue;
pub mod serve;

pub use queue::{run_approve, run_deny, run_pending};
pub use serve::run_serve;
