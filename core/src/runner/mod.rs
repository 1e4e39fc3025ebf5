pub mod exit;
mod guard;
mod process;
mod traits;
mod types;

pub use guard::IterationDataGuard;
pub use process::{run_process, ProcessOutput, ProcessSpec, ProcessToolRunner};
pub use traits::{CommandPlanner, ToolRunner};
pub use types::{CommandPlan, RunOutcome, Termination};
