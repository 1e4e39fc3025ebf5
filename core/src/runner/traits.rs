use async_trait::async_trait;

use crate::context::RunContext;
use crate::error::RunnerError;
use crate::plan::RunDescriptor;

use super::types::{CommandPlan, RunOutcome};

/// Executes one run descriptor.
///
/// Implementations return `Ok` for any run that started, whatever its exit
/// status. `Err` is reserved for runs that could not be started at all.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(
        &self,
        descriptor: &RunDescriptor,
        ctx: &RunContext,
    ) -> Result<RunOutcome, RunnerError>;
}

/// Maps a descriptor onto the external tool's command line.
pub trait CommandPlanner: Send + Sync {
    fn name(&self) -> &str;

    fn plan(&self, descriptor: &RunDescriptor, ctx: &RunContext) -> CommandPlan;
}
