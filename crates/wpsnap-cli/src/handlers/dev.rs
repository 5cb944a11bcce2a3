//! Developer-workflow command handler.

use wpsnap_runtime::TaskRunner;

use crate::commands::DevCmd;
use crate::error::CliError;

/// Execute one dev target.
pub async fn execute(cmd: DevCmd) -> Result<(), CliError> {
    let runner = TaskRunner::from_env(cmd.src_dir, cmd.requirements_in, cmd.output);
    runner.run(cmd.target.into()).await?;

    Ok(())
}
