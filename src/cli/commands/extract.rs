use std::fs;

use anyhow::{Context, Result};

use super::{
    super::{args::ExtractCommand, exit_status::ExitStatus},
    CommandContext,
};
use crate::core::extract::extract_file_queries;

/// Print the compiled queries a file exports, keyed by the variable they are
/// assigned to. Requires the artifacts of a previous `compile`.
pub fn extract(cmd: ExtractCommand) -> Result<ExitStatus> {
    let ctx = CommandContext::new(&cmd.common)?;
    let file = fs::canonicalize(&cmd.file)
        .with_context(|| format!("Failed to resolve {:?}", cmd.file))?;

    let queries = extract_file_queries(&file, &ctx.extract_options())?;
    println!("{}", serde_json::to_string_pretty(&queries)?);

    Ok(ExitStatus::Success)
}
