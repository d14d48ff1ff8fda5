use anyhow::{Context, Result};

use super::{
    super::{
        args::CompileCommand,
        exit_status::ExitStatus,
        report::{self, Problem},
    },
    CommandContext,
};
use crate::core::{
    CompileError, CompileQueries,
    artifacts::{ArtifactWriter, FsArtifactWriter},
};

pub fn compile(cmd: CompileCommand) -> Result<ExitStatus> {
    let ctx = CommandContext::new(&cmd.common)?;

    let compiled = match ctx.compiler().compile_all() {
        Ok(compiled) => compiled,
        Err(err) => return report_failure(err, &ctx),
    };

    let written = FsArtifactWriter::new(&ctx.config.generated_extension)
        .write_all(&compiled)
        .context("Failed to write generated artifacts")?;

    if cmd.json {
        let queries: Vec<_> = compiled.values().flatten().collect();
        println!("{}", serde_json::to_string_pretty(&queries)?);
    } else {
        report::print_compiled(&compiled, &ctx.root, written);
    }
    Ok(ExitStatus::Success)
}

/// Report query problems, or abort on failures that are not about the queries.
fn report_failure(err: CompileError, ctx: &CommandContext) -> Result<ExitStatus> {
    match Problem::from_compile_error(&err) {
        Some(problems) => {
            report::report(&problems, &ctx.root);
            Ok(ExitStatus::from_problem_count(problems.len()))
        }
        None => Err(err.into()),
    }
}
