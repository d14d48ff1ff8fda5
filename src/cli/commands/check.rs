use std::{fs, path::Path, sync::Arc};

use anyhow::Result;
use rayon::prelude::*;

use super::{
    super::{
        args::CheckCommand,
        exit_status::ExitStatus,
        report::{self, Problem},
    },
    CommandContext,
};
use crate::core::{
    CompileQueries, file_scanner::scan_files, parsers::jsx::parse_jsx_source,
    rewrite::rewrite_module,
};

/// Compile without writing artifacts, then run the tag rewriter over every
/// file using the tag to surface patterns the build would reject.
pub fn check(cmd: CheckCommand) -> Result<ExitStatus> {
    let ctx = CommandContext::new(&cmd.common)?;
    let compiler = ctx.compiler();

    let mut problems = Vec::new();
    let mut query_count = 0;
    match compiler.compile_all() {
        Ok(compiled) => query_count = compiled.values().map(Vec::len).sum(),
        Err(err) => match Problem::from_compile_error(&err) {
            Some(found) => problems.extend(found),
            None => return Err(err.into()),
        },
    }

    let files = scan_files(compiler.base_dir(), compiler.filter())?;
    let tag = &ctx.config.tag_name;
    problems.extend(
        files
            .par_iter()
            .filter_map(|path| check_file(path, tag))
            .collect::<Vec<_>>(),
    );
    problems.sort();
    problems.dedup();

    if problems.is_empty() {
        report::print_success(files.len(), query_count);
    } else {
        report::report(&problems, &ctx.root);
    }
    Ok(ExitStatus::from_problem_count(problems.len()))
}

fn check_file(path: &Path, tag: &str) -> Option<Problem> {
    let code = match fs::read_to_string(path) {
        Ok(code) => code,
        Err(err) => return Some(Problem::parse_error(path, err.to_string())),
    };
    if !code.contains(tag) {
        return None;
    }
    let mut parsed = match parse_jsx_source(code, path, Arc::default()) {
        Ok(parsed) => parsed,
        Err(err) => return Some(Problem::parse_error(path, err.to_string())),
    };
    rewrite_module(&mut parsed.module, tag)
        .err()
        .map(|err| Problem::unsupported_tag(path, &err))
}
