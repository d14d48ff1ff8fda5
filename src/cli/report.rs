//! Report formatting and printing utilities.
//!
//! Problems are printed in cargo style. Kept separate from the core so the
//! pipeline can be used as a library.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use colored::Colorize;

use crate::core::{CompileError, CompiledQueries, TagError};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

const PARSE_ERROR_RULE: &str = "parse-error";
const UNSUPPORTED_TAG_RULE: &str = "unsupported-tag";

/// One reportable query problem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Problem {
    pub path: PathBuf,
    /// Line and column inside the query text.
    pub location: Option<(usize, usize)>,
    pub rule: String,
    pub message: String,
}

impl Problem {
    pub fn unsupported_tag(path: &Path, err: &TagError) -> Self {
        Self {
            path: path.to_path_buf(),
            location: None,
            rule: UNSUPPORTED_TAG_RULE.to_string(),
            message: err.to_string(),
        }
    }

    pub fn parse_error(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            location: None,
            rule: PARSE_ERROR_RULE.to_string(),
            message: message.into(),
        }
    }

    /// Problems carried by a failed compile pass.
    ///
    /// `None` for failures that are not about the queries themselves (schema,
    /// I/O); those abort the command instead.
    pub fn from_compile_error(err: &CompileError) -> Option<Vec<Self>> {
        match err {
            CompileError::Validation { path, violations } => Some(
                violations
                    .iter()
                    .map(|violation| Self {
                        path: path.clone(),
                        location: violation.location,
                        rule: violation.rule.to_string(),
                        message: violation.message.clone(),
                    })
                    .collect(),
            ),
            CompileError::Tag { path, source } => Some(vec![Self::unsupported_tag(path, source)]),
            CompileError::Parse { path, message } => Some(vec![Self::parse_error(path, message)]),
            _ => None,
        }
    }
}

/// Print problems to stdout, followed by a summary line.
pub fn report(problems: &[Problem], root: &Path) {
    report_to(problems, root, &mut io::stdout().lock());
}

/// Print problems to a custom writer.
pub fn report_to<W: Write>(problems: &[Problem], root: &Path, writer: &mut W) {
    if problems.is_empty() {
        return;
    }

    let mut sorted = problems.to_vec();
    sorted.sort();

    for problem in &sorted {
        let _ = writeln!(
            writer,
            "{}: \"{}\"  {}",
            "error".bold().red(),
            problem.message,
            problem.rule.dimmed().cyan()
        );
        let _ = writeln!(
            writer,
            "  {} {}",
            "-->".blue(),
            display_path(&problem.path, root)
        );
        if let Some((line, column)) = problem.location {
            let _ = writeln!(
                writer,
                "   {} {} query line {}, column {}",
                "=".blue(),
                "note:".bold(),
                line,
                column
            );
        }
        let _ = writeln!(writer);
    }

    let _ = writeln!(
        writer,
        "{} {} {}",
        FAILURE_MARK.red(),
        sorted.len(),
        if sorted.len() == 1 {
            "problem"
        } else {
            "problems"
        }
        .red()
    );
}

/// Print a success message when no problems are found.
pub fn print_success(source_files: usize, queries: usize) {
    print_success_to(source_files, queries, &mut io::stdout().lock());
}

pub fn print_success_to<W: Write>(source_files: usize, queries: usize, writer: &mut W) {
    let _ = writeln!(
        writer,
        "{} {}",
        SUCCESS_MARK.green(),
        format!(
            "Checked {} {} in {} source {} - no issues found",
            queries,
            if queries == 1 { "query" } else { "queries" },
            source_files,
            if source_files == 1 { "file" } else { "files" }
        )
        .green()
    );
}

/// Print the compiled root queries per file and the artifact count.
pub fn print_compiled(compiled: &CompiledQueries, root: &Path, written: usize) {
    print_compiled_to(compiled, root, written, &mut io::stdout().lock());
}

pub fn print_compiled_to<W: Write>(
    compiled: &CompiledQueries,
    root: &Path,
    written: usize,
    writer: &mut W,
) {
    let mut total = 0;
    for (path, queries) in compiled {
        let _ = writeln!(writer, "{}", display_path(path, root).bold());
        for query in queries {
            let _ = writeln!(writer, "  {} {}", SUCCESS_MARK.green(), query.name);
            total += 1;
        }
    }
    let _ = writeln!(
        writer,
        "{} {}",
        SUCCESS_MARK.green(),
        format!(
            "Compiled {} {}, wrote {} {}",
            total,
            if total == 1 { "query" } else { "queries" },
            written,
            if written == 1 { "artifact" } else { "artifacts" }
        )
        .green()
    );
}

/// `path` relative to `root` when it lives under it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
