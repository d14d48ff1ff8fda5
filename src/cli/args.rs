//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `compile`: Compile every page query and write the generated artifacts
//! - `check`: Compile without writing and report unsupported query tags
//! - `extract`: Print the page queries a single file exports
//! - `watch`: Recompile and re-run affected pages as sources change
//! - `init`: Initialize pagequery configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pagequery", author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Compile(cmd)) => cmd.common.verbose,
            Some(Command::Check(cmd)) => cmd.common.verbose,
            Some(Command::Extract(cmd)) => cmd.common.verbose,
            Some(Command::Watch(cmd)) => cmd.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Project root; the config file is searched from here upwards
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Source code root directory (overrides config file)
    #[arg(long)]
    pub source_root: Option<String>,

    /// Schema definition file (overrides config file)
    #[arg(long)]
    pub schema: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct CompileCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Print the compiled queries as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CheckCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct ExtractCommand {
    /// Component file to extract page queries from
    pub file: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct WatchCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile every page query and write generated artifacts
    Compile(CompileCommand),
    /// Validate page queries and report unsupported query tags
    Check(CheckCommand),
    /// Print the compiled page queries exported by one file
    Extract(ExtractCommand),
    /// Watch sources and re-run pages whose query changed
    Watch(WatchCommand),
    /// Initialize a new .pagequeryrc.json configuration file
    Init,
}
