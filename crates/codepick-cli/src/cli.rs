use std::path::PathBuf;

use clap::{Parser, Subcommand};
use codepick_app::CodeSpec;

#[derive(Debug, Parser)]
#[command(name = "codepick")]
#[command(bin_name = "codepick")]
#[command(version)]
#[command(about = "Select, review and submit billing codes for a clinical report")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Write a diagnostics log under ~/.config/codepick/diagnostics
    #[arg(long, global = true)]
    pub diagnostics: bool,

    /// Report to review in the interactive screen
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Generate code suggestions for a report and print them")]
    Suggest {
        #[arg(long, value_name = "FILE")]
        report: PathBuf,
    },
    #[command(about = "Search the code catalog")]
    Search {
        /// Free-text query; empty lists the head of the catalog
        #[arg(default_value = "")]
        query: String,
    },
    #[command(about = "Submit an explicit selection of codes for a report")]
    Submit {
        #[arg(long, value_name = "FILE")]
        report: PathBuf,
        /// Code to submit, optionally with a quantity
        #[arg(long = "code", value_name = "CODE[:QTY]", required = true)]
        codes: Vec<CodeSpec>,
    },
    #[command(about = "Run environment and configuration checks")]
    Doctor,
}
