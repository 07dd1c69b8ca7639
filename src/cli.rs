//! Command line parsing.
use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser};
use compact_str::CompactString;

use crate::{consts, extract::ExtractConfig};

#[derive(Debug, Parser)]
#[command(name = "atlas-extract")]
#[command(
    version = consts::VERSION,
    about = "Extract variables from an atlas container into a new container",
    long_about = None,
    disable_help_flag = true,
    args_override_self = true
)]
pub struct Cli {
    /// Print usage and exit
    #[arg(short = 'h', long = "help", action = ArgAction::SetTrue)]
    pub help: bool,

    /// Comma separated variables to extract
    #[arg(short = 'v', value_name = "VAR1[,VAR2,...]")]
    pub variables: Option<String>,

    /// Upper bound in bytes for one page buffer
    #[arg(
        long = "page-size",
        value_name = "BYTES",
        env = consts::PAGE_SIZE_ENV,
        default_value_t = consts::DEFAULT_PAGE_BUDGET,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub page_size: u64,

    /// Do not compare the page size with the available system memory
    #[arg(long = "no-memory-check")]
    pub no_memory_check: bool,

    #[arg(value_name = "INFILE")]
    pub input: Option<PathBuf>,

    #[arg(value_name = "OUTFILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("help requested")]
    HelpRequested,

    #[error("missing input file")]
    MissingInput,

    #[error("missing output file")]
    MissingOutput,

    #[error("-v needs at least one variable name")]
    EmptyVariableList,
}

impl Cli {
    /// Validate the parsed arguments into an [`ExtractConfig`].
    pub fn into_config(self) -> Result<ExtractConfig, UsageError> {
        if self.help {
            return Err(UsageError::HelpRequested);
        }
        let input = self.input.ok_or(UsageError::MissingInput)?;
        let output = self.output.ok_or(UsageError::MissingOutput)?;

        let variables = match self.variables.as_deref() {
            Some(list) => {
                let names = parse_variable_list(list);
                if names.is_empty() {
                    return Err(UsageError::EmptyVariableList);
                }
                names
            }
            None => Vec::new(),
        };

        Ok(ExtractConfig::new(input, output)
            .with_variables(variables)
            .with_page_budget(self.page_size)
            .with_memory_check(!self.no_memory_check))
    }
}

/// Split a `-v` argument on commas, dropping empty names.
pub fn parse_variable_list(list: &str) -> Vec<CompactString> {
    list.split(',')
        .filter(|name| !name.is_empty())
        .map(CompactString::from)
        .collect()
}

/// Full usage text.
pub fn usage() -> String {
    Cli::command().render_help().to_string()
}
