//! Extraction of named variables from one container into a new one.
//!
//! The pipeline runs strictly in this order:
//!
//! 1. [`metadata::collect`] resolves the requested names and the dimensions they use. An unknown
//!    name stops the run before the output container exists.
//! 2. [`schema::replicate`] creates the output dimensions and variables.
//! 3. [`transfer::transfer_variable`] copies each variable page by page, as planned by the
//!    [`planner::ChunkPlanner`], holding one page buffer at a time.
//!
//! [`run`] drives the whole pipeline for an [`ExtractConfig`]. [`extract`] runs steps 1-3 on
//! containers the caller already holds.
use std::path::PathBuf;

use compact_str::CompactString;

use crate::{
    consts,
    container::{Container, ContainerError},
    dtype::DataType,
    memory::{MemoryProbe, NoopMemoryProbe, SystemMemoryProbe},
    variable::array::error::ArrayValidationError,
};

pub mod metadata;
pub mod planner;
pub mod schema;
pub mod transfer;

use metadata::ExtractionSet;
use planner::{ChunkPlanner, PlanError};
use transfer::TransferOutcome;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("cannot open input container '{}': {source}", path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: ContainerError,
    },

    #[error("cannot create output container '{}': {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: ContainerError,
    },

    #[error("variable '{0}' not found in input container")]
    UnknownVariable(CompactString),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Array(#[from] ArrayValidationError),
}

/// Settings of one extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Variables to extract, in output order. Empty produces an output without variables.
    pub variables: Vec<CompactString>,
    /// Upper bound in bytes for one page buffer.
    pub page_budget: u64,
    /// Compare the page budget with the available system memory.
    pub memory_check: bool,
}

impl ExtractConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            variables: Vec::new(),
            page_budget: consts::DEFAULT_PAGE_BUDGET,
            memory_check: true,
        }
    }

    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.variables = variables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_page_budget(mut self, page_budget: u64) -> Self {
        self.page_budget = page_budget;
        self
    }

    pub fn with_memory_check(mut self, memory_check: bool) -> Self {
        self.memory_check = memory_check;
        self
    }

    fn planner(&self) -> Result<ChunkPlanner, PlanError> {
        let probe: Box<dyn MemoryProbe> = if self.memory_check {
            Box::new(SystemMemoryProbe::new())
        } else {
            Box::new(NoopMemoryProbe)
        };
        Ok(ChunkPlanner::new(self.page_budget)?.with_probe(probe))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReport {
    pub name: CompactString,
    pub data_type: DataType,
    pub outcome: TransferOutcome,
}

/// Summary of an extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub variables: Vec<VariableReport>,
}

impl ExtractReport {
    /// Names of variables whose data was not copied.
    pub fn skipped(&self) -> impl Iterator<Item = &str> + '_ {
        self.variables
            .iter()
            .filter(|v| v.outcome == TransferOutcome::Skipped)
            .map(|v| v.name.as_str())
    }

    pub fn bytes_copied(&self) -> u64 {
        self.variables
            .iter()
            .map(|v| match v.outcome {
                TransferOutcome::Copied { bytes, .. } => bytes,
                TransferOutcome::Skipped => 0,
            })
            .sum()
    }
}

/// Extract `variables` from `input` into the empty container `output`.
///
/// `output` is left open; the caller closes it.
pub fn extract(
    input: &Container,
    output: &mut Container,
    variables: &[CompactString],
    planner: &ChunkPlanner,
) -> Result<ExtractReport, ExtractError> {
    let set = metadata::collect(input, variables)?;
    copy_set(input, &set, output, planner)
}

fn copy_set(
    input: &Container,
    set: &ExtractionSet,
    output: &mut Container,
    planner: &ChunkPlanner,
) -> Result<ExtractReport, ExtractError> {
    let targets = schema::replicate(input, set, output)?;

    let mut report = ExtractReport::default();
    for (var, &target) in set.variables.iter().zip(&targets) {
        let outcome = transfer::transfer_variable(input, var.id, output, target, planner)?;
        report.variables.push(VariableReport {
            name: var.name.clone(),
            data_type: var.data_type,
            outcome,
        });
    }
    Ok(report)
}

/// Run a whole extraction from `config.input` to `config.output`.
///
/// The output file is only created once every requested variable has been found. Once created it
/// is closed on every path, including failed transfers.
pub fn run(config: &ExtractConfig) -> Result<ExtractReport, ExtractError> {
    let planner = config.planner()?;

    if config.variables.is_empty() {
        tracing::debug!("no variables requested, the output container will have no variables");
    }

    let input = Container::open(&config.input).map_err(|source| ExtractError::OpenInput {
        path: config.input.clone(),
        source,
    })?;
    let set = metadata::collect(&input, &config.variables)?;

    let mut output =
        Container::create(&config.output).map_err(|source| ExtractError::CreateOutput {
            path: config.output.clone(),
            source,
        })?;
    let copied = copy_set(&input, &set, &mut output, &planner);
    let closed = output.close();

    let report = copied?;
    closed?;

    let skipped: Vec<&str> = report.skipped().collect();
    if !skipped.is_empty() {
        tracing::warn!(?skipped, "some variables were created without data");
    }
    tracing::info!(
        variables = report.variables.len(),
        bytes = report.bytes_copied(),
        output = %config.output.display(),
        "extraction finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{io::MemIOProvider, variable::array::Array};

    #[test]
    fn config_defaults() {
        let config = ExtractConfig::new("in.atlas", "out.atlas");
        assert_eq!(config.page_budget, consts::DEFAULT_PAGE_BUDGET);
        assert!(config.memory_check);
        assert!(config.variables.is_empty());
    }

    #[test]
    fn memory_check_off_never_flags_budget() {
        let planner = ExtractConfig::new("in.atlas", "out.atlas")
            .with_page_budget(u64::MAX)
            .with_memory_check(false)
            .planner()
            .unwrap();
        let plan = planner.plan(&[16], 8).unwrap();
        assert!(!plan.budget_exceeds_available());
    }

    #[test]
    fn zero_budget_fails_before_touching_files() {
        let config = ExtractConfig::new("/nonexistent/in", "/nonexistent/out").with_page_budget(0);
        assert!(matches!(
            run(&config),
            Err(ExtractError::Plan(PlanError::ZeroBudget))
        ));
    }

    #[test]
    fn missing_input_names_the_file() {
        let config = ExtractConfig::new("/nonexistent/in.atlas", "/nonexistent/out.atlas")
            .with_memory_check(false);
        let err = run(&config).unwrap_err();
        assert!(matches!(err, ExtractError::OpenInput { .. }));
        assert!(err.to_string().contains("/nonexistent/in.atlas"));
    }

    #[test]
    fn in_memory_extract_reports_each_variable() {
        let mut input = Container::create_with_provider(MemIOProvider::new()).unwrap();
        let x = input.add_dimension("x", 4).unwrap();
        let a = input.add_variable("a", DataType::F32, &[x]).unwrap();
        input.add_variable("b", DataType::U16, &[x]).unwrap();
        let values = Array::<f32>::try_from_shape_and_vec(&[4], vec![0.5, 1.5, 2.5, 3.5]).unwrap();
        input.write_array(a, &[0], &values).unwrap();

        let mut output = Container::create_with_provider(MemIOProvider::new()).unwrap();
        let planner = ChunkPlanner::new(8).unwrap();
        let report = extract(&input, &mut output, &["a".into(), "b".into()], &planner).unwrap();

        assert_eq!(
            report.variables[0].outcome,
            TransferOutcome::Copied { pages: 2, bytes: 16 }
        );
        assert_eq!(report.skipped().collect::<Vec<_>>(), ["b"]);
        assert_eq!(report.bytes_copied(), 16);

        let out_a = output.find_variable("a").unwrap();
        assert_eq!(output.read_array::<f32>(out_a).unwrap(), values);
    }
}
