//! Resolution of requested variable names against the input container.
use compact_str::CompactString;
use smallvec::SmallVec;

use crate::{
    container::Container,
    dtype::DataType,
    extract::ExtractError,
    header::{DimensionId, VariableId},
};

/// A requested variable found in the input container.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVariable {
    pub id: VariableId,
    pub name: CompactString,
    pub data_type: DataType,
    pub dimensions: SmallVec<[DimensionId; 4]>,
}

/// Everything the output container needs: the variables in request order and the distinct
/// dimensions they use, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionSet {
    pub variables: Vec<ResolvedVariable>,
    pub dimensions: Vec<DimensionId>,
}

impl ExtractionSet {
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Resolve `requested` names in `input`.
///
/// Fails on the first name the input does not define. Repeated names are kept once.
pub fn collect(
    input: &Container,
    requested: &[CompactString],
) -> Result<ExtractionSet, ExtractError> {
    let mut set = ExtractionSet::default();
    let mut dimension_names: Vec<&str> = Vec::new();

    for name in requested {
        if set.variables.iter().any(|v| v.name == *name) {
            tracing::warn!(variable = %name, "variable requested more than once, extracting it once");
            continue;
        }

        let id = input
            .find_variable(name)
            .ok_or_else(|| ExtractError::UnknownVariable(name.clone()))?;
        let var = input.variable(id)?;

        for &dim in &var.dimensions {
            let dim_name = input.dimension(dim)?.name.as_str();
            if !dimension_names.contains(&dim_name) {
                dimension_names.push(dim_name);
                set.dimensions.push(dim);
            }
        }

        set.variables.push(ResolvedVariable {
            id,
            name: var.name.clone(),
            data_type: var.data_type,
            dimensions: var.dimensions.clone(),
        });
    }

    tracing::debug!(
        variables = set.variables.len(),
        dimensions = set.dimensions.len(),
        "resolved requested variables"
    );
    Ok(set)
}
