//! Replication of the extracted schema into the output container.
use std::collections::HashMap;

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::{
    container::{Container, ContainerError},
    extract::metadata::ExtractionSet,
    header::{DimensionId, VariableId},
};

/// Create the dimensions and variables of `set` in `output`.
///
/// Each distinct input dimension becomes one output dimension of the same name, shared by every
/// output variable that uses it. Unbounded dimensions stay unbounded (their length follows the
/// data written later), fixed ones keep their length. Returns the output variable of each entry
/// of `set.variables`, in the same order. No data is written.
pub fn replicate(
    input: &Container,
    set: &ExtractionSet,
    output: &mut Container,
) -> Result<Vec<VariableId>, ContainerError> {
    let mut dimensions: HashMap<CompactString, DimensionId> = HashMap::new();
    for &dim in &set.dimensions {
        let def = input.dimension(dim)?;
        let id = if def.unbounded {
            output.add_unbounded_dimension(&def.name)?
        } else {
            output.add_dimension(&def.name, def.len)?
        };
        dimensions.insert(def.name.clone(), id);
    }

    let mut variables = Vec::with_capacity(set.variables.len());
    for var in &set.variables {
        let mapped = var
            .dimensions
            .iter()
            .map(|&dim| {
                let name = &input.dimension(dim)?.name;
                dimensions
                    .get(name)
                    .copied()
                    .ok_or(ContainerError::UnknownDimension(dim.0))
            })
            .collect::<Result<SmallVec<[DimensionId; 4]>, _>>()?;
        variables.push(output.add_variable(&var.name, var.data_type, &mapped)?);
    }
    Ok(variables)
}
