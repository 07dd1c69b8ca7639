//! Page-by-page copy of variable data.
use crate::{
    container::Container,
    dtype::DataType,
    extract::{
        ExtractError,
        planner::{ChunkPlanner, PagePlan},
    },
    header::VariableId,
    variable::array::{Array, Char, datatype::ArrayDataType},
};

/// What happened to one variable's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Copied { pages: usize, bytes: u64 },
    /// The element type cannot be extracted; the output variable holds fill values.
    Skipped,
}

/// Copy all data of `source` in `input` to `target` in `output`.
///
/// The element type is matched once here and the copy itself runs in [`copy_pages`].
pub fn transfer_variable(
    input: &Container,
    source: VariableId,
    output: &mut Container,
    target: VariableId,
    planner: &ChunkPlanner,
) -> Result<TransferOutcome, ExtractError> {
    let var = input.variable(source)?;
    let data_type = var.data_type;
    if !data_type.is_extractable() {
        tracing::warn!(
            variable = %var.name,
            %data_type,
            "unsupported element type, variable data not copied"
        );
        return Ok(TransferOutcome::Skipped);
    }

    let shape = input.variable_shape(source)?;
    let plan = planner.plan(&shape, data_type.byte_width())?;

    let bytes = match data_type {
        DataType::I8 => copy_pages::<i8>(input, source, output, target, &plan)?,
        DataType::Char => copy_pages::<Char>(input, source, output, target, &plan)?,
        DataType::I16 => copy_pages::<i16>(input, source, output, target, &plan)?,
        DataType::I32 => copy_pages::<i32>(input, source, output, target, &plan)?,
        DataType::F32 => copy_pages::<f32>(input, source, output, target, &plan)?,
        DataType::F64 => copy_pages::<f64>(input, source, output, target, &plan)?,
        DataType::I64 | DataType::U8 | DataType::U16 | DataType::U32 | DataType::U64 => {
            return Ok(TransferOutcome::Skipped);
        }
    };

    tracing::info!(
        variable = %var.name,
        pages = plan.num_pages(),
        bytes,
        "copied variable"
    );
    Ok(TransferOutcome::Copied {
        pages: plan.num_pages(),
        bytes,
    })
}

/// Copy every page of `plan`, holding one page buffer at a time. Returns the bytes copied.
fn copy_pages<T: ArrayDataType>(
    input: &Container,
    source: VariableId,
    output: &mut Container,
    target: VariableId,
    plan: &PagePlan,
) -> Result<u64, ExtractError> {
    let mut bytes = 0u64;
    for (index, page) in plan.pages().enumerate() {
        let mut buffer = Array::<T>::zeroed(&page.count)?;
        input.read_region(source, &page.start, &page.count, buffer.as_bytes_mut())?;
        output.write_array(target, &page.start, &buffer)?;

        tracing::debug!(
            page = index,
            start = ?page.start.as_slice(),
            count = ?page.count.as_slice(),
            bytes = buffer.byte_len(),
            "copied page"
        );
        bytes += buffer.byte_len() as u64;
    }
    Ok(bytes)
}
