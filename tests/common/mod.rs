#![allow(dead_code)]

use std::path::{Path, PathBuf};

use atlas_extract::{container::Container, dtype::DataType, variable::array::Array};

/// Input container shared by the integration tests.
///
/// - `x` (10), `y` (4), `time` (unbounded, 3 records written)
/// - `temp`  f32 [x]            0.0, 1.5, 3.0, ...
/// - `grid`  f64 [time, y, x]   linear index as value
/// - `mask`  i8  [y, x]         index % 3
/// - `label` char [x]           "abcdefghij"
/// - `count` u32 [x]            unsupported for extraction
/// - `scale` i16 scalar         -7
pub fn write_sample_input(path: &Path) {
    let mut c = Container::create(path).unwrap();
    let x = c.add_dimension("x", 10).unwrap();
    let y = c.add_dimension("y", 4).unwrap();
    let time = c.add_unbounded_dimension("time").unwrap();

    let temp = c.add_variable("temp", DataType::F32, &[x]).unwrap();
    let values: Vec<f32> = (0..10).map(|i| i as f32 * 1.5).collect();
    c.write_array(temp, &[0], &Array::<f32>::try_from_shape_and_vec(&[10], values).unwrap())
        .unwrap();

    let grid = c.add_variable("grid", DataType::F64, &[time, y, x]).unwrap();
    let values: Vec<f64> = (0..120).map(|i| i as f64).collect();
    c.write_array(
        grid,
        &[0, 0, 0],
        &Array::<f64>::try_from_shape_and_vec(&[3, 4, 10], values).unwrap(),
    )
    .unwrap();

    let mask = c.add_variable("mask", DataType::I8, &[y, x]).unwrap();
    let values: Vec<i8> = (0..40).map(|i| (i % 3) as i8).collect();
    c.write_array(mask, &[0, 0], &Array::<i8>::try_from_shape_and_vec(&[4, 10], values).unwrap())
        .unwrap();

    let label = c.add_variable("label", DataType::Char, &[x]).unwrap();
    c.write_region(label, &[0], &[10], b"abcdefghij").unwrap();

    let count = c.add_variable("count", DataType::U32, &[x]).unwrap();
    let values: Vec<u32> = (100..110).collect();
    c.write_array(count, &[0], &Array::<u32>::try_from_shape_and_vec(&[10], values).unwrap())
        .unwrap();

    let scale = c.add_variable("scale", DataType::I16, &[]).unwrap();
    c.write_array(scale, &[], &Array::<i16>::try_from_shape_and_vec(&[], vec![-7]).unwrap())
        .unwrap();

    c.close().unwrap();
}

pub struct Workspace {
    pub dir: tempfile::TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
}

pub fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.atlas");
    let output = dir.path().join("output.atlas");
    write_sample_input(&input);
    Workspace { dir, input, output }
}

/// All bytes of a variable, read in one region.
pub fn variable_bytes(c: &Container, name: &str) -> Vec<u8> {
    let id = c.find_variable(name).unwrap();
    let shape = c.variable_shape(id).unwrap();
    let width = c.variable(id).unwrap().data_type.byte_width();
    let mut buf = vec![0u8; shape.iter().product::<usize>() * width];
    let start = vec![0; shape.len()];
    c.read_region(id, &start, &shape, &mut buf).unwrap();
    buf
}
