//! Shared scalar `invoke()` plumbing: flat vector access, NULL rows, string decoding.
//!
//! # Safety
//! Call these only from a DuckDB scalar `invoke()` while its vectors are live. The helpers
//! check the logical types of the input and output columns before touching their data.

use std::error::Error;
use std::ffi::CString;

use duckdb::{
    Result,
    core::{DataChunkHandle, FlatVector, Inserter, LogicalTypeId},
    vtab::arrow::WritableVector,
};
use libduckdb_sys::duckdb_string_t;

use super::string::decode_duckdb_string;

fn ensure_type(vec: &FlatVector, expected: LogicalTypeId, label: &str) -> Result<(), Box<dyn Error>> {
    let actual = vec.logical_type().id();
    if actual != expected {
        return Err(format!("{label}: expected {expected:?} column, got {actual:?}").into());
    }
    Ok(())
}

fn insert_varchar(vec: &mut FlatVector, row: usize, value: &str) -> Result<(), Box<dyn Error>> {
    let value = if value.contains('\0') {
        value.replace('\0', " ")
    } else {
        value.to_string()
    };
    vec.insert(row, CString::new(value)?);
    Ok(())
}

/// `VARCHAR -> VARCHAR`; NULL rows stay NULL.
pub fn invoke_unary_varchar_to_varchar<F>(
    input: &DataChunkHandle,
    output: &mut dyn WritableVector,
    mut f: F,
) -> Result<(), Box<dyn Error>>
where
    F: FnMut(&str) -> Result<String, Box<dyn Error>>,
{
    let len = input.len();
    let input_vec = input.flat_vector(0);
    ensure_type(&input_vec, LogicalTypeId::Varchar, "input[0]")?;
    let input_slice = input_vec.as_slice::<duckdb_string_t>();
    let mut output_vec = output.flat_vector();
    ensure_type(&output_vec, LogicalTypeId::Varchar, "output")?;

    for (row, s) in input_slice.iter().take(len).enumerate() {
        if input_vec.row_is_null(row as u64) {
            output_vec.set_null(row);
            continue;
        }

        // SAFETY: the row is non-NULL and belongs to this invocation's input chunk.
        let text = unsafe { decode_duckdb_string(s) };
        insert_varchar(&mut output_vec, row, &f(&text)?)?;
    }

    Ok(())
}

/// `VARCHAR -> BIGINT`; NULL rows produce `default_on_null`.
pub fn invoke_unary_varchar_to_i64_default<F>(
    input: &DataChunkHandle,
    output: &mut dyn WritableVector,
    default_on_null: i64,
    mut f: F,
) -> Result<(), Box<dyn Error>>
where
    F: FnMut(&str) -> i64,
{
    let len = input.len();
    let input_vec = input.flat_vector(0);
    ensure_type(&input_vec, LogicalTypeId::Varchar, "input[0]")?;
    let input_slice = input_vec.as_slice::<duckdb_string_t>();
    let mut output_vec = output.flat_vector();
    ensure_type(&output_vec, LogicalTypeId::Bigint, "output")?;
    let output_slice = output_vec.as_mut_slice::<i64>();

    for (row, s) in input_slice.iter().take(len).enumerate() {
        output_slice[row] = if input_vec.row_is_null(row as u64) {
            default_on_null
        } else {
            // SAFETY: the row is non-NULL and belongs to this invocation's input chunk.
            f(&unsafe { decode_duckdb_string(s) })
        };
    }

    Ok(())
}
