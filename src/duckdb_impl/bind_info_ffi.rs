//! Null-aware named-parameter access for table-function binds.
//!
//! duckdb-rs hands back named parameters as already-converted values, which loses the
//! difference between an omitted parameter and an explicit `NULL`. These helpers read the raw
//! `duckdb_value` instead.

use duckdb::vtab::BindInfo;
use libduckdb_sys::{
    duckdb_bind_get_named_parameter, duckdb_bind_info, duckdb_destroy_value, duckdb_free,
    duckdb_get_int64, duckdb_get_varchar, duckdb_is_null_value, duckdb_value,
};
use std::error::Error;
use std::ffi::{CStr, CString};
use std::os::raw::c_void;

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum NamedParameter<T> {
    Missing,
    Null,
    Value(T),
}

pub(crate) fn get_named_parameter_varchar(
    bind: &BindInfo,
    name: &str,
) -> Result<NamedParameter<String>, Box<dyn Error>> {
    with_named_parameter(bind, name, |value| {
        // SAFETY: `value` is a live non-NULL parameter value; the returned string is ours to free.
        unsafe {
            let varchar = duckdb_get_varchar(value);
            if varchar.is_null() {
                return Err(format!("Failed to read named parameter '{}' as VARCHAR", name).into());
            }
            let text = CStr::from_ptr(varchar).to_string_lossy().into_owned();
            duckdb_free(varchar as *mut c_void);
            Ok(text)
        }
    })
}

pub(crate) fn get_named_parameter_bigint(
    bind: &BindInfo,
    name: &str,
) -> Result<NamedParameter<i64>, Box<dyn Error>> {
    // SAFETY: `value` is a live non-NULL parameter value.
    with_named_parameter(bind, name, |value| Ok(unsafe { duckdb_get_int64(value) }))
}

fn with_named_parameter<T>(
    bind: &BindInfo,
    name: &str,
    read: impl FnOnce(duckdb_value) -> Result<T, Box<dyn Error>>,
) -> Result<NamedParameter<T>, Box<dyn Error>> {
    let name_cstr = CString::new(name)?;

    // SAFETY: the bind pointer is valid for the duration of this bind callback.
    let mut value =
        unsafe { duckdb_bind_get_named_parameter(bind_info_ptr(bind), name_cstr.as_ptr()) };
    if value.is_null() {
        return Ok(NamedParameter::Missing);
    }

    // SAFETY: `value` was returned by DuckDB and is destroyed exactly once below.
    let result = if unsafe { duckdb_is_null_value(value) } {
        Ok(NamedParameter::Null)
    } else {
        read(value).map(NamedParameter::Value)
    };

    // SAFETY: `value` has not been destroyed yet.
    unsafe {
        duckdb_destroy_value(&mut value);
    }

    result
}

fn bind_info_ptr(bind: &BindInfo) -> duckdb_bind_info {
    // SAFETY: `duckdb::vtab::BindInfo` wraps a single `duckdb_bind_info` and offers no raw
    // accessor. Re-check this layout whenever the duckdb crate is upgraded.
    unsafe { *(bind as *const BindInfo as *const duckdb_bind_info) }
}
