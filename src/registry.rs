//! The module's public namespace and its C introspection entry points.

use std::ffi::CStr;
use std::io;
use std::os::raw::c_char;
use std::panic::AssertUnwindSafe;
use std::ptr;

use log::{debug, warn};

use crate::error::{SolverError, clear_error, solver_error_t, write_error};
use crate::ffi::read_cstr;
use crate::probe;

/// Name the host loader knows this module by.
pub const MODULE_NAME: &str = "_solver_ext";

const MODULE_NAME_C: &CStr = c"_solver_ext";
const VERSION_C: &CStr = {
    match CStr::from_bytes_with_nul(concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes()) {
        Ok(value) => value,
        Err(_) => panic!("crate version contains a NUL byte"),
    }
};

/// A zero-argument function published in the module namespace.
pub struct ExportedFunction {
    name: &'static CStr,
    doc: &'static CStr,
    call: fn() -> io::Result<()>,
}

impl ExportedFunction {
    pub fn name(&self) -> &'static str {
        self.name.to_str().unwrap_or_default()
    }

    pub fn doc(&self) -> &'static str {
        self.doc.to_str().unwrap_or_default()
    }

    pub fn call(&self) -> io::Result<()> {
        (self.call)()
    }

    pub(crate) fn name_cstr(&self) -> &'static CStr {
        self.name
    }

    pub(crate) fn doc_cstr(&self) -> &'static CStr {
        self.doc
    }
}

static EXPORTS: [ExportedFunction; 1] = [ExportedFunction {
    name: c"test_connection",
    doc: c"Prints a test message from C++",
    call: probe::test_connection,
}];

pub fn exports() -> &'static [ExportedFunction] {
    &EXPORTS
}

pub fn find(name: &str) -> Option<&'static ExportedFunction> {
    EXPORTS.iter().find(|export| export.name() == name)
}

/// Calls the exported function `name`.
pub fn invoke(name: &str) -> Result<(), SolverError> {
    let export = find(name).ok_or_else(|| SolverError::UnknownFunction(name.to_string()))?;
    debug!("dispatching {}.{}", MODULE_NAME, export.name());
    Ok(export.call()?)
}

/// Returns the module name. The string is static and must not be freed.
#[unsafe(no_mangle)]
pub extern "C" fn solver_ext_module_name() -> *const c_char {
    MODULE_NAME_C.as_ptr()
}

/// Returns the crate version. The string is static and must not be freed.
#[unsafe(no_mangle)]
pub extern "C" fn solver_ext_version() -> *const c_char {
    VERSION_C.as_ptr()
}

/// Returns the number of exported functions.
#[unsafe(no_mangle)]
pub extern "C" fn solver_ext_function_count() -> usize {
    EXPORTS.len()
}

/// Returns the name of the function at `index`, or null when out of range.
#[unsafe(no_mangle)]
pub extern "C" fn solver_ext_function_name(index: usize) -> *const c_char {
    EXPORTS
        .get(index)
        .map_or(ptr::null(), |export| export.name.as_ptr())
}

/// Returns the description of the function at `index`, or null when out of range.
#[unsafe(no_mangle)]
pub extern "C" fn solver_ext_function_doc(index: usize) -> *const c_char {
    EXPORTS
        .get(index)
        .map_or(ptr::null(), |export| export.doc.as_ptr())
}

/// Calls an exported function by name.
///
/// Returns false and fills `out_error` when the name is unknown, the call
/// fails, or the call panics. Free the error with `solver_error_free`.
#[unsafe(no_mangle)]
pub extern "C" fn solver_ext_call(
    name: *const c_char,
    out_error: *mut *mut solver_error_t,
) -> bool {
    clear_error(out_error);
    let name = match read_cstr(name, "name", out_error) {
        Some(value) => value,
        None => return false,
    };

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| invoke(&name)));
    match result {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            warn!("{MODULE_NAME}.{name}: {err}");
            write_error(out_error, err);
            false
        }
        Err(_) => {
            write_error(out_error, format!("panic while calling `{name}`"));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_is_registered() {
        let export = find("test_connection").expect("test_connection should be exported");
        assert_eq!(export.name(), "test_connection");
        assert_eq!(export.doc(), "Prints a test message from C++");
    }

    #[test]
    fn test_namespace_has_single_entry() {
        let names: Vec<_> = exports().iter().map(ExportedFunction::name).collect();
        assert_eq!(names, ["test_connection"]);
    }

    #[test]
    fn test_invoke_unknown_name() {
        assert!(find("solve").is_none());
        match invoke("solve") {
            Err(SolverError::UnknownFunction(name)) => assert_eq!(name, "solve"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_version_matches_package() {
        assert_eq!(VERSION_C.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }
}
