use std::ffi::CString;
use std::io;
use std::os::raw::c_char;
use std::ptr;

use thiserror::Error;

/// Errors raised by the Rust side of the module.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("failed to write to stdout: {0}")]
    Output(#[from] io::Error),
    #[error("no exported function named `{0}`")]
    UnknownFunction(String),
    #[error("{0} was null")]
    InvalidArgument(&'static str),
}

/// Opaque error type for C callers.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct solver_error_t;

struct ErrorHandle {
    message: CString,
}

/// Builds a C string from `value`, replacing interior NUL bytes with spaces.
pub(crate) fn cstring_lossy(value: &str) -> CString {
    let bytes: Vec<u8> = value
        .bytes()
        .map(|b| if b == 0 { b' ' } else { b })
        .collect();
    // No NUL bytes remain after the replacement above.
    CString::new(bytes).unwrap_or_default()
}

pub(crate) fn clear_error(out_error: *mut *mut solver_error_t) {
    if !out_error.is_null() {
        // Safety: caller provided a valid out_error pointer.
        unsafe {
            *out_error = ptr::null_mut();
        }
    }
}

pub(crate) fn write_error(out_error: *mut *mut solver_error_t, message: impl ToString) {
    if out_error.is_null() {
        return;
    }
    let handle = Box::new(ErrorHandle {
        message: cstring_lossy(&message.to_string()),
    });
    // Safety: out_error is non-null and points to writable memory.
    unsafe {
        *out_error = Box::into_raw(handle) as *mut solver_error_t;
    }
}

/// Returns the message held by an error handle.
///
/// The pointer stays valid until the handle is passed to `solver_error_free`.
#[unsafe(no_mangle)]
pub extern "C" fn solver_error_message(error: *const solver_error_t) -> *const c_char {
    if error.is_null() {
        return ptr::null();
    }
    // Safety: error must be a live handle allocated by this module.
    let handle = unsafe { &*(error as *const ErrorHandle) };
    handle.message.as_ptr()
}

/// Frees an error handle. Null is ignored.
#[unsafe(no_mangle)]
pub extern "C" fn solver_error_free(error: *mut solver_error_t) {
    if error.is_null() {
        return;
    }
    // Safety: error must be a live handle allocated by this module.
    unsafe {
        drop(Box::from_raw(error as *mut ErrorHandle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_cstring_lossy_replaces_nul() {
        assert_eq!(cstring_lossy("a\0b").as_bytes(), b"a b");
        assert_eq!(cstring_lossy("plain").as_bytes(), b"plain");
    }

    #[test]
    fn test_error_handle_lifecycle() {
        let mut err: *mut solver_error_t = ptr::null_mut();
        write_error(&mut err, SolverError::UnknownFunction("nope".into()));
        assert!(!err.is_null());

        let message = unsafe { CStr::from_ptr(solver_error_message(err)) };
        assert_eq!(message.to_str().unwrap(), "no exported function named `nope`");

        solver_error_free(err);
        clear_error(&mut err);
        assert!(err.is_null());
    }

    #[test]
    fn test_null_handles_are_ignored() {
        write_error(ptr::null_mut(), "dropped");
        clear_error(ptr::null_mut());
        assert!(solver_error_message(ptr::null()).is_null());
        solver_error_free(ptr::null_mut());
    }
}
