//! `_solver_ext`: a native connectivity probe loadable from C and Python hosts.

mod error;
mod ffi;
mod logging;
mod probe;
mod registry;
#[cfg(feature = "python")]
mod python;

pub use error::{SolverError, solver_error_free, solver_error_message, solver_error_t};
pub use logging::{
    solver_log_callback_t, solver_log_config_init, solver_log_config_t, solver_log_init,
    solver_log_level_t, solver_log_record_t,
};
pub use probe::{PROBE_MESSAGE, solver_test_connection, test_connection, write_probe_line};
pub use registry::{
    ExportedFunction, MODULE_NAME, exports, find, invoke, solver_ext_call,
    solver_ext_function_count, solver_ext_function_doc, solver_ext_function_name,
    solver_ext_module_name, solver_ext_version,
};
