//! PyO3 bindings: the `_solver_ext` extension module.
//!
//! Every entry of the export table becomes a module-level function carrying the
//! table's description as its `__doc__`.

use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;
use pyo3::types::{PyCFunction, PyDict, PyTuple};

use crate::registry::{self, ExportedFunction};

fn wrap_export<'py>(
    py: Python<'py>,
    export: &'static ExportedFunction,
) -> PyResult<Bound<'py, PyCFunction>> {
    PyCFunction::new_closure(
        py,
        Some(export.name_cstr()),
        Some(export.doc_cstr()),
        move |args: &Bound<'_, PyTuple>, kwargs: Option<&Bound<'_, PyDict>>| -> PyResult<()> {
            if !args.is_empty() || kwargs.is_some_and(|kwargs| !kwargs.is_empty()) {
                return Err(PyTypeError::new_err(format!(
                    "{}() takes no arguments",
                    export.name()
                )));
            }
            // Stdout failures surface as OSError.
            export.call().map_err(PyErr::from)
        },
    )
}

/// Native connectivity probe.
#[pymodule]
#[pyo3(name = "_solver_ext")]
fn solver_ext(m: &Bound<'_, PyModule>) -> PyResult<()> {
    for export in registry::exports() {
        m.add_function(wrap_export(m.py(), export)?)?;
    }
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    log::debug!(
        "registered {} function(s) in {}",
        registry::exports().len(),
        registry::MODULE_NAME
    );
    Ok(())
}
