//! Opt-in logging for the native module.
//!
//! Nothing is installed until the host calls `solver_log_init`. Records go to a
//! host callback or to stderr; stdout is reserved for the probe line.

use std::ffi::CStr;
use std::io::Write;
use std::os::raw::{c_char, c_void};
use std::ptr;
use std::sync::RwLock;

use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;

use crate::error::{clear_error, cstring_lossy, solver_error_t, write_error};
use crate::registry::MODULE_NAME;

static LOGGER: Lazy<ModuleLogger> = Lazy::new(ModuleLogger::default);
// Evaluated once; false when a foreign logger got there first.
static INSTALLED: Lazy<bool> = Lazy::new(|| log::set_logger(&*LOGGER).is_ok());

/// Log level values for C callers.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(C)]
pub enum solver_log_level_t {
    SOLVER_LOG_LEVEL_OFF = 0,
    SOLVER_LOG_LEVEL_ERROR = 1,
    SOLVER_LOG_LEVEL_WARN = 2,
    SOLVER_LOG_LEVEL_INFO = 3,
    SOLVER_LOG_LEVEL_DEBUG = 4,
    SOLVER_LOG_LEVEL_TRACE = 5,
}

impl From<solver_log_level_t> for LevelFilter {
    fn from(value: solver_log_level_t) -> Self {
        use solver_log_level_t::*;
        match value {
            SOLVER_LOG_LEVEL_OFF => LevelFilter::Off,
            SOLVER_LOG_LEVEL_ERROR => LevelFilter::Error,
            SOLVER_LOG_LEVEL_WARN => LevelFilter::Warn,
            SOLVER_LOG_LEVEL_INFO => LevelFilter::Info,
            SOLVER_LOG_LEVEL_DEBUG => LevelFilter::Debug,
            SOLVER_LOG_LEVEL_TRACE => LevelFilter::Trace,
        }
    }
}

impl From<Level> for solver_log_level_t {
    fn from(value: Level) -> Self {
        use solver_log_level_t::*;
        match value {
            Level::Error => SOLVER_LOG_LEVEL_ERROR,
            Level::Warn => SOLVER_LOG_LEVEL_WARN,
            Level::Info => SOLVER_LOG_LEVEL_INFO,
            Level::Debug => SOLVER_LOG_LEVEL_DEBUG,
            Level::Trace => SOLVER_LOG_LEVEL_TRACE,
        }
    }
}

/// A log record handed to the host callback.
///
/// Pointers are only valid during the callback. `module_path` and `file` may be
/// null; `line` is 0 when unknown.
#[repr(C)]
pub struct solver_log_record_t {
    pub level: solver_log_level_t,
    pub target: *const c_char,
    pub message: *const c_char,
    pub module_path: *const c_char,
    pub file: *const c_char,
    pub line: u32,
}

/// Host callback for log records. May be invoked from any thread.
#[allow(non_camel_case_types)]
pub type solver_log_callback_t =
    Option<extern "C" fn(record: *const solver_log_record_t, user_data: *mut c_void)>;

/// Logging configuration.
///
/// `filter` uses `RUST_LOG` syntax and wins over both the environment and
/// `level`. With no filter, `RUST_LOG` is consulted, then `level` is applied to
/// the module's own records. A null `callback` sends records to stderr.
#[repr(C)]
pub struct solver_log_config_t {
    pub level: solver_log_level_t,
    pub filter: *const c_char,
    pub callback: solver_log_callback_t,
    pub user_data: *mut c_void,
}

#[derive(Clone, Debug, PartialEq)]
struct Directive {
    prefix: String,
    level: LevelFilter,
}

#[derive(Clone, Debug, PartialEq)]
struct Filter {
    fallback: LevelFilter,
    directives: Vec<Directive>,
}

impl Filter {
    fn module_only(level: LevelFilter) -> Self {
        Self {
            fallback: LevelFilter::Off,
            directives: vec![Directive {
                prefix: MODULE_NAME.to_string(),
                level,
            }],
        }
    }

    fn parse(spec: &str) -> Result<Self, String> {
        let mut filter = Self {
            fallback: LevelFilter::Off,
            directives: Vec::new(),
        };

        for item in spec.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            match item.split_once('=') {
                Some((prefix, level)) => {
                    let prefix = prefix.trim();
                    let level = level.trim();
                    if prefix.is_empty() {
                        return Err(format!("directive `{item}` has no target"));
                    }
                    let level = parse_level(level)
                        .ok_or_else(|| format!("invalid level `{level}` for `{prefix}`"))?;
                    filter.directives.push(Directive {
                        prefix: prefix.to_string(),
                        level,
                    });
                }
                None => match parse_level(item) {
                    Some(level) => filter.fallback = level,
                    None => filter.directives.push(Directive {
                        prefix: item.to_string(),
                        level: LevelFilter::Trace,
                    }),
                },
            }
        }

        Ok(filter)
    }

    /// Level for `target`: the longest matching prefix wins, later ties win.
    fn level_for(&self, target: &str) -> LevelFilter {
        self.directives
            .iter()
            .filter(|directive| target.starts_with(&directive.prefix))
            .fold((0, self.fallback), |best, directive| {
                if directive.prefix.len() >= best.0 {
                    (directive.prefix.len(), directive.level)
                } else {
                    best
                }
            })
            .1
    }

    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level_for(metadata.target())
    }

    fn max_level(&self) -> LevelFilter {
        self.directives
            .iter()
            .map(|directive| directive.level)
            .fold(self.fallback, Ord::max)
    }
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

struct Sink {
    filter: Filter,
    callback: solver_log_callback_t,
    // Stored as an integer so the logger stays Send + Sync.
    user_data: usize,
}

struct ModuleLogger {
    sink: RwLock<Sink>,
}

impl Default for ModuleLogger {
    fn default() -> Self {
        Self {
            sink: RwLock::new(Sink {
                filter: Filter::module_only(LevelFilter::Info),
                callback: None,
                user_data: 0,
            }),
        }
    }
}

impl ModuleLogger {
    fn replace(&self, sink: Sink) {
        *self.sink.write().unwrap_or_else(|err| err.into_inner()) = sink;
    }
}

impl Log for ModuleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let sink = self.sink.read().unwrap_or_else(|err| err.into_inner());
        sink.filter.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        let (callback, user_data) = {
            let sink = self.sink.read().unwrap_or_else(|err| err.into_inner());
            if !sink.filter.enabled(record.metadata()) {
                return;
            }
            (sink.callback, sink.user_data)
        };

        let Some(callback) = callback else {
            let _ = writeln!(
                std::io::stderr().lock(),
                "{} {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
            return;
        };

        let target = cstring_lossy(record.target());
        let message = cstring_lossy(&record.args().to_string());
        let module_path = record.module_path().map(cstring_lossy);
        let file = record.file().map(cstring_lossy);
        let raw = solver_log_record_t {
            level: record.level().into(),
            target: target.as_ptr(),
            message: message.as_ptr(),
            module_path: module_path.as_ref().map_or(ptr::null(), |value| value.as_ptr()),
            file: file.as_ref().map_or(ptr::null(), |value| value.as_ptr()),
            line: record.line().unwrap_or(0),
        };
        callback(&raw, user_data as *mut c_void);
    }

    fn flush(&self) {}
}

fn resolve_filter(config: Option<&solver_log_config_t>) -> Result<Filter, String> {
    if let Some(raw) = config.map(|config| config.filter).filter(|raw| !raw.is_null()) {
        // Safety: caller guarantees a valid, NUL-terminated C string.
        let spec = unsafe { CStr::from_ptr(raw) }.to_string_lossy();
        return Filter::parse(&spec).map_err(|err| format!("invalid log filter `{spec}`: {err}"));
    }

    if let Ok(spec) = std::env::var("RUST_LOG") {
        return Filter::parse(&spec).map_err(|err| format!("invalid RUST_LOG `{spec}`: {err}"));
    }

    let level = config.map_or(solver_log_level_t::SOLVER_LOG_LEVEL_INFO, |config| {
        config.level
    });
    Ok(Filter::module_only(level.into()))
}

fn install() -> Result<(), &'static str> {
    if *INSTALLED {
        Ok(())
    } else {
        Err("another logger is already installed in this process")
    }
}

/// Fills `config` with defaults: INFO for the module, no filter, no callback.
#[unsafe(no_mangle)]
pub extern "C" fn solver_log_config_init(config: *mut solver_log_config_t) {
    if config.is_null() {
        return;
    }
    // Safety: caller provided a writable config pointer.
    unsafe {
        config.write(solver_log_config_t {
            level: solver_log_level_t::SOLVER_LOG_LEVEL_INFO,
            filter: ptr::null(),
            callback: None,
            user_data: ptr::null_mut(),
        });
    }
}

/// Installs or reconfigures the module logger. A null `config` uses defaults.
///
/// Returns false and fills `out_error` when the filter is invalid or a
/// different logger already owns the process.
#[unsafe(no_mangle)]
pub extern "C" fn solver_log_init(
    config: *const solver_log_config_t,
    out_error: *mut *mut solver_error_t,
) -> bool {
    clear_error(out_error);

    // Safety: caller passes null or a valid config pointer.
    let config = unsafe { config.as_ref() };
    let filter = match resolve_filter(config) {
        Ok(filter) => filter,
        Err(message) => {
            write_error(out_error, message);
            return false;
        }
    };

    if let Err(message) = install() {
        write_error(out_error, message);
        return false;
    }

    let max_level = filter.max_level();
    LOGGER.replace(Sink {
        filter,
        callback: config.and_then(|config| config.callback),
        user_data: config.map_or(0, |config| config.user_data as usize),
    });
    log::set_max_level(max_level);
    true
}
