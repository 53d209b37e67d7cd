//! Connectivity probe: proves the native module loaded and can write to stdout.

use std::io::{self, Write};

use log::{debug, error};

/// The line written by every call to [`test_connection`], without terminator.
pub const PROBE_MESSAGE: &str = "Test: The C++ code works!";

/// Writes the probe line plus a newline to `out` and flushes it.
pub fn write_probe_line<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{PROBE_MESSAGE}")?;
    out.flush()
}

/// Prints the probe line to the process stdout.
///
/// The stdout lock is held for the whole line, so concurrent callers never
/// split each other's output mid-line.
pub fn test_connection() -> io::Result<()> {
    debug!("test_connection invoked");
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_probe_line(&mut handle)
}

/// Prints `Test: The C++ code works!` to stdout.
///
/// Write failures are logged and otherwise ignored.
#[unsafe(no_mangle)]
pub extern "C" fn solver_test_connection() {
    if let Err(err) = test_connection() {
        error!("test_connection: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_probe_line_bytes() {
        let mut out = Vec::new();
        write_probe_line(&mut out).unwrap();
        assert_eq!(out, b"Test: The C++ code works!\n");
    }

    #[test]
    fn test_probe_line_repeats_in_order() {
        let mut out = Vec::new();
        for _ in 0..3 {
            write_probe_line(&mut out).unwrap();
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Test: The C++ code works!\n".repeat(3)
        );
    }

    #[test]
    fn test_probe_line_flushes() {
        let mut out = io::BufWriter::with_capacity(1024, Vec::new());
        write_probe_line(&mut out).unwrap();
        assert_eq!(out.buffer().len(), 0, "line should not sit in the buffer");
        assert_eq!(out.get_ref().as_slice(), b"Test: The C++ code works!\n");
    }

    #[test]
    fn test_probe_line_surfaces_write_errors() {
        let err = write_probe_line(&mut ClosedPipe).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
