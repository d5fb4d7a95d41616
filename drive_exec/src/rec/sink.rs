//! # Recording sinks

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Recording name which selects standard output instead of a file.
pub const STDOUT_SINK_NAME: &str = "-";

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Destination of a recording.
#[derive(Debug)]
pub enum Sink {
    Stdout(io::Stdout),
    File(BufWriter<File>),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Sink {
    /// Open the sink named `name`.
    ///
    /// [`STDOUT_SINK_NAME`] selects standard output, any other name is a path to a file which is
    /// created, or truncated if it exists.
    pub fn open<P: AsRef<Path>>(name: P) -> io::Result<Self> {
        let name = name.as_ref();

        if name == Path::new(STDOUT_SINK_NAME) {
            Ok(Sink::Stdout(io::stdout()))
        }
        else {
            Ok(Sink::File(BufWriter::new(File::create(name)?)))
        }
    }

    pub fn is_stdout(&self) -> bool {
        matches!(self, Sink::Stdout(_))
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Stdout(s) => s.write(buf),
            Sink::File(f) => f.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Sink::Stdout(s) => s.lock().write_all(buf),
            Sink::File(f) => f.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Stdout(s) => s.flush(),
            Sink::File(f) => f.flush(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_stdout_sink() {
        let sink = Sink::open(STDOUT_SINK_NAME).unwrap();
        assert!(sink.is_stdout());
    }

    #[test]
    fn test_file_sink_truncates() {
        let path = std::env::temp_dir()
            .join(format!("drive_sink_test_{}.rec", std::process::id()));
        std::fs::write(&path, b"previous contents").unwrap();

        let mut sink = Sink::open(&path).unwrap();
        assert!(!sink.is_stdout());
        sink.write_all(b"new").unwrap();
        sink.flush().unwrap();
        drop(sink);

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_sink_open_failure() {
        let path = std::env::temp_dir().join("no_such_dir_for_drive_sink").join("x.rec");
        assert!(Sink::open(&path).is_err());
    }
}
