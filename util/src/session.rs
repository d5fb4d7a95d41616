//! Session management
//!
//! A session is one run of an executable. Each session gets its own directory under the software
//! root, holding the log file and any recordings made during the run, and fixes the epoch that
//! log timestamps are measured from.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal imports
use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Format of the timestamp in session directory names, see
/// https://docs.rs/chrono/0.4/chrono/format/strftime/index.html.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name of the recordings directory within a session.
const REC_DIR_NAME: &str = "rec";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Directories and files belonging to the current session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// The root directory for this session
    pub session_root: PathBuf,

    /// The directory in which this session's recordings are written
    pub rec_root: PathBuf,

    /// The path to the session's log file
    pub log_file_path: PathBuf,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors associated with the session module.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Cannot find the software root directory: {0}")]
    SwRootNotFound(std::io::Error),

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error(
        "Cannot initialise the session epoch, has a session already been started? \
         (conquer_once error: {0})"
    )]
    CannotInitEpoch(conquer_once::TryInitError),

    #[error("The session epoch has not been initialised")]
    CannotGetEpoch,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start the session, creating `{sw_root}/{sessions_dir}/{exec_name}_{timestamp}`.
    ///
    /// Only one session may be started per process.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        SESSION_EPOCH
            .try_init_once(Utc::now)
            .map_err(SessionError::CannotInitEpoch)?;
        let epoch = get_epoch().ok_or(SessionError::CannotGetEpoch)?;

        let root = crate::host::get_sw_root().map_err(SessionError::SwRootNotFound)?;

        Self::create(
            &root.join(sessions_dir),
            exec_name,
            &epoch.format(TIMESTAMP_FORMAT).to_string()
        )
    }

    /// Path of a recording called `name` in this session.
    pub fn rec_path(&self, name: &str) -> PathBuf {
        self.rec_root.join(name)
    }

    /// Create the session directories under `sessions_dir`.
    fn create(
        sessions_dir: &Path,
        exec_name: &str,
        timestamp: &str
    ) -> Result<Self, SessionError> {
        let session_root = sessions_dir.join(format!("{}_{}", exec_name, timestamp));
        let rec_root = session_root.join(REC_DIR_NAME);

        // Creating the recordings dir creates the session root along with it
        fs::create_dir_all(&rec_root).map_err(SessionError::CannotCreateDir)?;

        Ok(Session {
            log_file_path: session_root.join(format!("{}.log", exec_name)),
            session_root,
            rec_root,
        })
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the number of seconds elapsed since the start of the session.
///
/// If no session has been started yet `NAN` is returned.
pub fn get_elapsed_seconds() -> f64 {
    SESSION_EPOCH
        .get()
        .and_then(|e| time::duration_to_seconds(Utc::now() - *e))
        .unwrap_or(std::f64::NAN)
}

/// The session's epoch, if the session has been started.
pub fn get_epoch() -> Option<&'static DateTime<Utc>> {
    SESSION_EPOCH.get()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_one_session_per_process() {
        let dir = std::env::temp_dir().join(format!("util_sessions_{}", std::process::id()));
        let sessions_dir = dir.display().to_string();

        // The first session fixes the epoch, any later one is refused
        let first = Session::new("drive_exec", &sessions_dir);
        assert!(first.is_ok());
        assert!(get_epoch().is_some());
        assert!(get_elapsed_seconds() >= 0.0);
        assert!(matches!(
            Session::new("drive_exec", &sessions_dir),
            Err(SessionError::CannotInitEpoch(_))
        ));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_create_dirs() {
        let dir = std::env::temp_dir().join(format!("util_session_{}", std::process::id()));
        let session = Session::create(&dir, "drive_exec", "20210101_120000").unwrap();

        assert_eq!(session.session_root, dir.join("drive_exec_20210101_120000"));
        assert!(session.rec_root.is_dir());
        assert_eq!(
            session.log_file_path,
            session.session_root.join("drive_exec.log")
        );
        assert_eq!(session.rec_path("a.rec"), session.rec_root.join("a.rec"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
