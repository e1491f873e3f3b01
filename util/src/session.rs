//! Session management

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use serde::Serialize;
use std::fs;
use std::fs::OpenOptions;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

// Internal imports
use crate::{params, time};

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// A chrono format string which diplays a timestamp. See
/// https://docs.rs/chrono/0.4.11/chrono/format/strftime/index.html for more
/// information.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A struct storing information about the current session
#[derive(Clone, Debug)]
pub struct Session {
    /// The root directory for this session
    pub session_root: PathBuf,

    /// The root directory for this session's archives
    pub arch_root: PathBuf,

    /// The path to the session's log file
    pub log_file_path: PathBuf,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors associated with the session module.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable (NAV_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error(
        "Cannot initialise the session epoch, have you already initialised the\
         session? (conquer_once error: {0})"
    )]
    CannotInitEpoch(conquer_once::TryInitError),

    #[error("Cannot get the epoch time, did you forget to initialise the session?")]
    CannotGetEpoch,

    #[error("Cannot write the archive file {0:?}: {1}")]
    ArchiveWriteError(PathBuf, std::io::Error),

    #[error("Cannot serialise the archive file {0:?}: {1}")]
    ArchiveSerError(PathBuf, serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start a new session within the given directory.
    ///
    /// This will create a new session directory named `{exec_name}_{timestamp}` inside
    /// `$NAV_SW_ROOT/{sessions_dir}`.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        // Get the root directory
        let root = params::get_sw_root().map_err(|_| SessionError::SwRootNotSet)?;

        Self::new_in(exec_name, root.join(sessions_dir))
    }

    /// Start a new session inside an explicit sessions directory.
    pub fn new_in<P: AsRef<Path>>(exec_name: &str, sessions_dir: P) -> Result<Self, SessionError> {
        // Set the session epoch
        match SESSION_EPOCH.try_init_once(Utc::now) {
            Ok(_) => (),
            Err(e) => return Err(SessionError::CannotInitEpoch(e)),
        };

        // Format the session epoch as a timestamp
        let timestamp = match SESSION_EPOCH.get() {
            Some(e) => e.format(TIMESTAMP_FORMAT),
            None => return Err(SessionError::CannotGetEpoch),
        };

        // Create the session path
        let path = sessions_dir
            .as_ref()
            .join(format!("{}_{}", exec_name, timestamp));

        // Create the directory
        fs::create_dir_all(&path).map_err(SessionError::CannotCreateDir)?;

        // Create the archive dir
        let arch_path = path.join("arch");
        fs::create_dir_all(&arch_path).map_err(SessionError::CannotCreateDir)?;

        // Create the log file path
        let log_file_path = path.join(format!("{}.log", exec_name));

        Ok(Session {
            session_root: path,
            arch_root: arch_path,
            log_file_path,
        })
    }

    /// Get the full path of an archive-relative path, creating the parent directories.
    pub fn arch_path<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, SessionError> {
        let full_path = self.arch_root.join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SessionError::ArchiveWriteError(full_path.clone(), e))?;
        }

        Ok(full_path)
    }

    /// Save the given data as pretty JSON at the archive-relative path.
    pub fn save_json<P: AsRef<Path>, T: Serialize>(
        &self,
        path: P,
        data: &T
    ) -> Result<(), SessionError> {
        let full_path = self.arch_path(path)?;

        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(&full_path)
            .map_err(|e| SessionError::ArchiveWriteError(full_path.clone(), e))?;

        serde_json::to_writer_pretty(&file, data)
            .map_err(|e| SessionError::ArchiveSerError(full_path, e))
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the number of seconds elapsed since the start of the session.
///
/// Returns `NAN` if no session has been started yet.
pub fn get_elapsed_seconds() -> f64 {
    match SESSION_EPOCH.get() {
        Some(e) => {
            let elapsed = Utc::now() - *e;
            match time::duration_to_seconds(elapsed) {
                Some(s) => s,
                None => std::f64::NAN,
            }
        }
        None => std::f64::NAN,
    }
}

/// Return a reference to the session's epoch, if the session has been started.
pub fn get_epoch() -> Option<&'static DateTime<Utc>> {
    SESSION_EPOCH.get()
}
