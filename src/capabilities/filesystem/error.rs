use thiserror::Error;

/// Errors raised by filesystem capability operations
#[derive(Error, Debug)]
pub enum FsError {
    #[error("Location '{path}' is outside the sandbox and cannot be accessed")]
    OutOfScope { path: String },

    #[error("File '{path}' could not be {operation} because it could not be found")]
    NotFound { path: String, operation: String },

    #[error("Directory '{path}' could not be created because it already exists")]
    AlreadyExists { path: String },

    #[error("Location '{path}' is not a directory")]
    NotADirectory { path: String },

    #[error("Cannot relocate '{from}' into its own subtree '{to}'")]
    IntoItself { from: String, to: String },

    #[error("Parent directory of '{path}' does not exist")]
    MissingParent { path: String },

    #[error("Download of '{url}' failed with HTTP status {status}")]
    Http { url: String, status: u16 },

    #[error("Download of '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP client could not be initialised: {0}")]
    ClientSetup(#[source] reqwest::Error),

    #[error("File '{path}' could not be decoded: {reason}")]
    Encoding { path: String, reason: String },

    #[error("IO error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    pub(crate) fn io(path: &str, source: std::io::Error) -> Self {
        FsError::Io {
            path: path.to_string(),
            source,
        }
    }

    pub(crate) fn not_found(path: &str, operation: &str) -> Self {
        FsError::NotFound {
            path: path.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Map an IO error, turning `NotFound` into the descriptive variant
    pub(crate) fn from_io(path: &str, operation: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::not_found(path, operation)
        } else {
            Self::io(path, source)
        }
    }
}
