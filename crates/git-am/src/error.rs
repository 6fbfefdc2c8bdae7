use std::path::PathBuf;

/// Error kinds for the am session engine, tagged by recovery policy (see
/// the error handling table in the spec): `ApplyFailed` is the only variant
/// that leaves the session directory on disk for a later `--continue`-style
/// resume; every other variant is unrecoverable from this crate's
/// perspective.
#[derive(Debug, thiserror::Error)]
pub enum AmError {
    #[error("{0}")]
    UserInput(String),

    #[error("Patch format detection failed.")]
    DetectionFailure,

    #[error("Failed to split patches.")]
    SplitFailure,

    #[error("Patch is empty. Was it split wrong?")]
    EmptyPatch,

    #[error("patch failed at {msgnum}: {subject}")]
    ApplyFailed { msgnum: String, subject: String },

    #[error("could not parse author script")]
    ParseAuthorScript,

    #[error("unable to format identity: {0}")]
    InvalidIdentity(String),

    #[error("could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("BUG: {0}")]
    Bug(String),

    #[error(transparent)]
    Tool(#[from] git_utils::UtilError),
}

impl AmError {
    /// Process exit code mandated for this error kind. All fatal kinds here
    /// map to 128; the crate has no other non-zero exit code.
    pub fn exit_code(&self) -> i32 {
        128
    }

    /// Whether this error leaves the session directory live for resumption.
    pub fn is_resumable(&self) -> bool {
        matches!(self, AmError::ApplyFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, AmError>;
