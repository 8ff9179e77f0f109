use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} is already running")]
    AlreadyRunning(String),

    #[error("{name} is not running: {reason}")]
    NotRunning { name: String, reason: String },

    #[error("failed to attach to {name}: {source}")]
    AttachFailed {
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to start {name}: {source}")]
    SpawnFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to kill process {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },

    #[error("D-Bus call failed: {0}")]
    TransportCallFailed(#[from] zbus::Error),

    #[error("invalid D-Bus response: {0}")]
    InvalidResponse(String),

    #[error("invalid track id {0:?}")]
    InvalidTrackId(String),

    #[error("unsupported playback status {0:?}")]
    UnsupportedStatus(String),

    #[error("unexpected response shape: {0}")]
    InvalidResponseShape(String),

    #[error("remote API error {status}: {message}")]
    RemoteApi { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
