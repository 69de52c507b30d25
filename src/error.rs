// ABOUTME: Error types with structured exit codes for CLI
// ABOUTME: Maps transport, storage and conversion errors to exit codes

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status} on {endpoint}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Front matter error: {0}")]
    Frontmatter(String),

    #[error("Unsupported style kind: {0}")]
    UnsupportedStyleKind(String),

    #[error("Unknown embed kind: {0}")]
    UnknownEmbedKind(String),

    #[error("Invalid style span {offset}+{length} in paragraph of {text_len} chars")]
    InvalidSpan {
        offset: usize,
        length: usize,
        text_len: usize,
    },

    #[error("Missing {kind} reference: {id}")]
    MissingReference { kind: &'static str, id: String },

    #[error("Invalid fee: {0:?}")]
    InvalidFee(String),

    #[error("Embed resolve error: {0}")]
    Resolve(String),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Auth(_) | Error::Config(_) => 2,
            Error::Network(_) => 3,
            Error::Api { .. } => 4,
            Error::Parse(_) => 5,
            Error::Filesystem(_) | Error::Frontmatter(_) => 6,
            Error::UnsupportedStyleKind(_)
            | Error::UnknownEmbedKind(_)
            | Error::InvalidSpan { .. }
            | Error::MissingReference { .. } => 7,
            Error::InvalidFee(_) => 8,
            Error::Resolve(_) => 9,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
