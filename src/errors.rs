use {std::io, thiserror::Error};

/// Setup and fatal errors. Anything here aborts the run with a nonzero status.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Error opening wordlist {path}: {source}")]
    Wordlist { path: String, source: io::Error },

    #[error("Error opening report file {path}: {source}")]
    Report { path: String, source: io::Error },

    #[error("Error opening resolvers file {path}: {source}")]
    Resolvers { path: String, source: io::Error },

    #[error("Invalid name server {0}, only IP addresses are allowed")]
    InvalidNameServer(String),

    #[error("Error building DNS resolver: {0}")]
    Resolver(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure of a single lookup. Never fatal, callers skip the name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("name not found")]
    NotFound,

    #[error("resolver error: {0}")]
    Resolver(String),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
