use std::path::PathBuf;

use thiserror::Error;

/// Problems with the contents of a mobility CSV.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("line {line}: invalid date '{value}'")]
    InvalidDate { line: u64, value: String },
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("mobility data unavailable at '{path}': {source}")]
    DataUnavailable {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("region mapping unavailable at '{path}': {source}")]
    MappingUnavailable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to download mobility source: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("downloaded mobility source is malformed: {0}")]
    MalformedSource(#[source] ParseError),
    #[error("failed to write cache file '{path}': {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("dataset worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
