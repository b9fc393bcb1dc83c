//! Module for errors.
use std::{error::Error, fmt::Display};

/// Error from the planner, downloader, and forecast log.
#[derive(Debug)]
pub enum GfsFetchErr {
    // Inherited errors from std
    /// Error forwarded from std
    IO(::std::io::Error),

    // Other forwarded errors
    /// Error forwarded from serde_json
    Json(::serde_json::Error),
    /// Transport level error forwarded from reqwest
    Network(::reqwest::Error),
    /// Error forwarded from the strum crate
    StrumError(strum::ParseError),
    /// General error with any cause information erased and replaced by a string
    GeneralError(String),

    // My own errors from this crate
    /// The server answered with an error status.
    HttpStatus {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
    /// The index for a remote file could not be fetched or parsed.
    IndexUnavailable {
        /// The remote file the index belongs to.
        url: String,
        /// What went wrong.
        reason: String,
    },
    /// Filters were supplied but none of them matched a record of this file.
    NoFilterMatch(String),
    /// A filter is missing a required field.
    MalformedFilter(&'static str),
    /// The directory listing does not hold the expected number of files.
    FileSetIncomplete {
        /// Number of files required.
        expected: usize,
        /// Number of files listed.
        found: usize,
    },
    /// A date or time string could not be understood.
    InvalidDateTime(String),
    /// The downloaded size differs from the planned size.
    SizeMismatch {
        /// The local file.
        target: String,
        /// Bytes planned.
        expected: u64,
        /// Bytes written.
        written: u64,
    },
}

impl Display for GfsFetchErr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        use crate::errors::GfsFetchErr::*;

        match self {
            IO(err) => write!(f, "std lib io error: {}", err),

            Json(err) => write!(f, "json error: {}", err),
            Network(err) => write!(f, "network error: {}", err),
            StrumError(err) => write!(f, "error forwarded from strum crate: {}", err),
            GeneralError(msg) => write!(f, "general error forwarded: {}", msg),

            HttpStatus { url, status } => write!(f, "HTTP error ({}): {}", status, url),
            IndexUnavailable { url, reason } => {
                write!(f, "index unavailable for {}: {}", url, reason)
            }
            NoFilterMatch(url) => write!(f, "no filter applied to {}", url),
            MalformedFilter(msg) => write!(f, "malformed filter: {}", msg),
            FileSetIncomplete { expected, found } => write!(
                f,
                "file set is incomplete: expected {} files, found {}",
                expected, found
            ),
            InvalidDateTime(val) => write!(f, "invalid date/time: {}", val),
            SizeMismatch {
                target,
                expected,
                written,
            } => write!(
                f,
                "size mismatch for {}: expected {} bytes, wrote {}",
                target, expected, written
            ),
        }
    }
}

impl Error for GfsFetchErr {}

impl GfsFetchErr {
    /// True for the only condition the retry driver recovers from.
    pub fn is_index_unavailable(&self) -> bool {
        match self {
            GfsFetchErr::IndexUnavailable { .. } => true,
            _ => false,
        }
    }

    /// Process exit status for this error when it ends a run.
    pub fn exit_code(&self) -> i32 {
        match self {
            GfsFetchErr::IndexUnavailable { .. } => 2,
            GfsFetchErr::NoFilterMatch(_) => 3,
            GfsFetchErr::MalformedFilter(_) => 4,
            GfsFetchErr::FileSetIncomplete { .. } => 5,
            _ => 1,
        }
    }
}

impl From<::std::io::Error> for GfsFetchErr {
    fn from(err: ::std::io::Error) -> GfsFetchErr {
        GfsFetchErr::IO(err)
    }
}

impl From<::serde_json::Error> for GfsFetchErr {
    fn from(err: ::serde_json::Error) -> GfsFetchErr {
        GfsFetchErr::Json(err)
    }
}

impl From<::reqwest::Error> for GfsFetchErr {
    fn from(err: ::reqwest::Error) -> GfsFetchErr {
        GfsFetchErr::Network(err)
    }
}

impl From<strum::ParseError> for GfsFetchErr {
    fn from(err: strum::ParseError) -> GfsFetchErr {
        GfsFetchErr::StrumError(err)
    }
}

impl From<::chrono::ParseError> for GfsFetchErr {
    fn from(err: ::chrono::ParseError) -> GfsFetchErr {
        GfsFetchErr::InvalidDateTime(err.to_string())
    }
}

impl From<::regex::Error> for GfsFetchErr {
    fn from(err: ::regex::Error) -> GfsFetchErr {
        GfsFetchErr::GeneralError(err.to_string())
    }
}

impl From<Box<dyn Error>> for GfsFetchErr {
    fn from(err: Box<dyn Error>) -> GfsFetchErr {
        GfsFetchErr::GeneralError(err.to_string())
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errs = [
            GfsFetchErr::IndexUnavailable {
                url: "u".to_owned(),
                reason: "r".to_owned(),
            },
            GfsFetchErr::NoFilterMatch("u".to_owned()),
            GfsFetchErr::MalformedFilter("shortName must not be empty"),
            GfsFetchErr::FileSetIncomplete {
                expected: 209,
                found: 12,
            },
            GfsFetchErr::GeneralError("boom".to_owned()),
        ];

        let mut codes: Vec<i32> = errs.iter().map(|e| e.exit_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errs.len());
        assert!(codes.iter().all(|&c| c != 0));
    }

    #[test]
    fn test_display_mentions_url() {
        let err = GfsFetchErr::NoFilterMatch("https://host/gfs.f003".to_owned());
        assert_eq!(err.to_string(), "no filter applied to https://host/gfs.f003");
        assert!(!err.is_index_unavailable());
    }
}
