#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the scoring crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.
//!
//! Variants follow the failure taxonomy of an analysis run: input validation,
//! upstream unavailability (not found, rate limited, network), narrative
//! generation and persistence. Only the transient subset is retried.

use std::path::{Path, PathBuf};

/// Unified error type returned by the library and the CLI.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors that occur while reading configuration or snapshots.
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// Location of the file being read.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors.
    #[error("failed to parse configuration: {source}")]
    Parse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Returned when user input or configuration violates invariants.
    #[error("invalid input: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Wraps JSON encoding and decoding errors.
    #[error("failed to serialize data: {source}")]
    Serialize {
        /// Underlying serde_json error.
        source: serde_json::Error
    },
    /// The upstream repository or resource does not exist or is private.
    #[error("{resource} not found or is private")]
    NotFound {
        /// Resource that could not be located.
        resource: String
    },
    /// The upstream API refused the request because of its rate limit.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimited {
        /// Message reported by the upstream service.
        message: String
    },
    /// Transport-level or unexpected upstream failure.
    #[error("network error: {message}")]
    Network {
        /// Human readable message describing the failure.
        message: String
    },
    /// The text generation backend failed or returned unusable output.
    #[error("text generation failed: {message}")]
    Generation {
        /// Human readable message describing the failure.
        message: String
    },
    /// Wraps errors raised by the relational store.
    #[error("storage error: {source}")]
    Storage {
        /// Underlying SQLite error.
        source: rusqlite::Error
    },
    /// The analysis did not finish within the configured deadline.
    #[error("analysis timed out after {millis}ms")]
    Timeout {
        /// Deadline that was exceeded, in milliseconds.
        millis: u64
    },
    /// Wraps I/O errors that occur while writing badge artifacts.
    #[error("failed to write badge artifact at {path:?}: {source}")]
    BadgeIo {
        /// Location of the artifact being produced.
        path:   PathBuf,
        /// Underlying I/O error reported by the operating system.
        source: std::io::Error
    },
    /// Service errors that do not fit any other category.
    #[error("service error: {message}")]
    Service {
        /// Human readable message describing the service error.
        message: String
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a service error from the provided displayable value.
    pub fn service<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Service {
            message: message.into()
        }
    }

    /// Constructs a network error from the provided displayable value.
    pub fn network<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Network {
            message: message.into()
        }
    }

    /// Constructs a generation error from the provided displayable value.
    pub fn generation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Generation {
            message: message.into()
        }
    }

    /// Constructs a not-found error for the named resource.
    pub fn not_found<M>(resource: M) -> Self
    where
        M: Into<String>
    {
        Self::NotFound {
            resource: resource.into()
        }
    }

    /// Reports whether retrying the failed operation may succeed.
    ///
    /// Missing resources and invalid input are terminal; transport failures,
    /// rate limiting and generation hiccups are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::RateLimited { .. } | Self::Generation { .. }
        )
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation
    /// and is what gets persisted as a failed analysis' reason.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(source: rusqlite::Error) -> Self {
        Self::Storage {
            source
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::BadgeIo`] variant capturing the failing path and source.
pub fn badge_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::BadgeIo {
        path: path.to_path_buf(),
        source
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn validation_constructor_populates_message() {
        let error = Error::validation("something went wrong");
        match error {
            Error::Validation {
                ref message
            } => {
                assert_eq!(message, "something went wrong");
            }
            other => panic!("expected validation error, got {other:?}")
        }
    }

    #[test]
    fn to_display_string_matches_display() {
        let error = Error::not_found("repository octocat/missing");
        assert_eq!(error.to_string(), error.to_display_string());
        assert_eq!(
            error.to_string(),
            "repository octocat/missing not found or is private"
        );
    }

    #[test]
    fn transient_classification_separates_retryable_failures() {
        assert!(Error::network("reset").is_transient());
        assert!(
            Error::RateLimited {
                message: "slow down".to_owned()
            }
            .is_transient()
        );
        assert!(Error::generation("overloaded").is_transient());
        assert!(!Error::not_found("repository").is_transient());
        assert!(!Error::validation("bad url").is_transient());
        assert!(!Error::service("boom").is_transient());
    }

    #[test]
    fn io_error_helper_wraps_path_and_source() {
        let path = std::path::Path::new("/tmp/snapshot.json");
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = super::io_error(path, io_error);

        match error {
            Error::Io {
                path: ref stored_path,
                ref source
            } => {
                assert_eq!(stored_path, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected io error, got {other:?}")
        }
    }

    #[test]
    fn serde_yaml_conversion_maps_to_parse_variant() {
        let error = serde_yaml::from_str::<usize>("not-a-number").unwrap_err();
        let mapped: Error = error.into();
        assert!(matches!(mapped, Error::Parse { .. }));
    }

    #[test]
    fn serde_json_conversion_maps_to_serialize_variant() {
        let invalid = serde_json::from_str::<serde_json::Value>("not-json").unwrap_err();
        let mapped: Error = invalid.into();
        assert!(matches!(mapped, Error::Serialize { .. }));
    }

    #[test]
    fn rusqlite_conversion_maps_to_storage_variant() {
        let mapped: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(mapped, Error::Storage { .. }));
    }
}
