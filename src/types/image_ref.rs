// ABOUTME: Image reference parsing for the wait command.
// ABOUTME: Splits "repository[:tag]" into its parts, defaulting the tag to "latest".

use std::fmt;
use thiserror::Error;

pub const DEFAULT_TAG: &str = "latest";

/// Malformed image string. Both variants are the `InvalidImageFormat` case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseImageRefError {
    #[error("invalid image \"\", please specify an image")]
    Empty,

    #[error("invalid image \"{0}\": found more than one colon")]
    TooManyColons(String),

    #[error("invalid image \"{0}\": repository name is empty")]
    EmptyRepository(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    repository: String,
    tag: String,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        let segments: Vec<&str> = input.split(':').collect();

        match segments.as_slice() {
            ["", ..] if segments.len() <= 2 => {
                Err(ParseImageRefError::EmptyRepository(input.to_string()))
            }
            [repository] => Ok(Self {
                repository: (*repository).to_string(),
                tag: DEFAULT_TAG.to_string(),
            }),
            [repository, tag] => Ok(Self {
                repository: (*repository).to_string(),
                tag: (*tag).to_string(),
            }),
            _ => Err(ParseImageRefError::TooManyColons(input.to_string())),
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Render `<registry>/<repository>:<tag>`.
    pub fn full_reference(&self, registry: &str) -> String {
        format!("{}/{}", registry, self)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}
