use std::{path::PathBuf, string::FromUtf8Error};

use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum CloudPhotoError {
    #[error("Missing configuration parameters: {}. Please run `cloudphoto init`", .0.join(", "))]
    ConfigMissing(Vec<&'static str>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Photo album not found <{0}>")]
    AlbumNotFound(String),

    #[error("Photo not found <{photo}> in album <{album}>")]
    PhotoNotFound { album: String, photo: String },

    #[error("No such directory <{}>", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Photos not found in directory <{}>", .0.display())]
    NoPhotosFound(PathBuf),

    #[error("Photos not found in album <{0}>")]
    AlbumEmpty(String),

    #[error("Photo albums not found")]
    NoAlbumsFound,

    #[error("Photo name <{0}> cannot be used as a file name")]
    InvalidPhotoName(String),

    #[error("Corrupt index entry {key}: {source}")]
    CorruptIndex {
        key: String,
        #[source]
        source: FromUtf8Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CloudPhotoError {
    /// Whether a failure on a single upload item may be skipped while the
    /// rest of the batch continues.
    ///
    /// Only local I/O failures and transient store failures qualify; anything
    /// else (rejected requests, corrupt index entries) aborts the command.
    #[must_use]
    pub fn is_skippable(&self) -> bool {
        match self {
            CloudPhotoError::Io(_) => true,
            CloudPhotoError::Store(err) => err.is_transient(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudPhotoError>;
