use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use thiserror::Error;

use crate::domain::error::DomainError;

/// Uploaded pictures are shrunk to fit inside this square, aspect preserved.
pub(crate) const PICTURE_MAX_DIMENSION: u32 = 125;

const TOKEN_BYTES: usize = 8;

#[derive(Debug, Error)]
pub(crate) enum MediaError {
    #[error("file name is not usable")]
    InvalidFilename,

    #[error("unsupported image extension '{0}'")]
    UnsupportedExtension(String),

    #[error("image decode failed")]
    Decode(#[source] image::ImageError),

    #[error("image write failed")]
    Encode(#[source] image::ImageError),

    #[error("media io failed")]
    Io(#[from] std::io::Error),
}

impl From<MediaError> for DomainError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidFilename => DomainError::Validation {
                field: "picture",
                message: "file name is not usable",
            },
            MediaError::UnsupportedExtension(_) => DomainError::Validation {
                field: "picture",
                message: "unsupported image extension",
            },
            MediaError::Decode(_) => DomainError::Validation {
                field: "picture",
                message: "must be a decodable image",
            },
            MediaError::Encode(_) | MediaError::Io(_) => DomainError::Unexpected(err.to_string()),
        }
    }
}

/// Stores resized profile pictures under a fixed directory.
///
/// Filenames are an 8-byte random hex token plus the upload's original
/// extension; uniqueness relies on the token's randomness.
#[derive(Debug, Clone)]
pub(crate) struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Result<Self, MediaError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Decodes `data`, resizes it to fit [`PICTURE_MAX_DIMENSION`] and writes
    /// it under a freshly generated name, which is returned.
    pub(crate) fn save_picture(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<String, MediaError> {
        let ext = extension_of(original_name)?;
        if ImageFormat::from_extension(&ext).is_none() {
            return Err(MediaError::UnsupportedExtension(ext));
        }

        let token: [u8; TOKEN_BYTES] = rand::random();
        let base: String = token.iter().map(|byte| format!("{byte:02x}")).collect();
        let filename = format!("{base}.{ext}");

        let img = image::load_from_memory(data).map_err(MediaError::Decode)?;
        // thumbnail() also upscales; images already inside the bounds are kept.
        let thumb = if img.width() > PICTURE_MAX_DIMENSION || img.height() > PICTURE_MAX_DIMENSION
        {
            img.thumbnail(PICTURE_MAX_DIMENSION, PICTURE_MAX_DIMENSION)
        } else {
            img
        };
        thumb
            .save(self.root.join(&filename))
            .map_err(MediaError::Encode)?;

        Ok(filename)
    }

    /// Removes a stored picture; a missing file is not an error.
    pub(crate) fn remove(&self, filename: &str) -> Result<(), MediaError> {
        validate_plain_filename(filename)?;
        match fs::remove_file(self.root.join(filename)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(MediaError::Io(err)),
        }
    }
}

fn extension_of(original_name: &str) -> Result<String, MediaError> {
    validate_plain_filename(original_name)?;
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .ok_or(MediaError::InvalidFilename)
}

fn validate_plain_filename(name: &str) -> Result<(), MediaError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(MediaError::InvalidFilename);
    }
    Ok(())
}
