//! Album and photo operations behind the command-line verbs.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use log::{debug, info, warn};
use strum::{Display, EnumString};

use crate::{
    error::{CloudPhotoError, Result},
    index::{AlbumId, MetadataIndex},
    store::ObjectStore,
};

/// File extensions accepted for upload, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ImageExtension {
    Jpg,
    Jpeg,
}

impl ImageExtension {
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| Self::from_str(ext).ok())
    }
}

/// A file left out of an upload batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    pub skipped: Vec<SkippedFile>,
}

pub struct PhotoRepository<'a, S> {
    index: &'a MetadataIndex<S>,
}

impl<'a, S: ObjectStore> PhotoRepository<'a, S> {
    pub fn new(index: &'a MetadataIndex<S>) -> Self {
        Self { index }
    }

    /// Upload every jpg/jpeg file found directly inside `directory`.
    ///
    /// The directory is validated before anything is written. Files that fail
    /// with an I/O or transient store error are skipped and reported; any
    /// other failure aborts the batch, leaving earlier uploads in place.
    ///
    /// # Errors
    ///
    /// Returns [`CloudPhotoError::DirectoryNotFound`],
    /// [`CloudPhotoError::NoPhotosFound`], or the first non-skippable failure.
    pub async fn upload(&self, album_name: &str, directory: &Path) -> Result<UploadReport> {
        ensure_directory(directory).await?;

        let files = image_files(directory).await?;
        if files.is_empty() {
            return Err(CloudPhotoError::NoPhotosFound(directory.to_path_buf()));
        }

        let album = self.resolve_or_create(album_name).await?;
        let mut report = UploadReport::default();

        for (name, path) in files {
            match self.upload_file(&album, &name, &path).await {
                Ok(()) => report.uploaded.push(name),
                Err(e) if e.is_skippable() => {
                    warn!("Photo not sent <{name}>: {e}");
                    report.skipped.push(SkippedFile {
                        name,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Uploaded {} photos to <{album_name}>, skipped {}",
            report.uploaded.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    async fn resolve_or_create(&self, album_name: &str) -> Result<AlbumId> {
        match self.index.resolve_album(album_name).await? {
            Some(album) => Ok(album),
            None => self.index.create_album(album_name).await,
        }
    }

    async fn upload_file(&self, album: &AlbumId, name: &str, path: &Path) -> Result<()> {
        let body = tokio::fs::read(path).await?;
        let content_type = mime_guess::from_path(path).first_or(mime::IMAGE_JPEG);
        debug!("Uploading {} ({} bytes)", path.display(), body.len());

        self.index
            .upsert_photo(album, name, body, content_type.essence_str())
            .await?;
        Ok(())
    }

    /// Save every photo of the album into `directory` under its display name.
    ///
    /// # Errors
    ///
    /// Returns [`CloudPhotoError::DirectoryNotFound`],
    /// [`CloudPhotoError::AlbumNotFound`], [`CloudPhotoError::InvalidPhotoName`],
    /// or any store or filesystem failure.
    pub async fn download(&self, album_name: &str, directory: &Path) -> Result<usize> {
        ensure_directory(directory).await?;
        let album = self.index.require_album(album_name).await?;

        let photos = self.index.list_photos(&album).await?;
        for photo in &photos {
            let target = directory.join(local_file_name(&photo.name)?);
            let body = self.index.fetch_photo(&album, &photo.id).await?;
            tokio::fs::write(&target, body).await?;
            debug!("Downloaded <{}> to {}", photo.name, target.display());
        }

        info!(
            "Downloaded {} photos from <{album_name}> to {}",
            photos.len(),
            directory.display()
        );
        Ok(photos.len())
    }

    /// Album names in page order.
    ///
    /// # Errors
    ///
    /// Returns [`CloudPhotoError::NoAlbumsFound`] if the bucket has no albums.
    pub async fn list_albums(&self) -> Result<Vec<String>> {
        let names: Vec<String> = self.index.list_albums().await?.into_keys().collect();
        if names.is_empty() {
            return Err(CloudPhotoError::NoAlbumsFound);
        }
        Ok(names)
    }

    /// Display names of the album's photos, in index order.
    ///
    /// # Errors
    ///
    /// Returns [`CloudPhotoError::AlbumNotFound`] or
    /// [`CloudPhotoError::AlbumEmpty`].
    pub async fn list_photos(&self, album_name: &str) -> Result<Vec<String>> {
        let album = self.index.require_album(album_name).await?;
        let names: Vec<String> = self
            .index
            .list_photos(&album)
            .await?
            .into_iter()
            .map(|photo| photo.name)
            .collect();

        if names.is_empty() {
            return Err(CloudPhotoError::AlbumEmpty(album_name.to_string()));
        }
        Ok(names)
    }

    /// # Errors
    ///
    /// Returns [`CloudPhotoError::AlbumNotFound`] or a store failure.
    pub async fn delete_album(&self, album_name: &str) -> Result<()> {
        let album = self.index.require_album(album_name).await?;
        self.index.delete_album(&album).await?;
        Ok(())
    }

    /// Delete the photo with this display name from the album.
    ///
    /// # Errors
    ///
    /// Returns [`CloudPhotoError::AlbumNotFound`],
    /// [`CloudPhotoError::PhotoNotFound`], or a store failure.
    pub async fn delete_photo(&self, album_name: &str, photo_name: &str) -> Result<()> {
        let album = self.index.require_album(album_name).await?;

        let mut found = false;
        for photo in self.index.list_photos(&album).await? {
            if photo.name == photo_name {
                self.index.delete_photo(&album, &photo.id).await?;
                found = true;
            }
        }

        if !found {
            return Err(CloudPhotoError::PhotoNotFound {
                album: album_name.to_string(),
                photo: photo_name.to_string(),
            });
        }

        info!("Deleted photo <{photo_name}> from <{album_name}>");
        Ok(())
    }
}

async fn ensure_directory(directory: &Path) -> Result<()> {
    match tokio::fs::metadata(directory).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        _ => Err(CloudPhotoError::DirectoryNotFound(directory.to_path_buf())),
    }
}

/// Image files directly inside `directory`, sorted by name.
async fn image_files(directory: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(directory).await?;

    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            continue;
        }

        let path = entry.path();
        if ImageExtension::from_path(&path).is_none() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => files.push((name, path)),
            Err(name) => warn!("Skipping file with non UTF-8 name {}", name.to_string_lossy()),
        }
    }

    files.sort();
    Ok(files)
}

/// A display name usable as a single path component inside the target directory.
fn local_file_name(name: &str) -> Result<&str> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(CloudPhotoError::InvalidPhotoName(name.to_string()));
    }
    Ok(name)
}
