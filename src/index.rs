//! Name ↔ identifier index kept inside the bucket itself.
//!
//! The bucket has no secondary indexes, so every name lives as the body of a
//! small object whose key carries the identifier:
//!
//! ```text
//! albums/{album_id}                  -> album name
//! photos_name/{album_id}/{photo_id}  -> photo display name
//! photos/{album_id}/{photo_id}       -> image bytes
//! ```
//!
//! Lookups are prefix scans followed by a read of every matching object.
//! This module is the only place that builds or parses those keys.

use std::{collections::BTreeMap, fmt};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::{CloudPhotoError, Result},
    store::ObjectStore,
};

const ALBUM_PREFIX: &str = "albums";
const PHOTO_PREFIX: &str = "photos";
const PHOTO_NAME_PREFIX: &str = "photos_name";

/// Opaque album identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlbumId(String);

/// Opaque photo identifier, unique within its album.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotoId(String);

impl AlbumId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PhotoId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoEntry {
    pub id: PhotoId,
    pub name: String,
}

fn album_key(album: &AlbumId) -> String {
    format!("{ALBUM_PREFIX}/{album}")
}

fn photo_key(album: &AlbumId, photo: &PhotoId) -> String {
    format!("{PHOTO_PREFIX}/{album}/{photo}")
}

fn photo_name_key(album: &AlbumId, photo: &PhotoId) -> String {
    format!("{PHOTO_NAME_PREFIX}/{album}/{photo}")
}

fn photo_prefix(album: &AlbumId) -> String {
    format!("{PHOTO_PREFIX}/{album}/")
}

fn photo_name_prefix(album: &AlbumId) -> String {
    format!("{PHOTO_NAME_PREFIX}/{album}/")
}

/// Identifier part of `{prefix}{id}`, rejecting folder markers and nested keys.
fn trailing_id<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    key.strip_prefix(prefix)
        .filter(|id| !id.is_empty() && !id.contains('/'))
}

/// Typed lookups over the album and photo namespaces of one bucket.
#[derive(Debug)]
pub struct MetadataIndex<S> {
    store: S,
}

impl<S: ObjectStore> MetadataIndex<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn read_name(&self, key: &str) -> Result<String> {
        let body = self.store.get(key).await?;
        String::from_utf8(body).map_err(|source| CloudPhotoError::CorruptIndex {
            key: key.to_string(),
            source,
        })
    }

    /// All albums, keyed and ordered by name.
    ///
    /// The order is plain code-point order and determines site page numbers.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or an album record is not UTF-8.
    pub async fn list_albums(&self) -> Result<BTreeMap<String, AlbumId>> {
        let prefix = format!("{ALBUM_PREFIX}/");
        let mut albums = BTreeMap::new();

        for key in self.store.list(&prefix).await? {
            let Some(id) = trailing_id(&key, &prefix) else {
                debug!("Skipping unexpected album key {key}");
                continue;
            };

            let name = self.read_name(&key).await?;
            if let Some(previous) = albums.insert(name.clone(), AlbumId(id.to_string())) {
                warn!("Album name <{name}> is recorded twice, ignoring {previous}");
            }
        }

        debug!("Found {} albums", albums.len());
        Ok(albums)
    }

    /// # Errors
    ///
    /// Returns an error if listing albums fails.
    pub async fn resolve_album(&self, name: &str) -> Result<Option<AlbumId>> {
        Ok(self.list_albums().await?.remove(name))
    }

    /// Like [`Self::resolve_album`], but an unknown name is an error.
    ///
    /// # Errors
    ///
    /// Returns [`CloudPhotoError::AlbumNotFound`] if no album has this name.
    pub async fn require_album(&self, name: &str) -> Result<AlbumId> {
        self.resolve_album(name)
            .await?
            .ok_or_else(|| CloudPhotoError::AlbumNotFound(name.to_string()))
    }

    /// Photos of an album in listing order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or a name entry is not UTF-8.
    pub async fn list_photos(&self, album: &AlbumId) -> Result<Vec<PhotoEntry>> {
        let prefix = photo_name_prefix(album);
        let mut photos = Vec::new();

        for key in self.store.list(&prefix).await? {
            let Some(id) = trailing_id(&key, &prefix) else {
                debug!("Skipping unexpected photo name key {key}");
                continue;
            };

            photos.push(PhotoEntry {
                id: PhotoId(id.to_string()),
                name: self.read_name(&key).await?,
            });
        }

        debug!("Found {} photos in album {album}", photos.len());
        Ok(photos)
    }

    /// Record a new album. Callers must check the name is free first.
    ///
    /// # Errors
    ///
    /// Returns an error if the album record cannot be written.
    pub async fn create_album(&self, name: &str) -> Result<AlbumId> {
        let id = AlbumId::generate();
        self.store
            .put(
                &album_key(&id),
                name.as_bytes().to_vec(),
                mime::TEXT_PLAIN_UTF_8.as_ref(),
            )
            .await?;
        info!("Created album <{name}> as {id}");
        Ok(id)
    }

    /// Store a photo under `name`, replacing any photo of the album that
    /// already carries that display name.
    ///
    /// The name entry is written first and removed again if the image
    /// cannot be stored, so a failed upload leaves no listed photo behind.
    ///
    /// # Errors
    ///
    /// Returns an error if any scan, delete or write fails.
    pub async fn upsert_photo(
        &self,
        album: &AlbumId,
        name: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<PhotoId> {
        for existing in self.list_photos(album).await? {
            if existing.name == name {
                debug!("Replacing photo <{name}> ({}) in album {album}", existing.id);
                self.delete_photo(album, &existing.id).await?;
            }
        }

        let id = PhotoId::generate();
        self.store
            .put(
                &photo_name_key(album, &id),
                name.as_bytes().to_vec(),
                mime::TEXT_PLAIN_UTF_8.as_ref(),
            )
            .await?;
        if let Err(err) = self
            .store
            .put(&photo_key(album, &id), body, content_type)
            .await
        {
            if let Err(cleanup) = self.store.delete(&photo_name_key(album, &id)).await {
                warn!("Left name entry for <{name}> ({id}) without an image: {cleanup}");
            }
            return Err(err.into());
        }

        info!("Stored photo <{name}> as {id} in album {album}");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns an error if the image object cannot be read.
    pub async fn fetch_photo(&self, album: &AlbumId, photo: &PhotoId) -> Result<Vec<u8>> {
        Ok(self.store.get(&photo_key(album, photo)).await?)
    }

    /// Remove the image and then its name entry.
    ///
    /// # Errors
    ///
    /// Returns an error if either delete fails.
    pub async fn delete_photo(&self, album: &AlbumId, photo: &PhotoId) -> Result<()> {
        self.store.delete(&photo_key(album, photo)).await?;
        self.store.delete(&photo_name_key(album, photo)).await?;
        debug!("Deleted photo {photo} from album {album}");
        Ok(())
    }

    /// Remove every object belonging to the album.
    ///
    /// The album record goes last, so an interrupted delete can be repeated.
    ///
    /// # Errors
    ///
    /// Returns an error if listing or deleting fails.
    pub async fn delete_album(&self, album: &AlbumId) -> Result<usize> {
        let mut deleted = 0;

        for prefix in [photo_prefix(album), photo_name_prefix(album)] {
            for key in self.store.list(&prefix).await? {
                self.store.delete(&key).await?;
                deleted += 1;
            }
        }

        self.store.delete(&album_key(album)).await?;
        deleted += 1;

        info!("Deleted album {album} ({deleted} objects)");
        Ok(deleted)
    }

    /// Public URL of a photo's image object.
    #[must_use]
    pub fn photo_url(&self, album: &AlbumId, photo: &PhotoId) -> String {
        self.store.object_url(&photo_key(album, photo))
    }
}
