//! Static gallery generation.
//!
//! Pages are rendered from the index on every build and written back into
//! the bucket, which then serves them as a static website:
//!
//! - `index.html`: one link per album, in album name order
//! - `album{n}.html`: Galleria viewer for the n-th album (1-based)
//! - `error.html`: fallback document
//!
//! Album pages are addressed by position, so adding or removing an album
//! renumbers the pages of every album sorted after it.

use log::{debug, info};
use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::{
    error::Result,
    index::{AlbumId, MetadataIndex, PhotoId},
    store::ObjectStore,
};

pub const INDEX_PAGE: &str = "index.html";
pub const ERROR_PAGE: &str = "error.html";

const SITE_TITLE: &str = "Photo archive";
const GALLERIA_CSS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/galleria/1.6.1/themes/classic/galleria.classic.min.css";
const GALLERIA_JS: &str = "https://cdnjs.cloudflare.com/ajax/libs/galleria/1.6.1/galleria.min.js";
const GALLERIA_THEME_JS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/galleria/1.6.1/themes/classic/galleria.classic.min.js";
const JQUERY_JS: &str = "https://ajax.googleapis.com/ajax/libs/jquery/3.6.0/jquery.min.js";

/// Object key of the n-th album page.
#[must_use]
pub fn album_page_key(position: usize) -> String {
    format!("album{position}.html")
}

/// Position encoded in an `album{n}.html` key, exactly as [`album_page_key`]
/// writes it: decimal digits without sign or leading zero.
fn album_page_position(key: &str) -> Option<usize> {
    let digits = key.strip_prefix("album")?.strip_suffix(".html")?;
    if digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Outcome of a site build.
#[derive(Debug, Default)]
pub struct SiteReport {
    /// Keys of every page written, index first.
    pub pages: Vec<String>,
    /// Album pages from earlier builds that no longer correspond to an album.
    pub removed: Vec<String>,
    pub website_url: String,
}

// ============================================================================
// Renderers
// ============================================================================

fn base_document(title: &str, head_extra: &Markup, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta http-equiv="Content-Type" content="text/html; charset=utf-8";
                title { (title) }
                (head_extra)
            }
            body {
                (content)
            }
        }
    }
}

/// `<img>` tag pointing straight at the photo object, captioned by its name.
#[must_use]
pub fn image_tag(url: &str, display_name: &str) -> Markup {
    html! {
        img src=(url) data-title=(display_name);
    }
}

/// Index page listing `albums` in the given order.
#[must_use]
pub fn render_index(albums: &[String]) -> Markup {
    let content = html! {
        h1 { (SITE_TITLE) }
        ul {
            @for (position, name) in albums.iter().enumerate() {
                li {
                    a href=(album_page_key(position + 1)) { (name) }
                }
            }
        }
    };
    base_document(SITE_TITLE, &html! {}, &content)
}

/// Album page with a Galleria viewer over the given image tags.
#[must_use]
pub fn render_album(album_name: &str, images: &[Markup]) -> Markup {
    let head = html! {
        link rel="stylesheet" type="text/css" href=(GALLERIA_CSS);
        style { ".galleria { width: 960px; height: 540px; background: #000 }" }
        script src=(JQUERY_JS) {}
        script src=(GALLERIA_JS) {}
        script src=(GALLERIA_THEME_JS) {}
    };
    let content = html! {
        h1 { (album_name) }
        div.galleria {
            @for image in images {
                (image)
            }
        }
        p {
            "Back to the " a href=(INDEX_PAGE) { "main page" } " of the photo archive"
        }
        script { (PreEscaped("(function() { Galleria.run('.galleria'); }());")) }
    };
    base_document(album_name, &head, &content)
}

#[must_use]
pub fn render_error() -> Markup {
    let content = html! {
        h1 { "Error" }
        p {
            "Error accessing the photo archive. Return to the "
            a href=(INDEX_PAGE) { "main page" }
            " of the photo archive."
        }
    };
    base_document(SITE_TITLE, &html! {}, &content)
}

// ============================================================================
// Generator
// ============================================================================

/// Renders the current index into page objects of the same bucket.
pub struct SiteGenerator<'a, S> {
    index: &'a MetadataIndex<S>,
}

impl<'a, S: ObjectStore> SiteGenerator<'a, S> {
    pub fn new(index: &'a MetadataIndex<S>) -> Self {
        Self { index }
    }

    async fn write_page(&self, key: &str, page: Markup) -> Result<()> {
        self.index
            .store()
            .put(key, page.into_string().into_bytes(), mime::TEXT_HTML.as_ref())
            .await?;
        debug!("Wrote {key}");
        Ok(())
    }

    /// Render one album into `album{position}.html`.
    ///
    /// # Errors
    ///
    /// Returns an error if the album cannot be listed or the page written.
    pub async fn build_album_page(
        &self,
        album: &AlbumId,
        album_name: &str,
        position: usize,
    ) -> Result<String> {
        let images: Vec<Markup> = self
            .index
            .list_photos(album)
            .await?
            .iter()
            .map(|photo| image_tag(&self.photo_url(album, &photo.id), &photo.name))
            .collect();

        let key = album_page_key(position);
        self.write_page(&key, render_album(album_name, &images)).await?;
        Ok(key)
    }

    fn photo_url(&self, album: &AlbumId, photo: &PhotoId) -> String {
        self.index.photo_url(album, photo)
    }

    /// # Errors
    ///
    /// Returns an error if the page cannot be written.
    pub async fn build_error_page(&self) -> Result<String> {
        self.write_page(ERROR_PAGE, render_error()).await?;
        Ok(ERROR_PAGE.to_string())
    }

    /// Write the index page, every album page and the error page, then drop
    /// album pages left over from a build with more albums.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read or any page written.
    pub async fn build_index_page(&self) -> Result<SiteReport> {
        let albums = self.index.list_albums().await?;
        let names: Vec<String> = albums.keys().cloned().collect();

        let mut report = SiteReport {
            website_url: self.index.store().website_url(),
            ..SiteReport::default()
        };

        self.write_page(INDEX_PAGE, render_index(&names)).await?;
        report.pages.push(INDEX_PAGE.to_string());

        for (position, (name, album)) in albums.iter().enumerate() {
            let key = self.build_album_page(album, name, position + 1).await?;
            report.pages.push(key);
        }

        report.pages.push(self.build_error_page().await?);
        report.removed = self.prune_album_pages(albums.len()).await?;

        info!(
            "Generated {} pages for {} albums",
            report.pages.len(),
            albums.len()
        );
        Ok(report)
    }

    async fn prune_album_pages(&self, album_count: usize) -> Result<Vec<String>> {
        let store = self.index.store();
        let mut removed = Vec::new();

        for key in store.list("album").await? {
            if album_page_position(&key).is_some_and(|position| position > album_count) {
                store.delete(&key).await?;
                debug!("Removed stale page {key}");
                removed.push(key);
            }
        }

        Ok(removed)
    }

    /// Enable website hosting on the bucket and regenerate the whole site.
    ///
    /// # Errors
    ///
    /// Returns an error if hosting cannot be configured or generation fails.
    pub async fn publish(&self) -> Result<SiteReport> {
        self.index
            .store()
            .configure_website(INDEX_PAGE, ERROR_PAGE)
            .await?;
        info!("Website hosting enabled");

        self.build_index_page().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, WebsiteSettings};

    fn index() -> MetadataIndex<MemoryStore> {
        MetadataIndex::new(MemoryStore::new("bucket"))
    }

    async fn page(index: &MetadataIndex<MemoryStore>, key: &str) -> String {
        String::from_utf8(index.store().get(key).await.unwrap()).unwrap()
    }

    #[test]
    fn image_tag_embeds_url_and_caption() {
        let tag = image_tag("https://host/b/photos/1/2", "cat.jpg").into_string();
        assert_eq!(
            tag,
            r#"<img src="https://host/b/photos/1/2" data-title="cat.jpg">"#
        );
    }

    #[test]
    fn names_are_escaped() {
        let html = render_index(&["<script>".to_string()]).into_string();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn album_page_positions_parse_only_page_keys() {
        assert_eq!(album_page_position("album12.html"), Some(12));
        assert_eq!(album_page_position("albums/abc"), None);
        assert_eq!(album_page_position("album.html"), None);
        assert_eq!(album_page_position("album+3.html"), None);
        assert_eq!(album_page_position("album007.html"), None);
        assert_eq!(album_page_position("album0.html"), None);
    }

    #[test]
    fn index_page_depends_only_on_album_names() {
        let names = vec!["A".to_string(), "B".to_string()];
        assert_eq!(
            render_index(&names).into_string(),
            render_index(&names).into_string()
        );
    }

    #[tokio::test]
    async fn lookalike_page_keys_survive_pruning() {
        let index = index();
        index.create_album("A").await.unwrap();
        for key in ["album+3.html", "album007.html"] {
            index
                .store()
                .put(key, b"keep".to_vec(), "text/html")
                .await
                .unwrap();
        }

        let report = SiteGenerator::new(&index).build_index_page().await.unwrap();

        assert!(report.removed.is_empty());
        let keys = index.store().keys().await;
        assert!(keys.contains(&"album+3.html".to_string()));
        assert!(keys.contains(&"album007.html".to_string()));
    }

    #[tokio::test]
    async fn pages_are_numbered_by_sorted_name() {
        let index = index();
        for name in ["B", "A", "C"] {
            let id = index.create_album(name).await.unwrap();
            index
                .upsert_photo(&id, &format!("{name}.jpg"), b"x".to_vec(), "image/jpeg")
                .await
                .unwrap();
        }

        let report = SiteGenerator::new(&index).build_index_page().await.unwrap();
        assert_eq!(
            report.pages,
            vec![
                "index.html",
                "album1.html",
                "album2.html",
                "album3.html",
                "error.html"
            ]
        );

        for (key, name) in [("album1.html", "A"), ("album2.html", "B"), ("album3.html", "C")] {
            assert!(page(&index, key).await.contains(&format!("data-title=\"{name}.jpg\"")));
        }

        let index_page = page(&index, "index.html").await;
        for (key, name) in [("album1.html", "A"), ("album2.html", "B"), ("album3.html", "C")] {
            assert!(index_page.contains(&format!(r#"<a href="{key}">{name}</a>"#)));
        }
    }

    #[tokio::test]
    async fn album_page_links_photo_objects() {
        let index = index();
        let album = index.create_album("A").await.unwrap();
        let photo = index
            .upsert_photo(&album, "p.jpg", b"x".to_vec(), "image/jpeg")
            .await
            .unwrap();

        SiteGenerator::new(&index)
            .build_album_page(&album, "A", 1)
            .await
            .unwrap();

        let html = page(&index, "album1.html").await;
        assert!(html.contains(&format!("src=\"memory://bucket/photos/{album}/{photo}\"")));
        assert!(html.contains("Galleria.run('.galleria');"));
        assert!(html.contains(r#"href="index.html""#));
    }

    #[tokio::test]
    async fn pages_are_served_as_html() {
        let index = index();
        index.create_album("A").await.unwrap();
        SiteGenerator::new(&index).build_index_page().await.unwrap();

        for key in ["index.html", "album1.html", "error.html"] {
            assert_eq!(
                index.store().content_type(key).await.as_deref(),
                Some("text/html")
            );
        }
    }

    #[tokio::test]
    async fn stale_album_pages_are_removed() {
        let index = index();
        let generator = SiteGenerator::new(&index);
        let a = index.create_album("A").await.unwrap();
        index.create_album("B").await.unwrap();
        generator.build_index_page().await.unwrap();

        let b = index.require_album("B").await.unwrap();
        index.delete_album(&b).await.unwrap();
        let report = generator.build_index_page().await.unwrap();

        assert_eq!(report.removed, vec!["album2.html"]);
        let keys = index.store().keys().await;
        assert!(keys.contains(&"album1.html".to_string()));
        assert!(!keys.contains(&"album2.html".to_string()));
        assert!(keys.contains(&format!("albums/{a}")));
    }

    #[tokio::test]
    async fn publish_configures_hosting_and_reports_url() {
        let index = index();
        index.create_album("A").await.unwrap();

        let report = SiteGenerator::new(&index).publish().await.unwrap();

        assert_eq!(report.website_url, "memory://bucket/");
        assert_eq!(
            index.store().website().await,
            Some(WebsiteSettings {
                index_document: "index.html".to_string(),
                error_document: "error.html".to_string(),
            })
        );
        assert!(page(&index, "error.html").await.contains("Error"));
    }
}
