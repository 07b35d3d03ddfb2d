use std::{
    env, fs,
    path::{Path, PathBuf},
};

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CloudPhotoError, Result};

pub const DEFAULT_REGION: &str = "ru-central1";
pub const DEFAULT_ENDPOINT_URL: &str = "https://storage.yandexcloud.net";
pub const DEFAULT_WEBSITE_HOST: &str = "website.yandexcloud.net";

const CONFIG_RELATIVE_PATH: &str = ".config/cloudphoto/cloudphotorc";

/// Credentials and bucket coordinates for every command except `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    pub region: String,
    pub endpoint_url: String,
    pub website_host: String,
}

/// On-disk layout: a single `[DEFAULT]` table.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(rename = "DEFAULT", default)]
    default: ConfigSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    aws_access_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aws_secret_access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    website_host: Option<String>,
}

impl Config {
    /// Location of the config file under the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if neither `HOME` nor `USERPROFILE` is set.
    pub fn default_path() -> Result<PathBuf> {
        env::var_os("HOME")
            .or_else(|| env::var_os("USERPROFILE"))
            .map(|home| PathBuf::from(home).join(CONFIG_RELATIVE_PATH))
            .ok_or_else(|| {
                CloudPhotoError::Config("cannot locate home directory".to_string())
            })
    }

    /// Load and validate the persisted configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CloudPhotoError::ConfigMissing`] when the file or any required
    /// field is absent, [`CloudPhotoError::ConfigParse`] when the file is not
    /// valid TOML, and [`CloudPhotoError::Config`] for an invalid endpoint URL.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());

        let section = match fs::read_to_string(path) {
            Ok(content) => {
                toml::from_str::<ConfigFile>(&content)
                    .map_err(|source| {
                        error!("Failed to parse {}: {source}", path.display());
                        CloudPhotoError::ConfigParse {
                            path: path.to_path_buf(),
                            source,
                        }
                    })?
                    .default
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                error!("Configuration file {} not found", path.display());
                ConfigSection::default()
            }
            Err(e) => return Err(e.into()),
        };

        let config = Self::from_section(section)?;

        info!("Configuration loaded successfully");
        debug!("Bucket: {}", config.bucket);
        debug!("Region: {}", config.region);
        debug!("Endpoint: {}", config.endpoint_url);
        debug!(
            "Secret access key length: {} characters",
            config.secret_access_key.len()
        );

        Ok(config)
    }

    fn from_section(section: ConfigSection) -> Result<Self> {
        let mut missing = Vec::new();
        let mut require = |value: Option<String>, name: &'static str| {
            let value = value.filter(|value| !value.trim().is_empty());
            if value.is_none() {
                missing.push(name);
            }
            value.unwrap_or_default()
        };

        let access_key_id = require(section.aws_access_key_id, "aws_access_key_id");
        let secret_access_key = require(section.aws_secret_access_key, "aws_secret_access_key");
        let bucket = require(section.bucket, "bucket");
        let region = require(section.region, "region");
        let endpoint_url = require(section.endpoint_url, "endpoint_url");

        if !missing.is_empty() {
            return Err(CloudPhotoError::ConfigMissing(missing));
        }

        Url::parse(&endpoint_url).map_err(|e| {
            CloudPhotoError::Config(format!("invalid endpoint_url <{endpoint_url}>: {e}"))
        })?;

        Ok(Self {
            access_key_id,
            secret_access_key,
            bucket,
            region,
            endpoint_url,
            website_host: section
                .website_host
                .unwrap_or_else(|| DEFAULT_WEBSITE_HOST.to_string()),
        })
    }

    /// Persist the configuration, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be serialized or written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = ConfigFile {
            default: ConfigSection {
                aws_access_key_id: Some(self.access_key_id.clone()),
                aws_secret_access_key: Some(self.secret_access_key.clone()),
                bucket: Some(self.bucket.clone()),
                region: Some(self.region.clone()),
                endpoint_url: Some(self.endpoint_url.clone()),
                website_host: Some(self.website_host.clone()),
            },
        };
        fs::write(path, toml::to_string(&file)?)?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Public address of the bucket's static website.
    #[must_use]
    pub fn website_url(&self) -> String {
        format!("https://{}.{}", self.bucket, self.website_host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            bucket: "photos".to_string(),
            region: DEFAULT_REGION.to_string(),
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            website_host: DEFAULT_WEBSITE_HOST.to_string(),
        }
    }

    #[test]
    fn save_then_load_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/cloudphotorc");

        sample().save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded, sample());
    }

    #[test]
    fn missing_file_reports_every_required_field() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent")).unwrap_err();

        match err {
            CloudPhotoError::ConfigMissing(fields) => assert_eq!(
                fields,
                vec![
                    "aws_access_key_id",
                    "aws_secret_access_key",
                    "bucket",
                    "region",
                    "endpoint_url"
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_fields_count_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloudphotorc");
        fs::write(
            &path,
            "[DEFAULT]\naws_access_key_id = \"k\"\naws_secret_access_key = \"s\"\nbucket = \"  \"\nregion = \"r\"\nendpoint_url = \"https://example.com\"\n",
        )
        .unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, CloudPhotoError::ConfigMissing(fields) if fields == vec!["bucket"]));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloudphotorc");
        let mut config = sample();
        config.endpoint_url = "not a url".to_string();
        config.save(&path).unwrap();

        assert!(matches!(
            Config::load(&path).unwrap_err(),
            CloudPhotoError::Config(_)
        ));
    }

    #[test]
    fn unparseable_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloudphotorc");
        fs::write(&path, "[DEFAULT\nbucket = ").unwrap();

        assert!(matches!(
            Config::load(&path).unwrap_err(),
            CloudPhotoError::ConfigParse { .. }
        ));
    }

    #[test]
    fn website_url_uses_bucket_subdomain() {
        assert_eq!(
            sample().website_url(),
            "https://photos.website.yandexcloud.net"
        );
    }
}
