pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod repository;
pub mod site;
pub mod store;

use std::{
    io::{self, BufRead, Write},
    path::Path,
};

use log::{debug, info};

use cli::{Cli, Command, GalleryCommand, InitArgs, join_name};
use config::{Config, DEFAULT_WEBSITE_HOST};
use error::{CloudPhotoError, Result};
use index::MetadataIndex;
use repository::PhotoRepository;
use site::SiteGenerator;
use store::{ObjectStore, S3Store};

/// Run one command-line invocation against the configured bucket.
///
/// # Errors
///
/// Returns the first fatal error of the command.
pub async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };

    match cli.command {
        Command::Init(args) => init(&config_path, &args).await,
        Command::Gallery(command) => {
            let config = Config::load(&config_path)?;
            let index = MetadataIndex::new(S3Store::from_config(&config).await);

            for line in execute(&index, command).await? {
                println!("{line}");
            }
            Ok(())
        }
    }
}

/// Execute a gallery command and return the lines it prints.
///
/// # Errors
///
/// Returns the first fatal error of the command.
pub async fn execute<S: ObjectStore>(
    index: &MetadataIndex<S>,
    command: GalleryCommand,
) -> Result<Vec<String>> {
    debug!("Executing {command:?}");
    let repository = PhotoRepository::new(index);

    match command {
        GalleryCommand::Upload { album, path } => {
            repository.upload(&join_name(&album), &path).await?;
            Ok(Vec::new())
        }
        GalleryCommand::Download { album, path } => {
            repository.download(&join_name(&album), &path).await?;
            Ok(Vec::new())
        }
        GalleryCommand::List { album: None } => repository.list_albums().await,
        GalleryCommand::List { album: Some(album) } => {
            repository.list_photos(&join_name(&album)).await
        }
        GalleryCommand::Delete { album, path: None } => {
            repository.delete_album(&join_name(&album)).await?;
            Ok(Vec::new())
        }
        GalleryCommand::Delete {
            album,
            path: Some(photo),
        } => {
            repository.delete_photo(&join_name(&album), &photo).await?;
            Ok(Vec::new())
        }
        GalleryCommand::Mksite => {
            let report = SiteGenerator::new(index).publish().await?;
            Ok(vec![report.website_url])
        }
    }
}

async fn init(config_path: &Path, args: &InitArgs) -> Result<()> {
    let config = {
        let mut input = io::stdin().lock();
        Config {
            access_key_id: prompt(&mut input, "aws_access_key_id")?,
            secret_access_key: prompt(&mut input, "aws_secret_access_key")?,
            bucket: prompt(&mut input, "bucket")?,
            region: args.region.clone(),
            endpoint_url: args.endpoint_url.clone(),
            website_host: DEFAULT_WEBSITE_HOST.to_string(),
        }
    };
    config.save(config_path)?;

    let store = S3Store::from_config(&config).await;
    store.create_bucket().await?;
    store.make_public().await?;

    info!("Initialized bucket {}", store.bucket());
    Ok(())
}

fn prompt(input: &mut impl BufRead, field: &'static str) -> Result<String> {
    print!("Enter {field}: ");
    io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let value = line.trim();
    if value.is_empty() {
        return Err(CloudPhotoError::ConfigMissing(vec![field]));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use super::*;
    use crate::store::MemoryStore;

    fn index() -> MetadataIndex<MemoryStore> {
        MetadataIndex::new(MemoryStore::new("bucket"))
    }

    fn words(name: &str) -> Vec<String> {
        name.split(' ').map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn upload_then_list_album_scenario() {
        let index = index();
        let pics = tempfile::tempdir().unwrap();
        for name in ["a.jpg", "b.jpeg", "c.txt"] {
            fs::write(pics.path().join(name), name).unwrap();
        }

        let output = execute(
            &index,
            GalleryCommand::Upload {
                album: words("Trip 2023"),
                path: pics.path().to_path_buf(),
            },
        )
        .await
        .unwrap();
        assert!(output.is_empty());

        let mut listed = execute(
            &index,
            GalleryCommand::List {
                album: Some(words("Trip 2023")),
            },
        )
        .await
        .unwrap();
        listed.sort();
        assert_eq!(listed, vec!["a.jpg", "b.jpeg"]);

        let albums = execute(&index, GalleryCommand::List { album: None })
            .await
            .unwrap();
        assert_eq!(albums, vec!["Trip 2023"]);
    }

    #[tokio::test]
    async fn delete_without_photo_drops_album() {
        let index = index();
        index.create_album("Old").await.unwrap();
        index.create_album("New").await.unwrap();

        execute(
            &index,
            GalleryCommand::Delete {
                album: words("Old"),
                path: None,
            },
        )
        .await
        .unwrap();

        let albums = execute(&index, GalleryCommand::List { album: None })
            .await
            .unwrap();
        assert_eq!(albums, vec!["New"]);
    }

    #[tokio::test]
    async fn unknown_album_is_fatal() {
        let err = execute(
            &index(),
            GalleryCommand::Download {
                album: words("No Such Album"),
                path: PathBuf::from("."),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Photo album not found <No Such Album>");
    }

    #[tokio::test]
    async fn mksite_prints_website_url() {
        let index = index();
        index.create_album("A").await.unwrap();

        let output = execute(&index, GalleryCommand::Mksite).await.unwrap();
        assert_eq!(output, vec!["memory://bucket/"]);
    }

    #[test]
    fn prompt_trims_and_rejects_blank_input() {
        let mut input = io::Cursor::new("  key-id \n\n");
        assert_eq!(prompt(&mut input, "aws_access_key_id").unwrap(), "key-id");
        assert!(matches!(
            prompt(&mut input, "bucket").unwrap_err(),
            CloudPhotoError::ConfigMissing(fields) if fields == vec!["bucket"]
        ));
    }
}
