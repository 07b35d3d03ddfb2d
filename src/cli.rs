//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{DEFAULT_ENDPOINT_URL, DEFAULT_REGION};

#[derive(Parser, Debug)]
#[command(name = "cloudphoto")]
#[command(about = "Photo albums kept in an S3 bucket and published as a static gallery")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: ~/.config/cloudphoto/cloudphotorc)
    #[arg(long, global = true, env = "CLOUDPHOTO_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Save credentials and create a public-read bucket
    Init(InitArgs),
    #[command(flatten)]
    Gallery(GalleryCommand),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct InitArgs {
    #[arg(long, default_value = DEFAULT_REGION)]
    pub region: String,

    #[arg(long, default_value = DEFAULT_ENDPOINT_URL)]
    pub endpoint_url: String,
}

/// Commands that operate on an initialized bucket.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum GalleryCommand {
    /// Upload jpg/jpeg files from a directory into an album
    Upload {
        /// Album name; several words are joined with spaces
        #[arg(long, required = true, num_args = 1..)]
        album: Vec<String>,

        /// Directory with photos
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Download every photo of an album into a directory
    Download {
        /// Album name; several words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        album: Vec<String>,

        /// Existing target directory
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// List albums, or the photos of one album
    List {
        #[arg(long, num_args = 1..)]
        album: Option<Vec<String>>,
    },
    /// Delete an album, or a single photo of it
    Delete {
        #[arg(required = true, num_args = 1..)]
        album: Vec<String>,

        /// Display name of the photo to delete
        #[arg(long)]
        path: Option<String>,
    },
    /// Publish the albums as a static website
    Mksite,
}

/// Join positional name tokens the way they were typed.
#[must_use]
pub fn join_name(tokens: &[String]) -> String {
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(std::iter::once("cloudphoto").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn upload_collects_album_words() {
        let command = parse(&["upload", "--album", "Trip", "2023", "--path", "./pics"]);
        assert_eq!(
            command,
            Command::Gallery(GalleryCommand::Upload {
                album: vec!["Trip".to_string(), "2023".to_string()],
                path: PathBuf::from("./pics"),
            })
        );
    }

    #[test]
    fn upload_path_defaults_to_current_directory() {
        let Command::Gallery(GalleryCommand::Upload { path, .. }) =
            parse(&["upload", "--album", "A"])
        else {
            panic!("expected upload");
        };
        assert_eq!(path, PathBuf::from("."));
    }

    #[test]
    fn upload_requires_album() {
        assert!(Cli::try_parse_from(["cloudphoto", "upload", "--path", "."]).is_err());
    }

    #[test]
    fn list_album_is_optional() {
        assert_eq!(
            parse(&["list"]),
            Command::Gallery(GalleryCommand::List { album: None })
        );
        assert_eq!(
            parse(&["list", "--album", "Trip", "2023"]),
            Command::Gallery(GalleryCommand::List {
                album: Some(vec!["Trip".to_string(), "2023".to_string()])
            })
        );
    }

    #[test]
    fn delete_takes_positional_album_and_photo_path() {
        assert_eq!(
            parse(&["delete", "My", "Album", "--path", "cat.jpg"]),
            Command::Gallery(GalleryCommand::Delete {
                album: vec!["My".to_string(), "Album".to_string()],
                path: Some("cat.jpg".to_string()),
            })
        );
    }

    #[test]
    fn init_uses_default_endpoint() {
        let Command::Init(args) = parse(&["init"]) else {
            panic!("expected init");
        };
        assert_eq!(args.region, DEFAULT_REGION);
        assert_eq!(args.endpoint_url, DEFAULT_ENDPOINT_URL);
    }

    #[test]
    fn join_name_uses_single_spaces() {
        assert_eq!(
            join_name(&["Trip".to_string(), "2023".to_string()]),
            "Trip 2023"
        );
    }
}
