use std::process::ExitCode;

use clap::Parser;
use cloudphoto::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("cloudphoto=warn"))
        .init();

    let cli = Cli::parse();

    match cloudphoto::run(cli).await {
        Ok(()) => {
            log::debug!("Command finished successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Command failed: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
