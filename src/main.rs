use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    coursefetch::logging::init().context("init logging")?;

    let cli = coursefetch::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        coursefetch::cli::Command::Sync(args) => {
            coursefetch::sync::run(args).await.context("sync")?;
        }
        coursefetch::cli::Command::Courses {
            command: coursefetch::cli::CoursesCommand::Refresh(args),
        } => {
            coursefetch::courses::refresh(args)
                .await
                .context("courses refresh")?;
        }
        coursefetch::cli::Command::Courses {
            command: coursefetch::cli::CoursesCommand::Find(args),
        } => {
            coursefetch::courses::find(args).context("courses find")?;
        }
    }

    Ok(())
}
