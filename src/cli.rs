use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download unread attachments for every watch-list entry.
    Sync(SyncArgs),
    Courses {
        #[command(subcommand)]
        command: CoursesCommand,
    },
}

#[derive(Debug, Args)]
pub struct ConfigArg {
    /// Path to the YAML settings file.
    #[arg(long, default_value = "coursefetch.yaml")]
    pub config: PathBuf,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Scrape the course list from the portal (overrides `refresh_courses`).
    #[arg(long, conflicts_with = "use_snapshot")]
    pub refresh_courses: bool,

    /// Use the saved course snapshot (overrides `refresh_courses`).
    #[arg(long)]
    pub use_snapshot: bool,
}

impl SyncArgs {
    pub fn refresh_override(&self) -> Option<bool> {
        match (self.refresh_courses, self.use_snapshot) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CoursesCommand {
    /// Scrape the course list and save the snapshot.
    Refresh(CoursesRefreshArgs),
    /// Resolve a course (and content) name against the saved snapshot.
    Find(CoursesFindArgs),
}

#[derive(Debug, Args)]
pub struct CoursesRefreshArgs {
    #[command(flatten)]
    pub config: ConfigArg,
}

#[derive(Debug, Args)]
pub struct CoursesFindArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Course name or a unique part of it.
    #[arg(long)]
    pub course: String,

    /// Content name or a unique part of it.
    #[arg(long)]
    pub content: Option<String>,
}
