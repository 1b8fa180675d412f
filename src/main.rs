use anyhow::Result;
use clap::{Parser, Subcommand};
use lode::areas::repository::Repository;
use lode::artifacts::objects::metadata::{MetaValue, Metadata};

#[derive(Parser)]
#[command(
    name = "lode",
    version = "0.1.0",
    about = "A content-addressable snapshot store",
    long_about = "lode stores snapshots of a directory as content-addressable \
    objects and keeps a linear history of commits linking each snapshot to the \
    previous one.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<String>,
    },
    #[command(
        name = "commit",
        about = "Snapshot the workspace as a new commit",
        long_about = "This command snapshots every file in the workspace and records a new \
        commit whose parent is the current HEAD."
    )]
    Commit {
        #[arg(short, long, help = "One-line summary of the commit")]
        subject: String,
        #[arg(short, long, default_value = "", help = "Free-form commit message body")]
        body: String,
        #[arg(
            short,
            long = "meta",
            value_name = "KEY=VALUE",
            help = "Attach a metadata entry to the commit (repeatable)"
        )]
        meta: Vec<String>,
        #[arg(short, long, help = "Repository path (defaults to the current directory)")]
        repo: Option<String>,
    },
    #[command(
        name = "log",
        about = "Show the commit history",
        long_about = "This command walks the commit chain from HEAD to the root commit and \
        renders one block per commit, newest first, through a pager."
    )]
    Log {
        #[arg(short, long, help = "Repository path (defaults to the current directory)")]
        repo: Option<String>,
    },
    #[command(
        name = "show",
        about = "Print the decoded fields of a commit",
        long_about = "This command fetches one commit by identifier, decodes its record and \
        prints every field."
    )]
    Show {
        #[arg(index = 1, help = "The commit identifier to show")]
        id: String,
        #[arg(short, long, help = "Repository path (defaults to the current directory)")]
        repo: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { path } => {
            let repository = match path {
                Some(path) => Repository::new(path, Box::new(std::io::stdout()))?,
                None => open_repository(&None)?,
            };

            repository.init()?
        }
        Commands::Commit {
            subject,
            body,
            meta,
            repo,
        } => {
            let repository = open_repository(repo)?;

            repository.commit(subject, body, parse_metadata(meta)?)?
        }
        Commands::Log { repo } => {
            let repository = open_repository(repo)?;

            repository.log()?
        }
        Commands::Show { id, repo } => {
            let repository = open_repository(repo)?;

            repository.show(id)?
        }
    }

    Ok(())
}

fn open_repository(repo: &Option<String>) -> Result<Repository> {
    match repo {
        Some(path) => Repository::new(path, Box::new(std::io::stdout())),
        None => {
            let pwd = std::env::current_dir()?;
            Repository::new(&pwd.to_string_lossy(), Box::new(std::io::stdout()))
        }
    }
}

fn parse_metadata(pairs: &[String]) -> Result<Metadata> {
    let mut metadata = Metadata::new();

    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            anyhow::anyhow!("Invalid metadata entry (expected KEY=VALUE): {pair}")
        })?;
        metadata.insert(key, MetaValue::parse_literal(value));
    }

    Ok(metadata)
}
