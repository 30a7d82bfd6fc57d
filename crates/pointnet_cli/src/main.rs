//! `pointnet` command-line entry point.
//!
//! # Responsibility
//! - Open the configured store and expose read-mostly library operations
//!   (listing, history, word frequency) plus JSON export/import.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use log::error;
use pointnet_core::{
    export_libraries, import_libraries_json, init_logging, open_db, word_frequency, CoreConfig,
    FrequencyMode, LibraryId, LibraryService, LinkType, PointId,
};

#[derive(Parser, Debug)]
#[command(
    name = "pointnet",
    version,
    about = "Knowledge-point libraries with links and version history",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "SQLite database file")]
    db: Option<PathBuf>,

    #[arg(long, global = true, value_name = "FILE", help = "JSON config file")]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "DIR",
        help = "Write rotating log files to this absolute directory"
    )]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core health and version.
    Ping,
    /// List libraries with point and link counts.
    Libraries,
    /// Export libraries as JSON.
    Export {
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
        #[arg(long = "library", value_name = "ID", help = "Library to export; repeatable, default all")]
        libraries: Vec<LibraryId>,
    },
    /// Import libraries from a JSON export.
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the most frequent words (or tags) of a library.
    WordFreq {
        #[arg(value_name = "LIBRARY")]
        library: LibraryId,
        #[arg(long, value_enum, default_value_t = ModeArg::Content)]
        mode: ModeArg,
    },
    /// Link two points using the configured link policy.
    Link {
        #[arg(value_name = "FROM")]
        from: PointId,
        #[arg(value_name = "TO")]
        to: PointId,
        #[arg(long = "type", value_enum, default_value_t = LinkTypeArg::Related)]
        kind: LinkTypeArg,
    },
    /// Print the snapshot history of a point, newest first.
    History {
        #[arg(value_name = "POINT")]
        point: PointId,
        #[arg(long, value_name = "N", help = "Window in days; defaults to the configured retention")]
        days: Option<u32>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Content,
    Tag,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LinkTypeArg {
    Related,
    Parent,
    Child,
}

impl From<LinkTypeArg> for LinkType {
    fn from(value: LinkTypeArg) -> Self {
        match value {
            LinkTypeArg::Related => LinkType::Related,
            LinkTypeArg::Parent => LinkType::Parent,
            LinkTypeArg::Child => LinkType::Child,
        }
    }
}

impl From<ModeArg> for FrequencyMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Content => FrequencyMode::Content,
            ModeArg::Tag => FrequencyMode::Tag,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => CoreConfig::from_json_file(path)?,
        None => CoreConfig::default(),
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = cli.log_dir {
        config.log_dir = Some(log_dir);
    }
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level(), log_dir)?;
    }

    if let Command::Ping = cli.command {
        println!("pointnet_core ping={}", pointnet_core::ping());
        println!("pointnet_core version={}", pointnet_core::core_version());
        return Ok(());
    }

    let conn = open_db(&config.db_path)?;
    match cli.command {
        Command::Ping => {}
        Command::Libraries => {
            for summary in LibraryService::new(&conn).list_libraries()? {
                println!(
                    "{}\t{}\tpoints={}\tlinks={}",
                    summary.library.id,
                    summary.library.name,
                    summary.point_count,
                    summary.link_count
                );
            }
        }
        Command::Export { out, libraries } => {
            let exports = export_libraries(&conn, &libraries)?;
            std::fs::write(&out, serde_json::to_string_pretty(&exports)?)?;
            println!("exported {} libraries to {}", exports.len(), out.display());
        }
        Command::Import { file } => {
            let json = std::fs::read_to_string(&file)?;
            let summary = import_libraries_json(&conn, &json)?;
            println!(
                "imported libraries={} points={} links={} dropped_links={}",
                summary.libraries, summary.points, summary.links, summary.dropped_links
            );
        }
        Command::WordFreq { library, mode } => {
            for entry in word_frequency(&conn, library, mode.into())? {
                println!("{}\t{}", entry.count, entry.word);
            }
        }
        Command::Link { from, to, kind } => {
            let link = config
                .link_service(&conn)
                .create_link(from, to, kind.into())?;
            println!("{}\t{}", link.id, link.kind.as_str());
        }
        Command::History { point, days } => {
            let snapshots = config.snapshot_service(&conn).list_snapshots(point, days)?;
            println!("{}", serde_json::to_string_pretty(&snapshots)?);
        }
    }
    Ok(())
}
