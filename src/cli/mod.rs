//! Command line front end.
//!
//! Drives the same providers the file manager uses, with the calling thread
//! standing in for the UI thread. Handy for checking a setup without
//! restarting Nautilus.

use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{anyhow, bail};
use clap::{Parser, Subcommand};

use crate::completion::{should_popup, TagCompleter};
use crate::config::Config;
use crate::dispatch::{self, UiLoop};
use crate::error::TmsuResult;
use crate::executor::SystemRunner;
use crate::extension::Extension;
use crate::file::FileRef;
use crate::logging;
use crate::providers::{ColumnProvider, MenuProvider, OperationResult, PropertiesProvider, TagActions};
use crate::queue::TaskQueue;
use crate::tmsu::{find_root, split_tags, Tmsu};

/// How long to wait for tmsu before giving up
const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "nautilus-tmsu")]
#[command(about = "TMSU tags as seen by the Nautilus extension", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the tmsu executable that would be used
    Locate,

    /// Print the root of the database covering a directory
    Info {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Print the tags of files as the column shows them
    Tags {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Add tags to files
    Tag {
        /// Space separated tags, `\ ` keeps a space inside a tag
        #[arg(long, short)]
        tags: String,

        #[arg(long, short)]
        recursive: bool,

        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Remove tags from files
    Untag {
        /// Space separated tags, `\ ` keeps a space inside a tag
        #[arg(long, short, required_unless_present = "all")]
        tags: Option<String>,

        /// Remove every tag
        #[arg(long, conflicts_with = "tags")]
        all: bool,

        #[arg(long, short)]
        recursive: bool,

        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Complete the word at the end of TEXT against the tags known in DIR
    Complete {
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        text: String,
    },

    /// Print the column descriptors as JSON
    Columns,

    /// Print the context menu for a selection as JSON
    Menu {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print the properties page for a selection as JSON
    Properties {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

/// An initialized extension whose UI thread is the caller
struct Session {
    extension: Arc<Extension>,
    ui: UiLoop,
}

impl Session {
    fn start(config: Config) -> TmsuResult<Self> {
        let (dispatcher, ui) = dispatch::channel();
        let queue = TaskQueue::spawn(Arc::new(SystemRunner), Arc::new(dispatcher))?;
        let extension = Extension::initialize(config, queue)?;
        Ok(Self {
            extension: Arc::new(extension),
            ui,
        })
    }

    /// Run `count` UI callbacks, waiting for each
    fn run_callbacks(&self, count: usize) -> anyhow::Result<()> {
        for _ in 0..count {
            if !self.ui.run_next(TIMEOUT) {
                bail!("timed out waiting for tmsu");
            }
        }
        Ok(())
    }

    /// Wait for every queued command and its callback
    fn settle(&self) -> anyhow::Result<()> {
        if !self.extension.queue().wait_idle(TIMEOUT) {
            bail!("timed out waiting for tmsu");
        }
        self.ui.run_pending();
        Ok(())
    }
}

fn file_refs(paths: Vec<PathBuf>) -> Vec<FileRef> {
    paths.into_iter().map(FileRef::from_path).collect()
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse the command line and run it
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();
    let config = Config::load();

    match cli.command {
        Commands::Locate => {
            let tmsu = Tmsu::locate(&config.tmsu)?;
            println!("{}", tmsu.program().display());
            Ok(())
        }
        Commands::Info { dir } => {
            let tmsu = Tmsu::locate(&config.tmsu)?;
            let root = find_root(&tmsu, &SystemRunner, &dir)
                .ok_or_else(|| anyhow!("{} is not inside a tmsu database", dir.display()))?;
            println!("{}", root.display());
            Ok(())
        }
        Commands::Tags { paths } => show_tags(Session::start(config)?, file_refs(paths)),
        Commands::Tag { tags, recursive, paths } => {
            let session = Session::start(config)?;
            TagActions::new(session.extension.clone()).add_tags(&file_refs(paths), &split_tags(&tags), recursive)?;
            session.settle()
        }
        Commands::Untag {
            tags,
            all,
            recursive,
            paths,
        } => {
            let session = Session::start(config)?;
            let actions = TagActions::new(session.extension.clone());
            let files = file_refs(paths);
            match tags {
                Some(tags) if !all => actions.remove_tags(&files, &split_tags(&tags), recursive)?,
                _ => actions.clear_tags(&files, recursive)?,
            }
            session.settle()
        }
        Commands::Complete { dir, text } => {
            let session = Session::start(config)?;
            let (tx, rx) = mpsc::channel();
            TagActions::new(session.extension.clone()).load_known_tags(&dir, move |tags| {
                let _ = tx.send(tags);
            });
            session.run_callbacks(1)?;

            let completer = TagCompleter::new(rx.try_recv().unwrap_or_default());
            let matches = completer.matches(&text, text.len());
            if should_popup(&text, matches.len()) {
                for tag in matches {
                    println!("{}", tag);
                }
            }
            Ok(())
        }
        Commands::Columns => {
            let session = Session::start(config)?;
            print_json(&ColumnProvider::new(session.extension).columns())
        }
        Commands::Menu { paths } => {
            let session = Session::start(config)?;
            print_json(&MenuProvider::new(session.extension).get_file_items(&file_refs(paths)))
        }
        Commands::Properties { paths } => {
            let session = Session::start(config)?;
            print_json(&PropertiesProvider::new(session.extension).get_models(&file_refs(paths)))
        }
    }
}

fn show_tags(session: Session, files: Vec<FileRef>) -> anyhow::Result<()> {
    let column = ColumnProvider::new(session.extension.clone());
    let (tx, rx) = mpsc::channel();
    let mut in_progress = 0;

    for (handle, file) in files.iter().enumerate() {
        let tx = tx.clone();
        let result = column.update_file_info(handle as u64, file.clone(), move |update| {
            let _ = tx.send(update);
        });
        if result == OperationResult::InProgress {
            in_progress += 1;
        }
    }
    session.run_callbacks(in_progress)?;

    let mut values = vec![None; files.len()];
    for update in rx.try_iter() {
        if let Some(slot) = values.get_mut(update.handle as usize) {
            *slot = update.value;
        }
    }
    for (file, value) in files.iter().zip(values) {
        println!("{}: {}", file.path.display(), value.unwrap_or_default());
    }
    Ok(())
}
