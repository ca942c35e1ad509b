//! nautilus-tmsu - TMSU tags inside the Nautilus file manager.
//!
//! Adds a "TMSU tags" list column, a properties page and a context menu for
//! tagging files. Every tmsu invocation goes through one background worker so
//! the file manager never blocks on the database.
//!
//! # Architecture
//!
//! - [`queue`] - Single-worker FIFO of commands with cancellable handles
//! - [`executor`] - Running one tmsu command, locating the executable
//! - [`dispatch`] - Getting results back onto the UI thread
//! - [`tmsu`] - Command builders and output parsing
//! - [`providers`] - Column, menu, properties and tag actions
//! - [`completion`] - Tag entry completion
//!
//! # FFI Layer
//!
//! The file manager loads a small shim that calls into [`ffi`]. Structured
//! data crosses the boundary as JSON.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use nautilus_tmsu::{dispatch, Config, ColumnProvider, Extension, FileRef, SystemRunner, TaskQueue};
//!
//! let (dispatcher, ui) = dispatch::channel();
//! let queue = TaskQueue::spawn(Arc::new(SystemRunner), Arc::new(dispatcher))?;
//! let extension = Arc::new(Extension::initialize(Config::load(), queue)?);
//!
//! let column = ColumnProvider::new(extension);
//! column.update_file_info(1, FileRef::from_path("/media/a.jpg"), |update| {
//!     println!("{:?}", update.value);
//! });
//! ui.run_next(std::time::Duration::from_secs(5));
//! ```

// Public modules
pub mod cli;
pub mod completion;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod extension;
pub mod file;
pub mod logging;
pub mod notify;
pub mod providers;
pub mod queue;
pub mod tmsu;

// FFI module - internal implementation details
#[doc(hidden)]
pub mod ffi;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::{TmsuError, TmsuResult};
pub use executor::{Command, ProcessRunner, SystemRunner};
pub use extension::Extension;
pub use file::FileRef;
pub use providers::{ColumnProvider, MenuProvider, PropertiesProvider, TagActions};
pub use queue::{Handle, TaskQueue};
