//! Command execution - describes one external invocation and runs it

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{TmsuError, TmsuResult};

/// Shared "still runnable" flag of a [`Command`].
///
/// Clones observe the same flag. Once cancelled it never becomes runnable again.
#[derive(Debug, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn cancel(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn can_run(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Whether both tokens belong to the same command
    pub fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// One external invocation: program, arguments and working directory.
#[derive(Debug, Clone)]
pub struct Command {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    log_error: bool,
    token: CancelToken,
}

impl Command {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            log_error: true,
            token: CancelToken::new(),
        }
    }

    /// Run in `dir` instead of the caller's working directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Don't log failures. Used for checks that are expected to fail.
    pub fn quiet(mut self) -> Self {
        self.log_error = false;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn logs_errors(&self) -> bool {
        self.log_error
    }

    pub fn can_run(&self) -> bool {
        self.token.can_run()
    }

    /// Mark the command as no longer wanted. A command that is already
    /// running is not interrupted.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Run through `runner` and map the outcome. Errors are returned, not
    /// logged; see [`Command::execute_with`].
    pub fn run_with(&self, runner: &dyn ProcessRunner) -> TmsuResult<String> {
        tracing::trace!(cwd = ?self.cwd, "command: {}", self);

        let output = runner.run(self).map_err(|source| TmsuError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.success {
            tracing::trace!(code = ?output.code, "command exited unsuccessfully: {}", self);
            return Err(TmsuError::Failed {
                code: output.code,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run through `runner`, logging failures unless the command is quiet
    pub fn execute_with(&self, runner: &dyn ProcessRunner) -> TmsuResult<String> {
        let result = self.run_with(runner);
        if let Err(ref e) = result {
            if self.log_error {
                tracing::error!("command failed: {}", e.detail());
            }
        }
        result
    }

    /// Run as an OS process. `None` is the absent result.
    pub fn execute(&self) -> Option<String> {
        self.execute_with(&SystemRunner).ok()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default)]
pub struct RawOutput {
    pub success: bool,
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Runs a [`Command`] to completion
pub trait ProcessRunner: Send + Sync {
    fn run(&self, command: &Command) -> std::io::Result<RawOutput>;
}

/// Spawns real OS processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &Command) -> std::io::Result<RawOutput> {
        let mut cmd = std::process::Command::new(command.program());
        cmd.args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = command.cwd() {
            cmd.current_dir(dir);
        }

        let output = cmd.output()?;
        Ok(RawOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Resolve `program` to an executable file.
///
/// A name containing a path separator is checked as is. Otherwise
/// `search_paths` are tried first, then `$PATH`.
pub fn locate(program: &str, search_paths: &[PathBuf]) -> TmsuResult<PathBuf> {
    locate_from(program, search_paths, std::env::current_dir().ok().as_deref())
}

/// [`locate`] with relative search paths resolved against `cwd`. Without a
/// working directory they are resolved against the filesystem root.
fn locate_from(program: &str, search_paths: &[PathBuf], cwd: Option<&Path>) -> TmsuResult<PathBuf> {
    let not_found = || TmsuError::NotFound(program.to_string());

    if program.contains(std::path::MAIN_SEPARATOR) {
        return which::which(program).map_err(|_| not_found());
    }

    if !search_paths.is_empty() {
        let cwd = cwd.unwrap_or_else(|| Path::new(std::path::MAIN_SEPARATOR_STR));
        if let Ok(joined) = std::env::join_paths(search_paths) {
            if let Ok(path) = which::which_in(program, Some(joined), cwd) {
                return Ok(path);
            }
        }
    }

    which::which(program).map_err(|_| not_found())
}
