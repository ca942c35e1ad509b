//! Tag changes requested from the menu dialogs.
//!
//! Every change goes through the shared queue. Failures are reported as a
//! desktop notification on the UI thread.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::TmsuResult;
use crate::executor::Command;
use crate::extension::Extension;
use crate::file::FileRef;
use crate::notify::report_failure;
use crate::tmsu::{parse_tag_list, parse_tag_names, Tmsu, UntagSelection};

/// Difference between the tags a file has and the tags the user left in the
/// edit dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagEdit {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl TagEdit {
    pub fn between(current: &[String], edited: &[String]) -> Self {
        let before: BTreeSet<&String> = current.iter().collect();
        let after: BTreeSet<&String> = edited.iter().collect();
        Self {
            added: after.difference(&before).map(|t| t.to_string()).collect(),
            removed: before.difference(&after).map(|t| t.to_string()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// `tag` for additions first, then `untag` for removals
    pub fn commands(&self, tmsu: &Tmsu, file: &FileRef) -> TmsuResult<Vec<Command>> {
        let files = std::slice::from_ref(file);
        let mut commands = Vec::new();
        if !self.added.is_empty() {
            commands.push(tmsu.tag(files, &self.added, false)?);
        }
        if !self.removed.is_empty() {
            commands.push(tmsu.untag(files, &UntagSelection::Tags(self.removed.clone()), false)?);
        }
        Ok(commands)
    }
}

pub struct TagActions {
    extension: Arc<Extension>,
}

impl TagActions {
    pub fn new(extension: Arc<Extension>) -> Self {
        Self { extension }
    }

    /// Queue `commands` in order, notifying on each failure.
    ///
    /// `on_done` runs on the UI thread after the last command, with whether
    /// all of them succeeded. It is dropped when `commands` is empty.
    fn submit_all<F>(&self, commands: Vec<Command>, on_done: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let failed = Arc::new(AtomicBool::new(false));
        let mut on_done = Some(on_done);
        let last = commands.len().saturating_sub(1);

        for (i, command) in commands.into_iter().enumerate() {
            let notifications = Arc::clone(self.extension.notifications());
            let failed = Arc::clone(&failed);
            let done = if i == last { on_done.take() } else { None };
            self.extension.queue().submit(command, move |command, result| {
                match result {
                    Ok(_) => tracing::debug!("command succeeded: {}", command),
                    Err(e) => {
                        failed.store(true, Ordering::SeqCst);
                        report_failure(notifications.as_ref(), &e);
                    }
                }
                if let Some(done) = done {
                    done(!failed.load(Ordering::SeqCst));
                }
            });
        }
    }

    fn submit(&self, command: Command) {
        self.submit_all(vec![command], |_| {});
    }

    /// Apply `tags` to every file in `files`
    pub fn add_tags<S: AsRef<str>>(&self, files: &[FileRef], tags: &[S], recursive: bool) -> TmsuResult<()> {
        self.add_tags_then(files, tags, recursive, |_| {})
    }

    /// Like [`TagActions::add_tags`], reporting the outcome to `on_done` on
    /// the UI thread
    pub fn add_tags_then<S, F>(&self, files: &[FileRef], tags: &[S], recursive: bool, on_done: F) -> TmsuResult<()>
    where
        S: AsRef<str>,
        F: FnOnce(bool) + Send + 'static,
    {
        let command = self.extension.tmsu().tag(files, tags, recursive)?;
        self.submit_all(vec![command], on_done);
        Ok(())
    }

    /// Bring the tags of `file` from `current` to `edited`
    pub fn edit_tags(&self, file: &FileRef, current: &[String], edited: &[String]) -> TmsuResult<TagEdit> {
        self.edit_tags_then(file, current, edited, |_| {})
    }

    /// Like [`TagActions::edit_tags`]. `on_done` runs once after the last
    /// command, and never when the edit changes nothing.
    pub fn edit_tags_then<F>(
        &self,
        file: &FileRef,
        current: &[String],
        edited: &[String],
        on_done: F,
    ) -> TmsuResult<TagEdit>
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let edit = TagEdit::between(current, edited);
        let commands = edit.commands(self.extension.tmsu(), file)?;
        self.submit_all(commands, on_done);
        Ok(edit)
    }

    /// Remove `tags` from every file in `files`
    pub fn remove_tags<S: AsRef<str>>(&self, files: &[FileRef], tags: &[S], recursive: bool) -> TmsuResult<()> {
        let tags = tags.iter().map(|t| t.as_ref().to_string()).collect();
        let command = self
            .extension
            .tmsu()
            .untag(files, &UntagSelection::Tags(tags), recursive)?;
        self.submit(command);
        Ok(())
    }

    /// Remove every tag from `files`
    pub fn clear_tags(&self, files: &[FileRef], recursive: bool) -> TmsuResult<()> {
        let command = self
            .extension
            .tmsu()
            .untag(files, &UntagSelection::All, recursive)?;
        self.submit(command);
        Ok(())
    }

    /// Delete `tags` from the database covering `dir`
    pub fn delete_tags<S: AsRef<str>>(&self, dir: &Path, tags: &[S]) {
        if tags.is_empty() {
            return;
        }
        self.submit(self.extension.tmsu().delete(dir, tags));
    }

    /// Create a database rooted at `dir`
    pub fn init_database(&self, dir: &Path) {
        self.extension.forget_tracked();
        self.submit(self.extension.tmsu().init(dir));
    }

    /// Load the tags of `file` for the edit dialog
    pub fn load_tags<F>(&self, file: &FileRef, on_loaded: F)
    where
        F: FnOnce(Vec<String>) + Send + 'static,
    {
        let command = self.extension.tmsu().tags(file);
        self.extension.queue().submit(command, move |_, result| {
            on_loaded(result.map(|o| parse_tag_list(&o)).unwrap_or_default());
        });
    }

    /// Load every tag known to the database covering `dir`, for completion
    pub fn load_known_tags<F>(&self, dir: &Path, on_loaded: F)
    where
        F: FnOnce(Vec<String>) + Send + 'static,
    {
        let command = self.extension.tmsu().tags_in(dir);
        self.extension.queue().submit(command, move |_, result| {
            on_loaded(result.map(|o| parse_tag_names(&o)).unwrap_or_default());
        });
    }
}
