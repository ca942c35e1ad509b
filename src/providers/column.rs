//! The "TMSU tags" list column

use std::sync::Arc;

use serde::Serialize;

use crate::extension::Extension;
use crate::file::FileRef;
use crate::queue::Handle;
use crate::tmsu::parse_tag_list;

pub const COLUMN_NAME: &str = "NautilusTMSUColumn";
pub const TAGS_ATTRIBUTE: &str = "tmsu_tags";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub attribute: String,
    pub label: String,
    pub description: String,
}

/// What `update_file_info` tells the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationResult {
    /// Nothing more will happen for this request
    Complete,
    /// A completion will be delivered later on the UI thread
    InProgress,
    Failed,
}

/// Delivered on the UI thread once the tags of `file` are known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnUpdate {
    pub handle: Handle,
    pub file: FileRef,
    /// Attribute value to set, `None` when the file has no tags or the lookup
    /// failed
    pub value: Option<String>,
}

pub struct ColumnProvider {
    extension: Arc<Extension>,
}

impl ColumnProvider {
    pub fn new(extension: Arc<Extension>) -> Self {
        Self { extension }
    }

    pub fn columns(&self) -> Vec<ColumnDescriptor> {
        vec![ColumnDescriptor {
            name: format!("{}::tmsu_tags_column", COLUMN_NAME),
            attribute: TAGS_ATTRIBUTE.to_string(),
            label: "TMSU tags".to_string(),
            description: "List of TMSU tags".to_string(),
        }]
    }

    /// Start loading the tags of `file`.
    ///
    /// Files whose directory is not tracked complete immediately. Otherwise
    /// the lookup is queued under `handle` and `on_complete` runs on the UI
    /// thread, unless [`ColumnProvider::cancel_update`] is called first.
    pub fn update_file_info<F>(&self, handle: Handle, file: FileRef, on_complete: F) -> OperationResult
    where
        F: FnOnce(ColumnUpdate) + Send + 'static,
    {
        tracing::trace!(handle, "update_file_info: {}", file.path.display());

        if let Some(parent) = file.parent() {
            if !self.extension.is_tracked_cached(&parent.path) {
                tracing::debug!(
                    "skipping file: parent directory is not in tmsu db {}",
                    file.path.display()
                );
                return OperationResult::Complete;
            }
        }

        let command = self.extension.tmsu().tags(&file);
        let separator = self.extension.config().column.separator.clone();
        let path = file.path.display().to_string();

        self.extension
            .queue()
            .submit_tracked(handle, command, move |_, result| {
                let value = result
                    .ok()
                    .map(|output| parse_tag_list(&output))
                    .filter(|tags| !tags.is_empty())
                    .map(|tags| tags.join(separator.as_str()));
                tracing::trace!(handle, ?value, "column update");
                on_complete(ColumnUpdate {
                    handle,
                    file,
                    value,
                });
            });

        tracing::debug!("added to queue: {}", path);
        OperationResult::InProgress
    }

    /// The host no longer needs the update for `handle`
    pub fn cancel_update(&self, handle: Handle) {
        tracing::trace!(handle, "cancelling handle");
        self.extension.queue().cancel(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::testing::{FakeTmsu, Harness};
    use std::sync::Mutex;

    fn provider(harness: &Harness) -> ColumnProvider {
        ColumnProvider::new(harness.extension.clone())
    }

    #[test]
    fn test_columns() {
        let harness = Harness::new(FakeTmsu::new("/media"));
        let columns = provider(&harness).columns();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].name, "NautilusTMSUColumn::tmsu_tags_column");
        assert_eq!(columns[0].attribute, "tmsu_tags");
        assert_eq!(columns[0].label, "TMSU tags");
    }

    #[test]
    fn test_untracked_file_completes_without_lookup() {
        let harness = Harness::new(FakeTmsu::new("/media"));
        let result = provider(&harness).update_file_info(1, FileRef::file("/home/u/a.txt"), |_| {
            panic!("no update expected")
        });

        assert_eq!(result, OperationResult::Complete);
        assert_eq!(harness.settle(), 0);
        assert!(harness.runner.calls_of("tags").is_empty());
    }

    #[test]
    fn test_tracked_file_delivers_joined_tags() {
        let harness = Harness::new(
            FakeTmsu::new("/media").with_tags("/media/a.jpg", &["holiday", "big sea"]),
        );
        let updates = std::sync::Arc::new(Mutex::new(Vec::new()));

        let u = updates.clone();
        let result = provider(&harness).update_file_info(9, FileRef::file("/media/a.jpg"), move |update| {
            u.lock().unwrap().push(update);
        });
        assert_eq!(result, OperationResult::InProgress);

        assert_eq!(harness.settle(), 1);
        assert_eq!(
            *updates.lock().unwrap(),
            vec![ColumnUpdate {
                handle: 9,
                file: FileRef::file("/media/a.jpg"),
                value: Some("holiday, big sea".to_string()),
            }]
        );
        assert_eq!(
            harness.runner.calls_of("tags"),
            vec![vec!["tags".to_string(), "-1".to_string(), "/media/a.jpg".to_string()]]
        );
    }

    #[test]
    fn test_untagged_file_completes_without_value() {
        let harness = Harness::new(FakeTmsu::new("/media"));
        let updates = std::sync::Arc::new(Mutex::new(Vec::new()));

        let u = updates.clone();
        provider(&harness).update_file_info(2, FileRef::file("/media/b.jpg"), move |update| {
            u.lock().unwrap().push(update.value);
        });

        harness.settle();
        assert_eq!(*updates.lock().unwrap(), vec![None]);
    }

    #[test]
    fn test_parent_lookup_is_cached_across_siblings() {
        let harness = Harness::new(FakeTmsu::new("/media"));
        let column = provider(&harness);
        for (handle, name) in [(1, "/media/a"), (2, "/media/b"), (3, "/media/c")] {
            column.update_file_info(handle, FileRef::file(name), |_| {});
        }
        harness.settle();
        assert_eq!(harness.runner.calls_of("info").len(), 1);
        assert_eq!(harness.runner.calls_of("tags").len(), 3);
    }

    #[test]
    fn test_cancel_update_drops_delivery() {
        let harness = Harness::new(FakeTmsu::new("/media").with_tags("/media/a", &["x"]));
        let column = provider(&harness);

        // Whether or not the worker already ran the lookup, the UI loop has
        // not delivered it yet
        column.update_file_info(4, FileRef::file("/media/a"), |_| panic!("cancelled update delivered"));
        column.cancel_update(4);
        column.cancel_update(4);

        harness.settle();
        assert!(!harness.extension.queue().is_active(4));
        assert!(harness.runner.calls_of("tags").len() <= 1);
    }
}
