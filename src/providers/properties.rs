//! "TMSU Tags" section of the properties dialog

use std::sync::Arc;

use serde::Serialize;

use crate::extension::Extension;
use crate::file::FileRef;
use crate::tmsu::parse_tag_list;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertiesItem {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertiesModel {
    pub title: String,
    pub items: Vec<PropertiesItem>,
}

pub struct PropertiesProvider {
    extension: Arc<Extension>,
}

impl PropertiesProvider {
    pub fn new(extension: Arc<Extension>) -> Self {
        Self { extension }
    }

    /// Models for a selection; only single tracked files get one.
    ///
    /// The host asks for models synchronously, so the lookup runs on the
    /// calling thread rather than through the queue.
    pub fn get_models(&self, files: &[FileRef]) -> Vec<PropertiesModel> {
        let [file] = files else {
            return Vec::new();
        };
        if !self.extension.is_tracked(file.working_dir()) {
            return Vec::new();
        }

        let tags = self
            .extension
            .tmsu()
            .tags(file)
            .execute_with(self.extension.runner())
            .map(|output| parse_tag_list(&output))
            .unwrap_or_default();

        vec![PropertiesModel {
            title: "TMSU Tags".to_string(),
            items: tags
                .into_iter()
                .map(|tag| PropertiesItem {
                    name: "Tag".to_string(),
                    value: tag,
                })
                .collect(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::testing::{FakeTmsu, Harness};

    #[test]
    fn test_model_lists_tags() {
        let harness = Harness::new(
            FakeTmsu::new("/media").with_tags("/media/a.jpg", &["sea", "big wave"]),
        );
        let provider = PropertiesProvider::new(harness.extension.clone());

        let models = provider.get_models(&[FileRef::file("/media/a.jpg")]);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].title, "TMSU Tags");
        let values: Vec<&str> = models[0].items.iter().map(|i| i.value.as_str()).collect();
        assert_eq!(values, vec!["sea", "big wave"]);
        assert!(models[0].items.iter().all(|i| i.name == "Tag"));
    }

    #[test]
    fn test_multiple_or_untracked_files_have_no_model() {
        let harness = Harness::new(FakeTmsu::new("/media"));
        let provider = PropertiesProvider::new(harness.extension.clone());

        assert!(provider
            .get_models(&[FileRef::file("/media/a"), FileRef::file("/media/b")])
            .is_empty());
        assert!(provider.get_models(&[FileRef::file("/home/u/a")]).is_empty());
        assert!(provider.get_models(&[]).is_empty());
    }

    #[test]
    fn test_failed_lookup_gives_empty_model() {
        let harness = Harness::new(FakeTmsu::new("/media").failing("tags"));
        let provider = PropertiesProvider::new(harness.extension.clone());

        let models = provider.get_models(&[FileRef::dir("/media/album")]);
        assert_eq!(models.len(), 1);
        assert!(models[0].items.is_empty());
    }
}
