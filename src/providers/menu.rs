//! Context menu entries

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::extension::Extension;
use crate::file::FileRef;

pub const MENU_ITEM_NAME: &str = "NautilusTMSUMenu";

/// What activating a menu item should open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuAction {
    AddTags,
    EditTags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub name: String,
    pub label: String,
    pub action: Option<MenuAction>,
    /// Files the action applies to
    pub files: Vec<FileRef>,
    pub submenu: Vec<MenuItem>,
}

impl MenuItem {
    fn new(action_name: &str, label: &str) -> Self {
        Self {
            name: format!("{}::{}", MENU_ITEM_NAME, action_name),
            label: label.to_string(),
            action: None,
            files: Vec::new(),
            submenu: Vec::new(),
        }
    }

    fn with_action(mut self, action: MenuAction, files: &[FileRef]) -> Self {
        self.action = Some(action);
        self.files = files.to_vec();
        self
    }
}

pub struct MenuProvider {
    extension: Arc<Extension>,
}

impl MenuProvider {
    pub fn new(extension: Arc<Extension>) -> Self {
        Self { extension }
    }

    /// Items for a selection. Empty unless every file is tracked.
    pub fn get_file_items(&self, files: &[FileRef]) -> Vec<MenuItem> {
        if files.is_empty() {
            return Vec::new();
        }
        // One `info` per distinct directory, not per file
        let dirs: BTreeSet<&Path> = files.iter().map(FileRef::working_dir).collect();
        if !dirs.into_iter().all(|dir| self.extension.is_tracked(dir)) {
            return Vec::new();
        }
        vec![build_tags_menu(files)]
    }

    /// Items for a right click on the folder background
    pub fn get_background_items(&self, current_folder: &FileRef) -> Vec<MenuItem> {
        if !self.extension.is_tracked(&current_folder.path) {
            return Vec::new();
        }
        vec![build_tags_menu(std::slice::from_ref(current_folder))]
    }
}

fn build_tags_menu(files: &[FileRef]) -> MenuItem {
    let mut menu = MenuItem::new("Tags", "TMSU Tags");
    menu.submenu
        .push(MenuItem::new("Add_Tags", "Add Tags").with_action(MenuAction::AddTags, files));

    if files.len() == 1 {
        menu.submenu
            .push(MenuItem::new("Edit_Tags", "Edit Tags").with_action(MenuAction::EditTags, files));
    }
    menu
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::testing::{FakeTmsu, Harness};

    fn labels(items: &[MenuItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn test_single_file_gets_add_and_edit() {
        let harness = Harness::new(FakeTmsu::new("/media"));
        let menu = MenuProvider::new(harness.extension.clone());

        let items = menu.get_file_items(&[FileRef::file("/media/a.jpg")]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "NautilusTMSUMenu::Tags");
        assert_eq!(items[0].label, "TMSU Tags");
        assert_eq!(labels(&items[0].submenu), vec!["Add Tags", "Edit Tags"]);
        assert_eq!(items[0].submenu[1].action, Some(MenuAction::EditTags));
        assert_eq!(items[0].submenu[1].files, vec![FileRef::file("/media/a.jpg")]);
    }

    #[test]
    fn test_multiple_files_only_add() {
        let harness = Harness::new(FakeTmsu::new("/media"));
        let menu = MenuProvider::new(harness.extension.clone());

        let files = [FileRef::file("/media/a.jpg"), FileRef::dir("/media/album")];
        let items = menu.get_file_items(&files);
        assert_eq!(labels(&items[0].submenu), vec!["Add Tags"]);
        assert_eq!(items[0].submenu[0].name, "NautilusTMSUMenu::Add_Tags");
        assert_eq!(items[0].submenu[0].files.len(), 2);
    }

    #[test]
    fn test_untracked_selection_has_no_items() {
        let harness = Harness::new(FakeTmsu::new("/media"));
        let menu = MenuProvider::new(harness.extension.clone());

        let files = [FileRef::file("/media/a.jpg"), FileRef::file("/home/u/b.txt")];
        assert!(menu.get_file_items(&files).is_empty());
        assert!(menu.get_file_items(&[]).is_empty());
    }

    #[test]
    fn test_shared_directory_is_checked_once() {
        let harness = Harness::new(FakeTmsu::new("/media"));
        let menu = MenuProvider::new(harness.extension.clone());

        let files: Vec<FileRef> = (0..50)
            .map(|i| FileRef::file(format!("/media/{}.jpg", i)))
            .collect();
        assert_eq!(menu.get_file_items(&files).len(), 1);
        assert_eq!(harness.runner.calls_of("info").len(), 1);

        let mixed = [
            FileRef::file("/media/a.jpg"),
            FileRef::file("/media/b.jpg"),
            FileRef::dir("/media/album"),
        ];
        menu.get_file_items(&mixed);
        assert_eq!(harness.runner.calls_of("info").len(), 3);
    }

    #[test]
    fn test_background_items() {
        let harness = Harness::new(FakeTmsu::new("/media"));
        let menu = MenuProvider::new(harness.extension.clone());

        let items = menu.get_background_items(&FileRef::dir("/media/album"));
        assert_eq!(labels(&items[0].submenu), vec!["Add Tags", "Edit Tags"]);
        assert!(menu.get_background_items(&FileRef::dir("/home/u")).is_empty());
    }
}
