//! Builders for the tmsu sub-commands the extension issues

use std::path::{Path, PathBuf};

use super::codec::join_tags;
use crate::config::TmsuConfig;
use crate::error::{TmsuError, TmsuResult};
use crate::executor::{locate, Command};
use crate::file::FileRef;

/// Which tags `untag` removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntagSelection {
    Tags(Vec<String>),
    All,
}

/// A resolved tmsu executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tmsu {
    program: PathBuf,
}

impl Tmsu {
    /// Resolve the executable named in `config`
    pub fn locate(config: &TmsuConfig) -> TmsuResult<Self> {
        let program = locate(&config.program, &config.expanded_search_paths())?;
        tracing::debug!(program = %program.display(), "found tmsu");
        Ok(Self { program })
    }

    /// Use `program` as is, without checking it exists
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Command::new(self.program.clone(), args)
    }

    /// `tags -1 <path>`, run from the file's directory
    pub fn tags(&self, file: &FileRef) -> Command {
        self.command(["tags".to_string(), "-1".to_string(), path_arg(&file.path)])
            .current_dir(file.working_dir())
    }

    /// `tags -1` with no path: the tags of everything in `dir`
    pub fn tags_in(&self, dir: &Path) -> Command {
        self.command(["tags", "-1"]).current_dir(dir)
    }

    /// `tag [--recursive] --tags=<tags> <files...>`
    pub fn tag<S: AsRef<str>>(
        &self,
        files: &[FileRef],
        tags: &[S],
        recursive: bool,
    ) -> TmsuResult<Command> {
        if tags.is_empty() {
            return Err(TmsuError::InvalidCommand("tag needs at least one tag".to_string()));
        }
        let mut args = vec!["tag".to_string()];
        if recursive {
            args.push("--recursive".to_string());
        }
        args.push(format!("--tags={}", join_tags(tags)));
        self.with_files(args, files)
    }

    /// `untag [--all] [--recursive] [--tags=<tags>] <files...>`
    pub fn untag(
        &self,
        files: &[FileRef],
        selection: &UntagSelection,
        recursive: bool,
    ) -> TmsuResult<Command> {
        let mut args = vec!["untag".to_string()];
        match selection {
            UntagSelection::All => args.push("--all".to_string()),
            UntagSelection::Tags(tags) if tags.is_empty() => {
                return Err(TmsuError::InvalidCommand(
                    "untag needs tags or --all".to_string(),
                ));
            }
            UntagSelection::Tags(_) => {}
        }
        if recursive {
            args.push("--recursive".to_string());
        }
        if let UntagSelection::Tags(tags) = selection {
            args.push(format!("--tags={}", join_tags(tags)));
        }
        self.with_files(args, files)
    }

    /// `delete <tags...>`: remove tags from the database entirely
    pub fn delete<S: AsRef<str>>(&self, dir: &Path, tags: &[S]) -> Command {
        let args = std::iter::once("delete".to_string())
            .chain(tags.iter().map(|t| t.as_ref().to_string()));
        self.command(args).current_dir(dir)
    }

    /// `init`: create a database rooted at `dir`
    pub fn init(&self, dir: &Path) -> Command {
        self.command(["init"]).current_dir(dir)
    }

    /// `info`, quiet since it doubles as the "is this tracked?" check
    pub fn info(&self, dir: &Path) -> Command {
        self.command(["info"]).current_dir(dir).quiet()
    }

    /// Append the file paths and run from the first file's directory
    fn with_files(&self, mut args: Vec<String>, files: &[FileRef]) -> TmsuResult<Command> {
        let first = files
            .first()
            .ok_or_else(|| TmsuError::InvalidCommand("no files given".to_string()))?;
        args.extend(files.iter().map(|f| path_arg(&f.path)));
        Ok(self.command(args).current_dir(first.working_dir()))
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmsu() -> Tmsu {
        Tmsu::with_program("/usr/bin/tmsu")
    }

    #[test]
    fn test_tags_for_file() {
        let command = tmsu().tags(&FileRef::file("/x/y.txt"));
        assert_eq!(command.program(), Path::new("/usr/bin/tmsu"));
        assert_eq!(command.args(), ["tags", "-1", "/x/y.txt"]);
        assert_eq!(command.cwd(), Some(Path::new("/x")));
        assert!(command.logs_errors());
    }

    #[test]
    fn test_tags_for_directory_runs_inside_it() {
        let command = tmsu().tags(&FileRef::dir("/x/photos"));
        assert_eq!(command.args(), ["tags", "-1", "/x/photos"]);
        assert_eq!(command.cwd(), Some(Path::new("/x/photos")));

        let command = tmsu().tags_in(Path::new("/x/photos"));
        assert_eq!(command.args(), ["tags", "-1"]);
    }

    #[test]
    fn test_tag_escapes_and_orders_arguments() {
        let files = [FileRef::file("/x/a.txt"), FileRef::file("/x/b c.txt")];
        let command = tmsu().tag(&files, &["foo bar", "baz"], true).unwrap();
        assert_eq!(
            command.args(),
            ["tag", "--recursive", "--tags=foo\\ bar baz", "/x/a.txt", "/x/b c.txt"]
        );
        assert_eq!(command.cwd(), Some(Path::new("/x")));
    }

    #[test]
    fn test_tag_requires_files_and_tags() {
        assert!(matches!(
            tmsu().tag::<&str>(&[], &["a"], false),
            Err(TmsuError::InvalidCommand(_))
        ));
        assert!(matches!(
            tmsu().tag::<&str>(&[FileRef::file("/x/a")], &[], false),
            Err(TmsuError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_untag() {
        let files = [FileRef::file("/x/a.txt")];
        let command = tmsu()
            .untag(&files, &UntagSelection::Tags(vec!["old tag".to_string()]), false)
            .unwrap();
        assert_eq!(command.args(), ["untag", "--tags=old\\ tag", "/x/a.txt"]);

        let command = tmsu().untag(&files, &UntagSelection::All, true).unwrap();
        assert_eq!(command.args(), ["untag", "--all", "--recursive", "/x/a.txt"]);

        assert!(tmsu()
            .untag(&files, &UntagSelection::Tags(Vec::new()), false)
            .is_err());
    }

    #[test]
    fn test_delete_init_info() {
        let dir = Path::new("/x");
        let delete = tmsu().delete(dir, &["a", "b"]);
        assert_eq!(delete.args(), ["delete", "a", "b"]);
        assert_eq!(delete.cwd(), Some(dir));

        assert_eq!(tmsu().init(dir).args(), ["init"]);

        let info = tmsu().info(dir);
        assert_eq!(info.args(), ["info"]);
        assert!(!info.logs_errors());
    }

    #[test]
    fn test_locate_missing_program() {
        let config = TmsuConfig {
            program: "definitely-not-tmsu-xyz".to_string(),
            search_paths: Vec::new(),
        };
        assert!(matches!(Tmsu::locate(&config), Err(TmsuError::NotFound(_))));
    }
}
