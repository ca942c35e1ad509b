//! Probing whether a directory is tracked by a tmsu database

use std::path::{Path, PathBuf};

use super::codec::parse_root_path;
use super::commands::Tmsu;
use crate::executor::ProcessRunner;

/// `true` when `tmsu info` succeeds in `dir`. Failure is expected for
/// untracked directories and is not logged.
pub fn is_database(tmsu: &Tmsu, runner: &dyn ProcessRunner, dir: &Path) -> bool {
    tmsu.info(dir).execute_with(runner).is_ok()
}

/// Root directory of the database covering `dir`
pub fn find_root(tmsu: &Tmsu, runner: &dyn ProcessRunner, dir: &Path) -> Option<PathBuf> {
    let output = tmsu.info(dir).execute_with(runner).ok()?;
    parse_root_path(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{Command, RawOutput};

    /// Pretends `/media` is the only tracked tree
    struct InfoRunner;

    impl ProcessRunner for InfoRunner {
        fn run(&self, command: &Command) -> std::io::Result<RawOutput> {
            let tracked = command.cwd().is_some_and(|d| d.starts_with("/media"));
            Ok(if tracked {
                RawOutput {
                    success: true,
                    code: Some(0),
                    stdout: b"Database: /media/.tmsu/db\nRoot path: /media\n".to_vec(),
                    stderr: Vec::new(),
                }
            } else {
                RawOutput {
                    success: false,
                    code: Some(1),
                    stdout: Vec::new(),
                    stderr: b"tmsu: no database found".to_vec(),
                }
            })
        }
    }

    #[test]
    fn test_is_database() {
        let tmsu = Tmsu::with_program("tmsu");
        assert!(is_database(&tmsu, &InfoRunner, Path::new("/media/photos")));
        assert!(!is_database(&tmsu, &InfoRunner, Path::new("/home/u")));
    }

    #[test]
    fn test_find_root() {
        let tmsu = Tmsu::with_program("tmsu");
        assert_eq!(
            find_root(&tmsu, &InfoRunner, Path::new("/media/photos")),
            Some(PathBuf::from("/media"))
        );
        assert_eq!(find_root(&tmsu, &InfoRunner, Path::new("/home/u")), None);
    }
}
