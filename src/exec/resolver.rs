//! Executable lookup along the search path

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Turns a typed command into one whose executable is a full path when it
/// can be found on the search path
#[derive(Debug, Clone, Default)]
pub struct CommandResolver {
    search_paths: Vec<PathBuf>,
}

impl CommandResolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Search `PATH` (split with the platform separator), then `extra`
    pub fn from_env(extra: &[PathBuf]) -> Self {
        let mut search_paths: Vec<PathBuf> = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();
        search_paths.extend(extra.iter().cloned());
        Self::new(search_paths)
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Resolve `command`, returning it unchanged when no better match exists
    ///
    /// Failing to find the executable is not an error here; the shell reports
    /// it when the command runs.
    pub fn resolve(&self, command: &str) -> String {
        if command.is_empty() {
            return command.to_string();
        }

        let (executable, arguments) = match command.split_once(' ') {
            Some((executable, arguments)) => (executable, arguments),
            None => (command, ""),
        };

        if executable.is_empty() || Path::new(executable).is_file() {
            return command.to_string();
        }

        for dir in &self.search_paths {
            if let Some(found) = find_in_dir(dir, executable) {
                let found = found.display();
                return if arguments.is_empty() {
                    found.to_string()
                } else {
                    format!("\"{}\" {}", found, arguments)
                };
            }
        }

        command.to_string()
    }
}

/// `dir/executable`, then `dir/executable.exe`
fn find_in_dir(dir: &Path, executable: &str) -> Option<PathBuf> {
    let plain = dir.join(executable);
    if plain.is_file() {
        return Some(plain);
    }

    let mut with_ext = plain.into_os_string();
    with_ext.push(OsStr::new(".exe"));
    let with_ext = PathBuf::from(with_ext);
    with_ext.is_file().then_some(with_ext)
}
