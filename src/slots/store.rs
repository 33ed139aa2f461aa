//! Line-oriented persistence for commands and descriptions
//!
//! Layout of the two store files:
//! - commands file: line `i` is the command of global slot `i`
//!   (`max_pages * 16` lines)
//! - descriptions file: line `i` is the description of global slot `i`,
//!   followed by one description line per page
//!
//! A reset marker file, when present, forces every command back to the
//! default and is deleted as soon as it is seen.
//!
//! I/O failures never propagate out of [`SlotStore::load`] or
//! [`SlotStore::save`]; they are logged and the in-memory table keeps
//! whatever values it already had.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{default_description, PageView, SlotTable, SLOTS_PER_PAGE};
use crate::LINE_ENDING;

/// Locations of the store files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub commands: PathBuf,
    pub descriptions: PathBuf,
    pub reset_flag: PathBuf,
}

impl StorePaths {
    /// Default file names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            commands: dir.join("commands.txt"),
            descriptions: dir.join("descriptions.txt"),
            reset_flag: dir.join("reset.flag"),
        }
    }
}

/// Reads and writes the slot table
#[derive(Debug, Clone)]
pub struct SlotStore {
    paths: StorePaths,
    max_pages: usize,
}

impl SlotStore {
    pub fn new(paths: StorePaths, max_pages: usize) -> Self {
        Self {
            paths,
            max_pages: max_pages.max(1),
        }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    fn total_slots(&self) -> usize {
        self.max_pages * SLOTS_PER_PAGE
    }

    /// Load every slot, applying defaults wherever the files have nothing
    pub fn load(&self) -> SlotTable {
        let mut table = SlotTable::with_defaults(self.max_pages);
        self.load_commands(&mut table);
        self.load_descriptions(&mut table);
        table
    }

    fn load_commands(&self, table: &mut SlotTable) {
        if self.consume_reset_flag() {
            info!("Reset marker found, restoring default commands");
            table.reset_commands();
            let lines: Vec<String> = (0..self.total_slots())
                .filter_map(|i| table.slot(i).map(|s| s.command.clone()))
                .collect();
            if let Err(e) = write_lines(&self.paths.commands, &lines) {
                warn!("Failed to write default commands: {}", e);
            }
            return;
        }

        match read_lines(&self.paths.commands) {
            Ok(Some(lines)) => {
                for (index, line) in lines.into_iter().take(self.total_slots()).enumerate() {
                    if let Some(slot) = table.slot_mut(index) {
                        slot.command = line;
                    }
                }
            }
            Ok(None) => debug!("No commands file at {:?}, using defaults", self.paths.commands),
            Err(e) => warn!("Failed to read {:?}: {}", self.paths.commands, e),
        }
    }

    fn load_descriptions(&self, table: &mut SlotTable) {
        let lines = match read_lines(&self.paths.descriptions) {
            Ok(Some(lines)) => lines,
            Ok(None) => return,
            Err(e) => {
                warn!("Failed to read {:?}: {}", self.paths.descriptions, e);
                return;
            }
        };

        let total = self.total_slots();
        for index in 0..total {
            let description = match lines.get(index) {
                Some(line) if !line.is_empty() => line.clone(),
                _ => default_description(index),
            };
            if let Some(slot) = table.slot_mut(index) {
                slot.description = description;
            }
        }

        for page in 1..=self.max_pages {
            if let Some(line) = lines.get(total + page - 1) {
                table.set_page_description(page, line.clone());
            }
        }
    }

    /// Check for the reset marker, deleting it if present
    fn consume_reset_flag(&self) -> bool {
        match fs::remove_file(&self.paths.reset_flag) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                // Still honour the marker; it will be seen again next load
                warn!("Failed to delete reset marker {:?}: {}", self.paths.reset_flag, e);
                self.paths.reset_flag.exists()
            }
        }
    }

    /// Write back `page`'s slots and page description, keeping every other line
    pub fn save(&self, table: &SlotTable, page: usize) {
        if page == 0 || page > self.max_pages {
            warn!("Refusing to save out-of-range page {}", page);
            return;
        }
        if let Err(e) = self.try_save(table, page) {
            warn!("Failed to save page {}: {}", page, e);
        } else {
            debug!("Saved page {}", page);
        }
    }

    fn try_save(&self, table: &SlotTable, page: usize) -> io::Result<()> {
        let total = self.total_slots();
        let mut commands = read_lines(&self.paths.commands)?.unwrap_or_default();
        let mut descriptions = read_lines(&self.paths.descriptions)?.unwrap_or_default();

        // Lines the files lack were defaults at load; write those, not blanks
        for index in commands.len()..total {
            let command = table.slot(index).map(|s| s.command.clone());
            commands.push(command.unwrap_or_default());
        }
        for index in descriptions.len()..total {
            let description = table.slot(index).map(|s| s.description.clone());
            descriptions.push(description.unwrap_or_default());
        }
        for line in descriptions.len()..total + self.max_pages {
            let page = line - total + 1;
            let text = table.page_description(page).unwrap_or_default();
            descriptions.push(text.to_string());
        }

        let start = PageView::global_index(page, 0);
        for (offset, slot) in table.page_slots(page).iter().enumerate() {
            commands[start + offset] = slot.command.clone();
            descriptions[start + offset] = slot.description.clone();
        }
        if let Some(text) = table.page_description(page) {
            descriptions[total + page - 1] = text.to_string();
        }

        write_lines(&self.paths.commands, &commands)?;
        write_lines(&self.paths.descriptions, &descriptions)?;
        Ok(())
    }

    /// Create the reset marker so the next load restores default commands
    pub fn request_reset(&self) -> io::Result<()> {
        if let Some(parent) = self.paths.reset_flag.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.paths.reset_flag, b"")
    }
}

/// Read a file as lines; `None` when the file does not exist
fn read_lines(path: &Path) -> io::Result<Option<Vec<String>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(
            String::from_utf8_lossy(&bytes)
                .lines()
                .map(str::to_string)
                .collect(),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn write_lines(path: &Path, lines: &[String]) -> io::Result<()> {
    let mut contents = String::new();
    for line in lines {
        contents.push_str(line);
        contents.push_str(LINE_ENDING);
    }
    fs::write(path, contents)
}
