use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::slots::{StorePaths, DEFAULT_MAX_PAGES};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub pages: PagesConfig,
    pub shell: ShellConfig,
    pub hotkeys: HotkeyConfig,
    pub web: WebConfig,
    pub appearance: AppearanceConfig,
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("no configuration directory for this user")?;
        Ok(base.join("command-deck").join("config.toml"))
    }

    pub fn store_paths(&self) -> StorePaths {
        let dir = &self.storage.data_dir;
        StorePaths {
            commands: dir.join(&self.storage.commands_file),
            descriptions: dir.join(&self.storage.descriptions_file),
            reset_flag: dir.join(&self.storage.reset_file),
        }
    }

    pub fn colors_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.colors_file)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the slot and colour files
    pub data_dir: PathBuf,
    pub commands_file: String,
    pub descriptions_file: String,
    /// Marker whose presence resets every command on the next load
    pub reset_file: String,
    pub colors_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            commands_file: "commands.txt".to_string(),
            descriptions_file: "descriptions.txt".to_string(),
            reset_file: "reset.flag".to_string(),
            colors_file: "colors.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
    pub max_pages: usize,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Shell used to run slot commands; unset fields use the platform shell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub program: Option<String>,
    pub flag: Option<String>,
    /// Searched after PATH when resolving a command's executable
    pub extra_search_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    pub enabled: bool,
    /// Key that leaves full screen (e.g. "Escape", "F24")
    pub restore_key: String,
    /// How many of F1..F16 trigger slots on the visible page
    pub slot_keys: usize,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            restore_key: "Escape".to_string(),
            slot_keys: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { port: 8765 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Open the panel maximized
    pub start_fullscreen: bool,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            start_fullscreen: true,
        }
    }
}
