//! Named panel colours, persisted as `Name=r,g,b` lines

use image::Rgb;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

use crate::slots::SLOTS_PER_PAGE;
use crate::LINE_ENDING;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
/// First button's face
pub const ALERT_RED: Rgb<u8> = Rgb([195, 25, 21]);
pub const BUTTON_BLUE: Rgb<u8> = Rgb([11, 16, 150]);
/// Text box and label foreground
pub const TERMINAL_GREEN: Rgb<u8> = Rgb([22, 181, 4]);

/// Non-button colour entries and their defaults, in file order
const CONTROL_COLORS: [(&str, Rgb<u8>); 14] = [
    ("CommandTextBoxBackColor", BLACK),
    ("CommandTextBoxForeColor", TERMINAL_GREEN),
    ("DescriptionTextBoxBackColor", BLACK),
    ("DescriptionTextBoxForeColor", TERMINAL_GREEN),
    ("TextBoxLabelBackColor", BLACK),
    ("TextBoxLabelForeColor", TERMINAL_GREEN),
    ("PlusMinusEditButtonBackColor", BLACK),
    ("PlusMinusEditButtonForeColor", TERMINAL_GREEN),
    ("PageNumberLabelBackColor", BLACK),
    ("PageNumberLabelForeColor", TERMINAL_GREEN),
    ("PageDescriptionTextBoxBackColor", BLACK),
    ("PageDescriptionTextBoxForeColor", TERMINAL_GREEN),
    ("FormBackColor", BLACK),
    ("ControlBorderColor", WHITE),
];

pub fn button_back_name(position: usize) -> String {
    format!("Button{}BackColor", position + 1)
}

pub fn button_fore_name(position: usize) -> String {
    format!("Button{}ForeColor", position + 1)
}

/// Every colour the panel uses, keyed by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<(String, Rgb<u8>)>,
}

impl Default for Palette {
    fn default() -> Self {
        let mut entries = Vec::with_capacity(SLOTS_PER_PAGE * 2 + CONTROL_COLORS.len());
        for position in 0..SLOTS_PER_PAGE {
            let back = if position == 0 { ALERT_RED } else { BUTTON_BLUE };
            entries.push((button_back_name(position), back));
            entries.push((button_fore_name(position), WHITE));
        }
        entries.extend(
            CONTROL_COLORS
                .iter()
                .map(|(name, color)| (name.to_string(), *color)),
        );
        Self { entries }
    }
}

impl Palette {
    /// Defaults overlaid with whatever valid lines `path` holds
    pub fn load(path: &Path) -> Self {
        let mut palette = Self::default();
        match fs::read_to_string(path) {
            Ok(contents) => {
                for line in contents.lines() {
                    match parse_line(line) {
                        Some((name, color)) => {
                            if !palette.set(name, color) {
                                debug!("Ignoring unknown colour {:?}", name);
                            }
                        }
                        None => debug!("Skipping malformed colour line {:?}", line),
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to read {:?}: {}", path, e),
        }
        palette
    }

    /// Write every entry, one `Name=r,g,b` line each
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut contents = String::new();
        for (name, color) in &self.entries {
            contents.push_str(&format_line(name, *color));
            contents.push_str(LINE_ENDING);
        }
        fs::write(path, contents)
    }

    pub fn get(&self, name: &str) -> Option<Rgb<u8>> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, color)| *color)
    }

    /// Change a known colour; returns false for unknown names
    pub fn set(&mut self, name: &str, color: Rgb<u8>) -> bool {
        match self.entries.iter_mut().find(|(entry, _)| entry == name) {
            Some((_, slot)) => {
                *slot = color;
                true
            }
            None => false,
        }
    }

    /// (background, foreground) of the button at `position` on a page
    pub fn button_colors(&self, position: usize) -> (Rgb<u8>, Rgb<u8>) {
        (
            self.get(&button_back_name(position)).unwrap_or(BUTTON_BLUE),
            self.get(&button_fore_name(position)).unwrap_or(WHITE),
        )
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, Rgb<u8>)> {
        self.entries.iter().map(|(name, color)| (name.as_str(), *color))
    }
}

fn parse_line(line: &str) -> Option<(&str, Rgb<u8>)> {
    let (name, value) = line.split_once('=')?;
    let mut parts = value.split(',').map(|part| part.trim().parse::<u8>());
    let r = parts.next()?.ok()?;
    let g = parts.next()?.ok()?;
    let b = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((name.trim(), Rgb([r, g, b])))
}

fn format_line(name: &str, color: Rgb<u8>) -> String {
    format!("{}={},{},{}", name, color[0], color[1], color[2])
}

/// Parse a hex color string to Rgb
pub fn parse_hex_color(hex: &str) -> Option<Rgb<u8>> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some(Rgb([r, g, b]))
}

/// Convert Rgb to hex string
pub fn rgb_to_hex(color: Rgb<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", color[0], color[1], color[2])
}
