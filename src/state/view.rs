//! Serializable projection of the visible page

use serde::Serialize;
use std::collections::BTreeMap;

use super::{AppState, Notice, WindowMode};
use crate::display::{rgb_to_hex, ButtonFace};

/// One button of the visible page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    /// 1-based global slot number
    pub number: usize,
    pub command: String,
    pub description: String,
    pub face: ButtonFace,
    pub back_color: String,
    pub fore_color: String,
}

/// What the panel shows right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelView {
    pub page: usize,
    pub max_pages: usize,
    pub page_description: String,
    pub window_mode: WindowMode,
    pub slots: Vec<SlotView>,
    pub notices: Vec<Notice>,
    pub running: usize,
    /// Every palette entry as `#RRGGBB`
    pub colors: BTreeMap<String, String>,
}

impl PanelView {
    pub fn from_state(state: &AppState) -> Self {
        let page = state.pages.current();
        let start = state.pages.visible_range().start;

        let slots = state
            .table
            .page_slots(page)
            .iter()
            .enumerate()
            .map(|(position, slot)| {
                let index = start + position;
                let (back, fore) = state.palette.button_colors(position);
                SlotView {
                    number: index + 1,
                    command: slot.command.clone(),
                    description: slot.description.clone(),
                    face: ButtonFace::for_slot(index, &slot.description),
                    back_color: rgb_to_hex(back),
                    fore_color: rgb_to_hex(fore),
                }
            })
            .collect();

        Self {
            page,
            max_pages: state.pages.max_pages(),
            page_description: state
                .table
                .page_description(page)
                .unwrap_or_default()
                .to_string(),
            window_mode: state.window_mode,
            slots,
            notices: state.notices().cloned().collect(),
            running: state.running,
            colors: state
                .palette
                .entries()
                .map(|(name, color)| (name.to_string(), rgb_to_hex(color)))
                .collect(),
        }
    }
}
