use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::display::Palette;
use crate::slots::{PageView, SlotTable, SLOTS_PER_PAGE};

/// How many notices the panel keeps around
pub const MAX_NOTICES: usize = 50;

/// Full-screen or windowed panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    Maximized,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Info,
    Error,
}

/// A message box shown by the panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub title: String,
    pub body: String,
}

/// Everything the interactive loop owns
///
/// Only the interactive loop holds this; other threads see the small
/// [`PanelSnapshot`] it publishes.
#[derive(Debug, Clone)]
pub struct AppState {
    pub table: SlotTable,
    pub pages: PageView,
    pub window_mode: WindowMode,
    pub palette: Palette,
    /// Commands submitted but not yet reported back
    pub running: usize,
    notices: VecDeque<Notice>,
    next_notice_id: u64,
}

impl AppState {
    pub fn new(table: SlotTable, palette: Palette, start_maximized: bool) -> Self {
        let pages = PageView::new(table.max_pages());
        Self {
            table,
            pages,
            window_mode: if start_maximized {
                WindowMode::Maximized
            } else {
                WindowMode::Normal
            },
            palette,
            running: 0,
            notices: VecDeque::new(),
            next_notice_id: 1,
        }
    }

    pub fn is_maximized(&self) -> bool {
        self.window_mode == WindowMode::Maximized
    }

    /// Record a notice, dropping the oldest once [`MAX_NOTICES`] is reached
    pub fn push_notice(
        &mut self,
        kind: NoticeKind,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> u64 {
        let id = self.next_notice_id;
        self.next_notice_id += 1;
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            id,
            kind,
            title: title.into(),
            body: body.into(),
        });
        id
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.back()
    }
}

/// Lock-free view of the panel for the keyboard hook thread
#[derive(Debug)]
pub struct PanelSnapshot {
    current_page: AtomicUsize,
    maximized: AtomicBool,
    total_slots: usize,
}

impl PanelSnapshot {
    pub fn new(max_pages: usize, maximized: bool) -> Self {
        Self {
            current_page: AtomicUsize::new(1),
            maximized: AtomicBool::new(maximized),
            total_slots: max_pages.max(1) * SLOTS_PER_PAGE,
        }
    }

    /// Publish the parts of `state` the hook needs
    pub fn publish(&self, state: &AppState) {
        self.set_current_page(state.pages.current());
        self.set_maximized(state.is_maximized());
    }

    pub fn current_page(&self) -> usize {
        self.current_page.load(Ordering::Acquire)
    }

    pub fn set_current_page(&self, page: usize) {
        self.current_page.store(page, Ordering::Release);
    }

    pub fn is_maximized(&self) -> bool {
        self.maximized.load(Ordering::Acquire)
    }

    pub fn set_maximized(&self, maximized: bool) {
        self.maximized.store(maximized, Ordering::Release);
    }

    pub fn total_slots(&self) -> usize {
        self.total_slots
    }
}
