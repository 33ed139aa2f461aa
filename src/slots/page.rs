//! Mapping between the visible page and global slot indices
//!
//! Pages are 1-based, local positions are 0-based (`0..16`), and global slot
//! indices are 0-based (`0..max_pages * 16`). Only one page is visible at a
//! time; the hotkeys and the panel both address slots through this mapping.

use super::SLOTS_PER_PAGE;

/// Which page of slots is currently on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageView {
    current: usize,
    max_pages: usize,
}

impl PageView {
    /// Start on page 1 of `max_pages`
    pub fn new(max_pages: usize) -> Self {
        Self {
            current: 1,
            max_pages: max_pages.max(1),
        }
    }

    /// Global index of `local` on `page`
    #[inline]
    pub fn global_index(page: usize, local: usize) -> usize {
        (page - 1) * SLOTS_PER_PAGE + local
    }

    /// Page (1-based) that owns a global index
    #[inline]
    pub fn page_of(global: usize) -> usize {
        global / SLOTS_PER_PAGE + 1
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn total_slots(&self) -> usize {
        self.max_pages * SLOTS_PER_PAGE
    }

    /// Global indices shown on the current page
    pub fn visible_range(&self) -> std::ops::Range<usize> {
        let start = Self::global_index(self.current, 0);
        start..start + SLOTS_PER_PAGE
    }

    pub fn is_visible(&self, global: usize) -> bool {
        self.visible_range().contains(&global)
    }

    /// Local position of a global index, if it is on the current page
    pub fn local_of(&self, global: usize) -> Option<usize> {
        self.is_visible(global)
            .then(|| global - Self::global_index(self.current, 0))
    }

    pub fn can_advance(&self) -> bool {
        self.current < self.max_pages
    }

    pub fn can_retreat(&self) -> bool {
        self.current > 1
    }

    /// Move to the next page; returns false (and changes nothing) on the last page
    pub fn advance(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Move to the previous page; returns false (and changes nothing) on page 1
    pub fn retreat(&mut self) -> bool {
        if !self.can_retreat() {
            return false;
        }
        self.current -= 1;
        true
    }
}
