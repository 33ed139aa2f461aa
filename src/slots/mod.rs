//! Command slots: the flat slot table, its paging, and its on-disk store

pub mod page;
pub mod store;

pub use page::PageView;
pub use store::{SlotStore, StorePaths};

/// Buttons shown on one page
pub const SLOTS_PER_PAGE: usize = 16;

/// Number of pages when the config does not say otherwise
pub const DEFAULT_MAX_PAGES: usize = 10;

/// Command assigned to a slot that has never been edited
pub const DEFAULT_COMMAND: &str = "ipconfig /all";

/// A single button's persisted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Shell command run when the button is clicked
    pub command: String,
    /// Button label, or a path to an image shown on the button
    pub description: String,
}

impl Slot {
    /// Default contents for the slot at 0-based global `index`
    pub fn default_for(index: usize) -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            description: default_description(index),
        }
    }
}

/// Numeric label used when a slot has no description (1-based)
pub fn default_description(index: usize) -> String {
    (index + 1).to_string()
}

/// Label used when a page has no stored description (`page` is 1-based)
pub fn default_page_description(page: usize) -> String {
    format!("Page {} Description", page)
}

/// Replace line breaks so edited text always occupies exactly one store line
pub fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Every slot of every page, plus the per-page descriptions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTable {
    slots: Vec<Slot>,
    page_descriptions: Vec<String>,
}

impl SlotTable {
    /// Table with every slot and page description at its default
    pub fn with_defaults(max_pages: usize) -> Self {
        let max_pages = max_pages.max(1);
        Self {
            slots: (0..max_pages * SLOTS_PER_PAGE)
                .map(Slot::default_for)
                .collect(),
            page_descriptions: (1..=max_pages).map(default_page_description).collect(),
        }
    }

    pub fn max_pages(&self) -> usize {
        self.page_descriptions.len()
    }

    pub fn total_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    /// The 16 slots belonging to `page` (1-based); empty when out of range
    pub fn page_slots(&self, page: usize) -> &[Slot] {
        if page == 0 || page > self.max_pages() {
            return &[];
        }
        let start = PageView::global_index(page, 0);
        &self.slots[start..start + SLOTS_PER_PAGE]
    }

    pub fn page_description(&self, page: usize) -> Option<&str> {
        page.checked_sub(1)
            .and_then(|i| self.page_descriptions.get(i))
            .map(String::as_str)
    }

    pub fn set_page_description(&mut self, page: usize, text: String) {
        if let Some(slot) = page
            .checked_sub(1)
            .and_then(|i| self.page_descriptions.get_mut(i))
        {
            *slot = text;
        }
    }

    /// Reset every command to [`DEFAULT_COMMAND`], leaving descriptions alone
    pub fn reset_commands(&mut self) {
        for slot in &mut self.slots {
            slot.command = DEFAULT_COMMAND.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let table = SlotTable::with_defaults(3);
        assert_eq!(table.total_slots(), 48);
        assert_eq!(table.max_pages(), 3);
        assert_eq!(table.slot(0).unwrap().command, DEFAULT_COMMAND);
        assert_eq!(table.slot(0).unwrap().description, "1");
        assert_eq!(table.slot(47).unwrap().description, "48");
        assert!(table.slot(48).is_none());
        assert_eq!(table.page_description(2), Some("Page 2 Description"));
        assert_eq!(table.page_description(0), None);
        assert_eq!(table.page_description(4), None);
    }

    #[test]
    fn test_page_slots() {
        let table = SlotTable::with_defaults(2);
        let page = table.page_slots(2);
        assert_eq!(page.len(), SLOTS_PER_PAGE);
        assert_eq!(page[0].description, "17");
        assert_eq!(page[15].description, "32");
        assert!(table.page_slots(0).is_empty());
        assert!(table.page_slots(3).is_empty());
    }

    #[test]
    fn test_zero_pages_clamped() {
        let table = SlotTable::with_defaults(0);
        assert_eq!(table.max_pages(), 1);
        assert_eq!(table.total_slots(), SLOTS_PER_PAGE);
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("dir\r\n/w"), "dir /w");
        assert_eq!(single_line("a\nb\rc"), "a b c");
        assert_eq!(single_line("plain"), "plain");
    }
}
