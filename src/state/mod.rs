mod manager;
mod view;

pub use manager::{AppState, Notice, NoticeKind, PanelSnapshot, WindowMode, MAX_NOTICES};
pub use view::{PanelView, SlotView};
