use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::{HookDecision, Key, KeyEvent, KeyEventKind};
use crate::input::PanelEvent;
use crate::slots::{PageView, SLOTS_PER_PAGE};
use crate::state::PanelSnapshot;

/// Decides, for each key event, whether it is a panel hotkey
///
/// Runs on the hook thread. It only reads the published [`PanelSnapshot`]
/// and posts events to the interactive loop, so it never blocks key delivery.
pub struct HotkeyBridge {
    snapshot: Arc<PanelSnapshot>,
    events: UnboundedSender<PanelEvent>,
    restore_key: Key,
    slot_keys: usize,
}

impl HotkeyBridge {
    /// F1..F12 map to the first twelve buttons of the visible page
    pub const DEFAULT_SLOT_KEYS: usize = 12;

    pub fn new(
        snapshot: Arc<PanelSnapshot>,
        events: UnboundedSender<PanelEvent>,
        restore_key: Key,
        slot_keys: usize,
    ) -> Self {
        Self {
            snapshot,
            events,
            restore_key,
            slot_keys: slot_keys.min(SLOTS_PER_PAGE),
        }
    }

    pub fn decide(&self, event: KeyEvent) -> HookDecision {
        if event.kind != KeyEventKind::Down {
            return HookDecision::PassThrough;
        }

        if event.key == self.restore_key && self.snapshot.is_maximized() {
            debug!("Restore key pressed while maximized");
            return self.post(PanelEvent::RestoreWindow);
        }

        if let Some(slot) = self.slot_for(event.key) {
            debug!("{:?} -> slot {}", event.key, slot + 1);
            return self.post(PanelEvent::ClickSlot(slot));
        }

        HookDecision::PassThrough
    }

    /// Global slot a function key triggers on the current page
    pub fn slot_for(&self, key: Key) -> Option<usize> {
        let Key::Function(number) = key else {
            return None;
        };
        let offset = usize::from(number).checked_sub(1)?;
        if offset >= self.slot_keys {
            return None;
        }

        let page = self.snapshot.current_page();
        let slot = PageView::global_index(page, offset);
        (slot < self.snapshot.total_slots()).then_some(slot)
    }

    fn post(&self, event: PanelEvent) -> HookDecision {
        match self.events.send(event) {
            Ok(()) => HookDecision::Consume,
            // Nobody left to act on it; let the key through
            Err(_) => HookDecision::PassThrough,
        }
    }
}
