use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::exec::{CommandRunner, ExecutionOutcome};
use crate::slots::{single_line, Slot, SlotStore};
use crate::state::{AppState, NoticeKind, PanelSnapshot, PanelView, WindowMode};

use super::PanelEvent;

/// Whether the interactive loop keeps going after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Applies panel events to the application state
///
/// This is the only place `AppState` is mutated.
pub struct InputHandler {
    state: AppState,
    store: SlotStore,
    runner: CommandRunner,
    snapshot: Arc<PanelSnapshot>,
    colors_path: PathBuf,
}

impl InputHandler {
    pub fn new(
        state: AppState,
        store: SlotStore,
        runner: CommandRunner,
        snapshot: Arc<PanelSnapshot>,
        colors_path: PathBuf,
    ) -> Self {
        snapshot.publish(&state);
        Self {
            state,
            store,
            runner,
            snapshot,
            colors_path,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn handle_event(&mut self, event: PanelEvent) -> Flow {
        match event {
            PanelEvent::ClickSlot(slot) => self.click_slot(slot),
            PanelEvent::NextPage => self.change_page(true),
            PanelEvent::PreviousPage => self.change_page(false),
            PanelEvent::EditCommand { slot, text } => {
                if let Some(entry) = self.visible_slot_mut(slot) {
                    entry.command = single_line(&text);
                }
            }
            PanelEvent::EditDescription { slot, text } => {
                if let Some(entry) = self.visible_slot_mut(slot) {
                    entry.description = single_line(&text);
                }
            }
            PanelEvent::EditPageDescription(text) => {
                let page = self.state.pages.current();
                self.state.table.set_page_description(page, single_line(&text));
            }
            PanelEvent::SetColor { name, color } => self.set_color(&name, color),
            PanelEvent::RestoreWindow => self.set_window_mode(WindowMode::Normal),
            PanelEvent::MaximizeWindow => self.set_window_mode(WindowMode::Maximized),
            PanelEvent::CommandFinished { slot, outcome } => {
                self.finish_command();
                self.report_outcome(slot, outcome);
            }
            PanelEvent::CommandFailed { slot, message } => {
                self.finish_command();
                warn!("Command for button {} failed: {}", slot + 1, message);
                self.state
                    .push_notice(NoticeKind::Error, "Error", format!("Error: {}", message));
            }
            PanelEvent::Snapshot(reply) => {
                // The requester may have given up waiting
                let _ = reply.send(PanelView::from_state(&self.state));
            }
            PanelEvent::Close => {
                info!("Close requested");
                self.flush();
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    /// Persist the visible page
    pub fn flush(&self) {
        self.store.save(&self.state.table, self.state.pages.current());
    }

    fn click_slot(&mut self, slot: usize) {
        if !self.state.pages.is_visible(slot) {
            debug!(
                "Ignoring trigger for slot {} (not on page {})",
                slot + 1,
                self.state.pages.current()
            );
            return;
        }

        let command = match self.state.table.slot(slot) {
            Some(entry) => entry.command.trim().to_string(),
            None => return,
        };

        if command.is_empty() {
            info!("Button {} has no command", slot + 1);
            self.state.push_notice(
                NoticeKind::Error,
                "Error",
                format!("Please enter a command for button {}.", slot + 1),
            );
            return;
        }

        self.state.running += 1;
        self.runner.submit(command, slot);
    }

    fn change_page(&mut self, forward: bool) {
        let pages = &self.state.pages;
        let can_move = if forward {
            pages.can_advance()
        } else {
            pages.can_retreat()
        };
        if !can_move {
            debug!("Already on page {} of {}", pages.current(), pages.max_pages());
            return;
        }

        self.flush();
        if forward {
            self.state.pages.advance();
        } else {
            self.state.pages.retreat();
        }
        self.state.table = self.store.load();
        self.snapshot.publish(&self.state);
        info!("Showing page {}", self.state.pages.current());
    }

    fn visible_slot_mut(&mut self, slot: usize) -> Option<&mut Slot> {
        if !self.state.pages.is_visible(slot) {
            warn!(
                "Rejecting edit of slot {}: not on page {}",
                slot + 1,
                self.state.pages.current()
            );
            return None;
        }
        self.state.table.slot_mut(slot)
    }

    fn set_color(&mut self, name: &str, color: image::Rgb<u8>) {
        if !self.state.palette.set(name, color) {
            warn!("Unknown colour {:?}", name);
            return;
        }
        if let Err(e) = self.state.palette.save(&self.colors_path) {
            warn!("Failed to save colours to {:?}: {}", self.colors_path, e);
        }
    }

    fn set_window_mode(&mut self, mode: WindowMode) {
        if self.state.window_mode != mode {
            debug!("Window mode {:?}", mode);
            self.state.window_mode = mode;
            self.snapshot.publish(&self.state);
        }
    }

    fn finish_command(&mut self) {
        self.state.running = self.state.running.saturating_sub(1);
    }

    fn report_outcome(&mut self, slot: usize, outcome: ExecutionOutcome) {
        let Some(text) = outcome.report() else {
            debug!("Button {} produced no output", slot + 1);
            return;
        };
        match outcome {
            ExecutionOutcome::Error(_) => {
                self.state.push_notice(NoticeKind::Error, "Error", text);
            }
            _ => {
                self.state.push_notice(
                    NoticeKind::Info,
                    format!("Output of Command {}", slot + 1),
                    text,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Palette;
    use crate::exec::{CommandResolver, Shell};
    use crate::slots::{StorePaths, DEFAULT_COMMAND};
    use image::Rgb;
    use tempfile::TempDir;
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use tokio::sync::oneshot;

    fn handler(max_pages: usize) -> (InputHandler, UnboundedReceiver<PanelEvent>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::new(StorePaths::in_dir(dir.path()), max_pages);
        let (tx, rx) = mpsc::unbounded_channel();
        let runner = CommandRunner::new(Shell::platform_default(), CommandResolver::new(vec![]), tx);
        let state = AppState::new(store.load(), Palette::default(), true);
        let snapshot = Arc::new(PanelSnapshot::new(max_pages, true));
        let handler = InputHandler::new(
            state,
            store,
            runner,
            snapshot,
            dir.path().join("colors.txt"),
        );
        (handler, rx, dir)
    }

    #[tokio::test]
    async fn test_page_bounds_do_not_save() {
        let (mut handler, _rx, dir) = handler(2);

        assert_eq!(handler.handle_event(PanelEvent::PreviousPage), Flow::Continue);
        assert_eq!(handler.state().pages.current(), 1);
        assert!(!dir.path().join("commands.txt").exists());

        handler.handle_event(PanelEvent::NextPage);
        assert_eq!(handler.state().pages.current(), 2);
        assert!(dir.path().join("commands.txt").exists());

        std::fs::remove_file(dir.path().join("commands.txt")).unwrap();
        handler.handle_event(PanelEvent::NextPage);
        assert_eq!(handler.state().pages.current(), 2);
        assert!(!dir.path().join("commands.txt").exists());
    }

    #[tokio::test]
    async fn test_edits_survive_page_switch() {
        let (mut handler, _rx, _dir) = handler(3);

        handler.handle_event(PanelEvent::EditCommand {
            slot: 3,
            text: "ping\nlocalhost".to_string(),
        });
        handler.handle_event(PanelEvent::EditDescription {
            slot: 3,
            text: "Ping".to_string(),
        });
        handler.handle_event(PanelEvent::EditPageDescription("Network".to_string()));
        handler.handle_event(PanelEvent::NextPage);
        handler.handle_event(PanelEvent::PreviousPage);

        let slot = handler.state().table.slot(3).unwrap();
        assert_eq!(slot.command, "ping localhost");
        assert_eq!(slot.description, "Ping");
        assert_eq!(handler.state().table.page_description(1), Some("Network"));
    }

    #[tokio::test]
    async fn test_untouched_slots_keep_defaults_across_page_switch() {
        let (mut handler, _rx, _dir) = handler(3);

        handler.handle_event(PanelEvent::EditCommand {
            slot: 3,
            text: "hostname".to_string(),
        });
        handler.handle_event(PanelEvent::NextPage);

        let slot = handler.state().table.slot(20).unwrap();
        assert_eq!(slot.command, DEFAULT_COMMAND);
        assert_eq!(slot.description, "21");
        let last_page = handler.state().table.slot(40).unwrap();
        assert_eq!(last_page.command, DEFAULT_COMMAND);

        handler.handle_event(PanelEvent::ClickSlot(20));
        assert!(handler.state().latest_notice().is_none());
        assert_eq!(handler.state().running, 1);
    }

    #[tokio::test]
    async fn test_edit_of_hidden_slot_is_rejected() {
        let (mut handler, _rx, _dir) = handler(2);
        handler.handle_event(PanelEvent::EditCommand {
            slot: 20,
            text: "hostname".to_string(),
        });
        assert_eq!(handler.state().table.slot(20).unwrap().command, "ipconfig /all");
    }

    #[tokio::test]
    async fn test_stale_click_is_ignored() {
        let (mut handler, _rx, _dir) = handler(2);
        handler.handle_event(PanelEvent::ClickSlot(17));
        assert_eq!(handler.state().running, 0);
        assert!(handler.state().latest_notice().is_none());
    }

    #[tokio::test]
    async fn test_empty_command_notice() {
        let (mut handler, _rx, _dir) = handler(1);
        handler.handle_event(PanelEvent::EditCommand {
            slot: 4,
            text: "   ".to_string(),
        });
        handler.handle_event(PanelEvent::ClickSlot(4));

        assert_eq!(handler.state().running, 0);
        let notice = handler.state().latest_notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.body, "Please enter a command for button 5.");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_click_runs_and_reports() {
        let (mut handler, mut rx, _dir) = handler(1);
        handler.handle_event(PanelEvent::EditCommand {
            slot: 0,
            text: "  echo hello  ".to_string(),
        });
        handler.handle_event(PanelEvent::ClickSlot(0));
        assert_eq!(handler.state().running, 1);

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, PanelEvent::CommandFinished { slot: 0, .. }));
        handler.handle_event(event);

        assert_eq!(handler.state().running, 0);
        let notice = handler.state().latest_notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Info);
        assert_eq!(notice.title, "Output of Command 1");
        assert_eq!(notice.body, "hello");
    }

    #[tokio::test]
    async fn test_outcome_notices() {
        let (mut handler, _rx, _dir) = handler(1);
        handler.handle_event(PanelEvent::CommandFinished {
            slot: 2,
            outcome: ExecutionOutcome::Error("boom".to_string()),
        });
        let notice = handler.state().latest_notice().unwrap();
        assert_eq!((notice.title.as_str(), notice.body.as_str()), ("Error", "Error: boom"));

        handler.handle_event(PanelEvent::CommandFinished {
            slot: 2,
            outcome: ExecutionOutcome::Silent,
        });
        assert_eq!(handler.state().notices().count(), 1);

        handler.handle_event(PanelEvent::CommandFailed {
            slot: 2,
            message: "not found".to_string(),
        });
        assert_eq!(handler.state().latest_notice().unwrap().body, "Error: not found");
        assert_eq!(handler.state().running, 0);
    }

    #[tokio::test]
    async fn test_window_mode_is_published() {
        let (mut handler, _rx, _dir) = handler(1);
        handler.handle_event(PanelEvent::RestoreWindow);
        assert!(!handler.snapshot.is_maximized());
        handler.handle_event(PanelEvent::MaximizeWindow);
        assert!(handler.snapshot.is_maximized());
    }

    #[tokio::test]
    async fn test_set_color_persists_known_names() {
        let (mut handler, _rx, dir) = handler(1);
        handler.handle_event(PanelEvent::SetColor {
            name: "FormBackColor".to_string(),
            color: Rgb([1, 2, 3]),
        });
        let saved = Palette::load(&dir.path().join("colors.txt"));
        assert_eq!(saved.get("FormBackColor"), Some(Rgb([1, 2, 3])));

        handler.handle_event(PanelEvent::SetColor {
            name: "Nope".to_string(),
            color: Rgb([1, 2, 3]),
        });
        assert_eq!(handler.state().palette, saved);
    }

    #[tokio::test]
    async fn test_snapshot_and_close() {
        let (mut handler, _rx, dir) = handler(1);
        let (tx, rx) = oneshot::channel();
        handler.handle_event(PanelEvent::Snapshot(tx));
        let view = rx.await.unwrap();
        assert_eq!(view.page, 1);
        assert_eq!(view.slots.len(), 16);

        assert_eq!(handler.handle_event(PanelEvent::Close), Flow::Exit);
        assert!(dir.path().join("commands.txt").exists());
        assert!(dir.path().join("descriptions.txt").exists());
    }
}
