//! Everything that can happen to the panel, and the loop that applies it

mod handler;

pub use handler::{Flow, InputHandler};

use image::Rgb;
use tokio::sync::oneshot;

use crate::exec::ExecutionOutcome;
use crate::state::PanelView;

/// Input to the interactive loop
///
/// Slot numbers are 0-based global indices.
#[derive(Debug)]
pub enum PanelEvent {
    /// A button click or hotkey trigger
    ClickSlot(usize),
    NextPage,
    PreviousPage,
    EditCommand { slot: usize, text: String },
    EditDescription { slot: usize, text: String },
    /// New description for the current page
    EditPageDescription(String),
    SetColor { name: String, color: Rgb<u8> },
    RestoreWindow,
    MaximizeWindow,
    CommandFinished { slot: usize, outcome: ExecutionOutcome },
    CommandFailed { slot: usize, message: String },
    /// Ask for the current view
    Snapshot(oneshot::Sender<PanelView>),
    Close,
}
