//! User Interface module for the Morse terminal.
//!
//! Contains components for rendering and managing the terminal UI,
//! including event handling, session state, and the telegraph key.
mod app;
mod event;
mod guard;
mod key_panel;
pub mod logging;

pub use app::{App, AppMode, Control, Focus, Indicators, Pane};
pub use event::{Event, EventHandler};
pub use guard::{TerminalGuard, Tui, init_panic_hook, init_tui};
