//! Tactical Morse Library
//!
//! A Morse code encoder/decoder with a press-and-hold telegraph key, driven
//! from a terminal interface.
//!
//! # Features
//!
//! - Bidirectional transcoding over A-Z, 0-9 and space
//! - A keyer turning press durations into dots and dashes
//! - A click-free sidetone while the key is held
//! - Write-only clipboard access for the transformed text
//!
//! # Modules
//!
//! - `morse`: Alphabet table, encoding and decoding
//! - `keyer`: Press/release interpretation and symbol grouping
//! - `scheduler`: Cancellable delayed actions
//! - `tone`: Sidetone oscillator and audio output
//! - `clipboard`: OSC 52 clipboard writes
//! - `config`: Command line settings
//! - `ui`: Terminal user interface components and event handling
pub mod clipboard;
pub mod config;
pub mod keyer;
pub mod morse;
pub mod scheduler;
pub mod tone;
pub mod ui;

pub use config::{Action, Settings};
pub use keyer::{Deferred, Keyer, KeyerConfig};
pub use morse::{Symbol, decode, encode};
pub use scheduler::{Scheduler, TaskHandle};
pub use tone::{ToneConfig, ToneGenerator};
pub use ui::logging;
pub use ui::{App, AppMode, Control, Event, EventHandler, Focus, Pane};
pub use ui::{TerminalGuard, Tui, init_panic_hook, init_tui};
