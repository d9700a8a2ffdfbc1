//! Provides a RAII guard for safe terminal lifecycle management.
//!
//! A guard object is created to initialize the TUI, and its `Drop`
//! implementation restores the terminal when it goes out of scope, either on
//! normal exit or during a panic unwind.
//!
//! Besides raw mode and the alternate screen, the guard turns on mouse
//! capture (the telegraph key is pressed with the mouse), focus reporting
//! (losing focus releases the key), and, where the terminal supports it,
//! key release reporting so the keyboard can key too.
use std::io::{Result as IoResult, Stdout, stdout};
use std::panic::{set_hook, take_hook};

use crossterm::ExecutableCommand;
use crossterm::event::{
    DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use log::{error, info};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

/// RAII wrapper for terminal state.
///
/// Manages the terminal's configuration, ensuring it is always returned
/// to its original state when this struct is dropped.
pub struct TerminalGuard
{
    /// Whether keyboard enhancement flags were pushed and must be popped
    key_release_events: bool,
}

impl TerminalGuard
{
    /// Creates a `TerminalGuard` for TUI setup.
    ///
    /// Configures the terminal by entering raw mode, switching to the
    /// alternate screen buffer, and enabling mouse and focus reporting.
    ///
    /// # Errors
    ///
    /// On failure to enter raw mode or switch screens.
    pub fn new() -> IoResult<Self>
    {
        enable_raw_mode()?;

        let mut out = stdout();
        out.execute(EnterAlternateScreen)?;
        out.execute(EnableMouseCapture)?;
        out.execute(EnableFocusChange)?;

        let key_release_events = supports_keyboard_enhancement().unwrap_or(false);
        if key_release_events
        {
            out.execute(PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
            ))?;
        }
        info!("Key release events available: {key_release_events}");

        Ok(Self { key_release_events })
    }

    /// Whether the terminal reports key releases, so the keyboard can key.
    #[must_use]
    pub const fn key_release_events(&self) -> bool
    {
        self.key_release_events
    }
}

impl Drop for TerminalGuard
{
    /// Restores the terminal state.
    fn drop(&mut self)
    {
        let mut out = stdout();

        if self.key_release_events
        {
            if let Err(err) = out.execute(PopKeyboardEnhancementFlags)
            {
                error!("Failed to pop keyboard enhancement flags: {err}");
            }
        }

        if let Err(err) = out.execute(DisableFocusChange)
        {
            error!("Failed to disable focus reporting: {err}");
        }

        if let Err(err) = out.execute(DisableMouseCapture)
        {
            error!("Failed to disable mouse capture: {err}");
        }

        // Terminal will be borked when failure, at least inform the user
        if let Err(err) = disable_raw_mode()
        {
            error!("Failed to disable raw mode: {err}");
        }

        if let Err(err) = out.execute(LeaveAlternateScreen)
        {
            error!("Failed to leave alternate screen: {err}");
        }
    }
}

/// Terminal type the UI draws to.
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal
///
/// # Errors
///
/// Returns an error if the terminal size can't be queried.
pub fn init_tui() -> IoResult<Tui>
{
    // Terminal setup is handled by TerminalGuard
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

/// Initialize the panic hook to restore the terminal before reporting
pub fn init_panic_hook()
{
    let original_hook = take_hook();
    set_hook(Box::new(move |panic_info| {
        // Restore terminal to normal state without panicking
        let _ = stdout().execute(DisableMouseCapture);
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);

        error!("Application panicked: {panic_info}");

        original_hook(panic_info);
    }));
}
