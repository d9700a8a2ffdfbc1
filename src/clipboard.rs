//! Write-only clipboard access.
//!
//! Text is handed to the terminal with an OSC 52 sequence, which the terminal
//! forwards to the system clipboard. There is no read-back: whether the
//! terminal honoured the request can't be observed, and a refused or failed
//! write is only logged.
use std::io::{Write, stdout};

use crossterm::ExecutableCommand;
use crossterm::clipboard::CopyToClipboard;
use log::{debug, warn};

/// Places `text` on the system clipboard.
///
/// # Arguments
///
/// * `text` - The text to copy
pub fn copy(text: &str)
{
    copy_to(&mut stdout(), text);
}

/// Writes the clipboard request for `text` to `writer`.
///
/// # Arguments
///
/// * `writer` - The terminal to send the request to
/// * `text` - The text to copy
pub fn copy_to<W: Write>(writer: &mut W, text: &str)
{
    match writer.execute(CopyToClipboard::to_clipboard_from(text))
    {
        Ok(_) => debug!("Copied {} bytes to clipboard", text.len()),
        Err(err) => warn!("Clipboard write failed: {err}"),
    }
}
