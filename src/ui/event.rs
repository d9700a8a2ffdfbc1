//! Event handling module for the application
//!
//! A background thread polls the terminal and forwards events to the main
//! thread over a channel. Input events are stamped with the instant they
//! were read, so key timing does not depend on how quickly the main loop
//! gets around to them.
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use log::error;

/// Events that can be processed by the application
#[derive(Debug, Clone, Copy)]
pub enum Event
{
    /// Regular time tick for updating UI elements
    Tick,
    /// Keyboard input event and when it was read
    Key(KeyEvent, Instant),
    /// Mouse input event and when it was read
    Mouse(MouseEvent, Instant),
    /// The terminal lost focus
    FocusLost(Instant),
    /// Terminal resize event with new dimensions
    Resize(u16, u16),
}

/// Handles terminal events
///
/// Manages event handling in a separate thread and provides
/// a way to receive events through a channel.
pub struct EventHandler
{
    /// Receiver side of the event channel to get events from the handler thread
    event_receiver: mpsc::Receiver<Event>,
    /// Sender for shutdown the thread for graceful shutdown
    shutdown_sender: mpsc::Sender<()>,
    /// Handle to keep the thread alive
    // Option is used to move the handle in `drop`
    thread_handle: Option<JoinHandle<()>>,
}

impl EventHandler
{
    /// Creates a new event handler with the specified tick rate
    ///
    /// # Arguments
    ///
    /// * `tick_rate` - The duration between tick events
    ///
    /// # Returns
    ///
    /// A new `EventHandler` instance with a running background thread
    #[must_use]
    pub fn new(tick_rate: Duration) -> Self
    {
        let (event_sender, event_receiver) = mpsc::channel();
        let (shutdown_sender, shutdown_receiver) = mpsc::channel();

        let handle = thread::spawn(move || {
            let mut last_tick = Instant::now();

            loop
            {
                if shutdown_receiver.try_recv().is_ok()
                {
                    break;
                }

                let timeout = tick_rate.saturating_sub(last_tick.elapsed());

                let polled = match event::poll(timeout)
                {
                    Ok(ready) => ready,
                    Err(err) =>
                    {
                        error!("Error polling events: {err}");
                        break;
                    }
                };

                if polled
                {
                    let read = match event::read()
                    {
                        Ok(read) => read,
                        Err(err) =>
                        {
                            error!("Error reading event: {err}");
                            break;
                        }
                    };

                    let now = Instant::now();
                    let forwarded = match read
                    {
                        CrosstermEvent::Key(key) => Some(Event::Key(key, now)),
                        CrosstermEvent::Mouse(mouse) => Some(Event::Mouse(mouse, now)),
                        CrosstermEvent::FocusLost => Some(Event::FocusLost(now)),
                        CrosstermEvent::Resize(width, height) =>
                        {
                            Some(Event::Resize(width, height))
                        }
                        // Ignore other event types
                        _ => None,
                    };

                    // Break the loop if sending fails (receiver dropped)
                    if let Some(forwarded) = forwarded
                    {
                        if event_sender.send(forwarded).is_err()
                        {
                            break;
                        }
                    }
                }

                if last_tick.elapsed() >= tick_rate
                {
                    if event_sender.send(Event::Tick).is_err()
                    {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self {
            event_receiver,
            shutdown_sender,
            thread_handle: Some(handle),
        }
    }

    /// Gets the next event, waiting at most `timeout`.
    ///
    /// The main loop passes the time left until the next scheduled action so
    /// timers fire on time even between ticks.
    ///
    /// # Returns
    ///
    /// The next event, or `None` if nothing arrived in time.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is disconnected.
    pub fn next_timeout(&self, timeout: Duration) -> Result<Option<Event>>
    {
        match self.event_receiver.recv_timeout(timeout)
        {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => bail!("Event channel disconnected"),
        }
    }
}

impl Drop for EventHandler
{
    fn drop(&mut self)
    {
        // Signal shutdown (ignore if already closed)
        let _ = self.shutdown_sender.send(());

        if let Some(handle) = self.thread_handle.take()
        {
            let _ = handle.join();
        }
    }
}
