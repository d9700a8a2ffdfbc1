//! Telegraph key interpreter.
//!
//! Turns press/release pairs into dots and dashes by measuring how long the
//! key was held, and groups symbols keyed in quick succession into one
//! character. A group is committed once the key has stayed up for the
//! commit delay.
use std::time::{Duration, Instant};

use log::debug;

use crate::morse::Symbol;
use crate::scheduler::{Scheduler, TaskHandle};

/// Presses shorter than this are dots.
pub const DEFAULT_DOT_THRESHOLD: Duration = Duration::from_millis(200);

/// Idle time after a release before the pending group is committed.
pub const DEFAULT_COMMIT_DELAY: Duration = Duration::from_millis(600);

/// Delayed actions owned by a keying session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred
{
    /// Flush the pending symbol group into the Morse buffer
    CommitGroup,
    /// Tear the sidetone down after its decay
    ToneTeardown,
}

/// Timing parameters of the keyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyerConfig
{
    /// Presses strictly shorter than this are dots, the rest dashes
    pub dot_threshold: Duration,
    /// How long the key must stay up before a group is committed
    pub commit_delay: Duration,
}

impl Default for KeyerConfig
{
    fn default() -> Self
    {
        Self {
            dot_threshold: DEFAULT_DOT_THRESHOLD,
            commit_delay: DEFAULT_COMMIT_DELAY,
        }
    }
}

impl KeyerConfig
{
    /// Classifies a press by how long the key was held.
    #[must_use]
    pub fn classify(&self, held: Duration) -> Symbol
    {
        if held < self.dot_threshold
        {
            Symbol::Dot
        }
        else
        {
            Symbol::Dash
        }
    }
}

/// Key position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState
{
    /// Key is up
    Idle,
    /// Key is down since the given instant
    Pressed
    {
        /// When the key went down
        since: Instant,
    },
}

/// Press-duration keyer.
#[derive(Debug)]
pub struct Keyer
{
    /// Timing thresholds
    config: KeyerConfig,
    /// Whether the key is down, and since when
    state: KeyState,
    /// Symbols keyed since the last commit
    pending: String,
    /// Running commit timer, if any
    commit_timer: Option<TaskHandle>,
    /// Timestamp of the most recent press
    last_press: Option<Instant>,
}

impl Keyer
{
    /// Creates an idle keyer.
    #[must_use]
    pub const fn new(config: KeyerConfig) -> Self
    {
        Self {
            config,
            state: KeyState::Idle,
            pending: String::new(),
            commit_timer: None,
            last_press: None,
        }
    }

    /// Timing parameters in use.
    #[must_use]
    pub const fn config(&self) -> &KeyerConfig
    {
        &self.config
    }

    /// Current key position.
    #[must_use]
    pub const fn state(&self) -> KeyState
    {
        self.state
    }

    /// Whether the key is held down.
    #[must_use]
    pub const fn is_pressed(&self) -> bool
    {
        matches!(self.state, KeyState::Pressed { .. })
    }

    /// Symbols keyed but not yet committed.
    #[must_use]
    pub fn pending(&self) -> &str
    {
        &self.pending
    }

    /// When the key last went down.
    #[must_use]
    pub const fn last_press(&self) -> Option<Instant>
    {
        self.last_press
    }

    /// Puts the key down.
    ///
    /// A running commit timer is cancelled so the next symbol joins the
    /// pending group instead of starting a new one.
    ///
    /// # Arguments
    ///
    /// * `now` - When the key went down
    /// * `timers` - The session's timer queue
    ///
    /// # Returns
    ///
    /// `false` if the key was already down and nothing changed.
    pub fn press(&mut self, now: Instant, timers: &mut Scheduler<Deferred>) -> bool
    {
        if self.is_pressed()
        {
            return false;
        }

        if let Some(timer) = self.commit_timer.take()
        {
            timers.cancel(timer);
        }

        self.state = KeyState::Pressed { since: now };
        self.last_press = Some(now);
        true
    }

    /// Lets the key up.
    ///
    /// The press is classified, appended to the pending group, and the commit
    /// timer is (re)started.
    ///
    /// # Arguments
    ///
    /// * `now` - When the key came up
    /// * `timers` - The session's timer queue
    ///
    /// # Returns
    ///
    /// The keyed symbol, or `None` if the key was not down.
    pub fn release(&mut self, now: Instant, timers: &mut Scheduler<Deferred>) -> Option<Symbol>
    {
        let KeyState::Pressed { since } = self.state
        else
        {
            return None;
        };

        self.state = KeyState::Idle;

        let held = now.saturating_duration_since(since);
        let symbol = self.config.classify(held);
        self.pending.push(symbol.as_char());
        debug!("Keyed {symbol} after {}ms", held.as_millis());

        if let Some(timer) = self.commit_timer.take()
        {
            timers.cancel(timer);
        }
        self.commit_timer = Some(timers.schedule(
            now,
            self.config.commit_delay,
            Deferred::CommitGroup,
        ));

        Some(symbol)
    }

    /// Takes the pending group once the commit timer has fired.
    ///
    /// # Returns
    ///
    /// The committed symbols, or `None` if nothing was pending.
    pub fn commit(&mut self) -> Option<String>
    {
        self.commit_timer = None;

        if self.pending.is_empty()
        {
            return None;
        }

        Some(std::mem::take(&mut self.pending))
    }
}
