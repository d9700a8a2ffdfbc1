//! Cancellable delayed actions.
//!
//! A small timer queue owned by the UI session. Nothing runs on its own:
//! the event loop asks for [`Scheduler::next_deadline`] to size its poll
//! timeout and calls [`Scheduler::take_due`] to collect the actions whose
//! deadline has passed. Time is always passed in, which keeps every timer
//! deterministic under test.
use std::time::{Duration, Instant};

/// Handle to a scheduled action.
///
/// Handles are never reused, so a stale handle can't cancel a newer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// An action waiting for its deadline.
#[derive(Debug)]
struct Pending<T>
{
    /// Identity handed back to the caller
    handle: TaskHandle,
    /// When the action becomes due
    deadline: Instant,
    /// The action itself
    action: T,
}

/// Queue of delayed actions.
#[derive(Debug)]
pub struct Scheduler<T>
{
    /// Next handle to give out
    next_id: u64,
    /// Outstanding actions in scheduling order
    pending: Vec<Pending<T>>,
}

impl<T> Default for Scheduler<T>
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl<T> Scheduler<T>
{
    /// Creates an empty scheduler.
    #[must_use]
    pub const fn new() -> Self
    {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Schedules `action` to become due `delay` after `now`.
    ///
    /// # Arguments
    ///
    /// * `now` - The current instant
    /// * `delay` - How long to wait
    /// * `action` - What to hand back once due
    ///
    /// # Returns
    ///
    /// The handle to cancel the action with.
    pub fn schedule(&mut self, now: Instant, delay: Duration, action: T) -> TaskHandle
    {
        let handle = TaskHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        self.pending.push(Pending {
            handle,
            deadline: now.checked_add(delay).unwrap_or(now),
            action,
        });

        handle
    }

    /// Cancels a scheduled action.
    ///
    /// Cancelling is idempotent: a handle that already fired or was already
    /// cancelled is simply ignored.
    ///
    /// # Returns
    ///
    /// `true` if the action was still pending and has now been removed.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool
    {
        let before = self.pending.len();
        self.pending
            .retain(|task| task.handle != handle);

        self.pending.len() != before
    }

    /// Whether the action behind `handle` is still waiting.
    #[must_use]
    pub fn is_pending(&self, handle: TaskHandle) -> bool
    {
        self.pending
            .iter()
            .any(|task| task.handle == handle)
    }

    /// Earliest outstanding deadline, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant>
    {
        self.pending
            .iter()
            .map(|task| task.deadline)
            .min()
    }

    /// Number of outstanding actions.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.pending.len()
    }

    /// Whether nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.pending.is_empty()
    }

    /// Removes and returns every action due at `now`.
    ///
    /// Actions come back ordered by deadline; equal deadlines keep the order
    /// they were scheduled in.
    pub fn take_due(&mut self, now: Instant) -> Vec<T>
    {
        let (mut due, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|task| task.deadline <= now);

        self.pending = waiting;

        // Stable sort keeps scheduling order between equal deadlines.
        due.sort_by_key(|task| task.deadline);
        due.into_iter()
            .map(|task| task.action)
            .collect()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    const fn ms(millis: u64) -> Duration
    {
        Duration::from_millis(millis)
    }

    #[test]
    fn action_fires_only_after_deadline()
    {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(start, ms(600), "commit");

        assert!(scheduler.take_due(start + ms(599)).is_empty());
        assert_eq!(scheduler.take_due(start + ms(600)), vec!["commit"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cancel_is_idempotent()
    {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule(start, ms(50), ());

        assert!(scheduler.is_pending(handle));
        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        assert!(!scheduler.is_pending(handle));
        assert!(scheduler.take_due(start + ms(100)).is_empty());
    }

    #[test]
    fn cancel_after_firing_is_a_no_op()
    {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        let fired = scheduler.schedule(start, ms(10), 1);
        let waiting = scheduler.schedule(start, ms(500), 2);

        assert_eq!(scheduler.take_due(start + ms(10)), vec![1]);
        assert!(!scheduler.cancel(fired));
        assert!(scheduler.is_pending(waiting));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn due_actions_come_back_in_deadline_order()
    {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(start, ms(600), "late");
        scheduler.schedule(start, ms(50), "early");
        scheduler.schedule(start, ms(50), "early-second");

        assert_eq!(scheduler.next_deadline(), Some(start + ms(50)));
        assert_eq!(
            scheduler.take_due(start + ms(1000)),
            vec!["early", "early-second", "late"]
        );
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn handles_are_not_reused()
    {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        let first = scheduler.schedule(start, ms(1), ());
        scheduler.cancel(first);
        let second = scheduler.schedule(start, ms(1), ());

        assert_ne!(first, second);
        assert!(!scheduler.cancel(first));
        assert!(scheduler.is_pending(second));
    }
}
