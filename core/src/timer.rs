use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use serde::{Deserialize, Serialize};

use crate::Coord2;

/// Period of the elapsed-time ticker.
pub const TICK_PERIOD_MS: u32 = 1000;

/// Delay between two tiles of the end-of-game reveal.
pub const REVEAL_STEP_MS: u32 = 50;

/// Deferred work a session hands to its host, delivered back through
/// [`GameSession::handle_timer`](crate::GameSession::handle_timer).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerEvent {
    Tick,
    Reveal(Coord2),
}

/// Timer backend of a session.
///
/// Dropping a handle cancels its timer: the event is never delivered after
/// that, and dropping an already fired one-shot handle is harmless.
pub trait Scheduler {
    type Handle;

    /// Delivers `event` every `period_ms` until the handle is dropped.
    fn repeat(&mut self, period_ms: u32, event: TimerEvent) -> Self::Handle;

    /// Delivers `event` once after `delay_ms` unless the handle is dropped first.
    fn once(&mut self, delay_ms: u32, event: TimerEvent) -> Self::Handle;
}

#[derive(Debug)]
struct PendingTimer {
    due_ms: u64,
    period_ms: Option<u32>,
    event: TimerEvent,
}

#[derive(Debug, Default)]
struct TimerQueue {
    now_ms: u64,
    next_id: u64,
    timers: BTreeMap<u64, PendingTimer>,
}

impl TimerQueue {
    fn insert(&mut self, delay_ms: u32, period_ms: Option<u32>, event: TimerEvent) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.timers.insert(
            id,
            PendingTimer {
                due_ms: self.now_ms + u64::from(delay_ms),
                period_ms,
                event,
            },
        );
        id
    }

    fn pop_due(&mut self, until_ms: u64) -> Option<TimerEvent> {
        let (id, due_ms) = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.due_ms <= until_ms)
            .min_by_key(|&(&id, timer)| (timer.due_ms, id))
            .map(|(&id, timer)| (id, timer.due_ms))?;

        self.now_ms = due_ms;
        let timer = self.timers.get_mut(&id)?;
        let event = timer.event;
        match timer.period_ms {
            Some(period_ms) => timer.due_ms += u64::from(period_ms.max(1)),
            None => {
                self.timers.remove(&id);
            }
        }
        Some(event)
    }
}

/// Virtual clock for headless hosts and tests: time only moves on [`advance`].
///
/// [`advance`]: ManualScheduler::advance
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<TimerQueue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.queue.borrow().now_ms
    }

    /// Number of timers that are still armed.
    pub fn pending(&self) -> usize {
        self.queue.borrow().timers.len()
    }

    /// Moves the clock forward by `ms`, delivering every event that comes due in
    /// order. Events are delivered one at a time, so `deliver` may cancel
    /// timers that would otherwise fire later in the same step.
    pub fn advance(&self, ms: u64, mut deliver: impl FnMut(TimerEvent)) {
        let until_ms = self.now_ms() + ms;
        loop {
            let event = self.queue.borrow_mut().pop_due(until_ms);
            match event {
                Some(event) => deliver(event),
                None => break,
            }
        }
        self.queue.borrow_mut().now_ms = until_ms;
    }

    fn arm(&self, delay_ms: u32, period_ms: Option<u32>, event: TimerEvent) -> ManualTimer {
        let id = self.queue.borrow_mut().insert(delay_ms, period_ms, event);
        log::trace!("Armed timer {} for {:?} in {}ms", id, event, delay_ms);
        ManualTimer {
            id,
            queue: Rc::downgrade(&self.queue),
        }
    }
}

impl Scheduler for ManualScheduler {
    type Handle = ManualTimer;

    fn repeat(&mut self, period_ms: u32, event: TimerEvent) -> Self::Handle {
        self.arm(period_ms, Some(period_ms), event)
    }

    fn once(&mut self, delay_ms: u32, event: TimerEvent) -> Self::Handle {
        self.arm(delay_ms, None, event)
    }
}

/// Handle of a [`ManualScheduler`] timer, cancels on drop.
#[derive(Debug)]
pub struct ManualTimer {
    id: u64,
    queue: Weak<RefCell<TimerQueue>>,
}

impl Drop for ManualTimer {
    fn drop(&mut self) {
        if let Some(queue) = self.queue.upgrade() {
            queue.borrow_mut().timers.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn collect(clock: &ManualScheduler, ms: u64) -> Vec<TimerEvent> {
        let mut fired = Vec::new();
        clock.advance(ms, |event| fired.push(event));
        fired
    }

    #[test]
    fn one_shot_fires_once_when_due() {
        let mut clock = ManualScheduler::new();
        let _handle = clock.once(50, TimerEvent::Reveal((1, 2)));

        assert!(collect(&clock, 49).is_empty());
        assert_eq!(collect(&clock, 1), [TimerEvent::Reveal((1, 2))]);
        assert!(collect(&clock, 1000).is_empty());
        assert_eq!(clock.pending(), 0);
        assert_eq!(clock.now_ms(), 1050);
    }

    #[test]
    fn repeat_fires_every_period() {
        let mut clock = ManualScheduler::new();
        let _handle = clock.repeat(TICK_PERIOD_MS, TimerEvent::Tick);

        assert_eq!(collect(&clock, 3500).len(), 3);
        assert_eq!(collect(&clock, 500).len(), 1);
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn events_come_out_in_due_order() {
        let mut clock = ManualScheduler::new();
        let _late = clock.once(100, TimerEvent::Reveal((0, 0)));
        let _early = clock.once(50, TimerEvent::Reveal((1, 0)));
        let _tick = clock.repeat(60, TimerEvent::Tick);

        assert_eq!(
            collect(&clock, 120),
            [
                TimerEvent::Reveal((1, 0)),
                TimerEvent::Tick,
                TimerEvent::Reveal((0, 0)),
                TimerEvent::Tick,
            ]
        );
    }

    #[test]
    fn dropping_handle_cancels() {
        let mut clock = ManualScheduler::new();
        let handle = clock.once(10, TimerEvent::Tick);
        let ticker = clock.repeat(10, TimerEvent::Tick);
        assert_eq!(clock.pending(), 2);

        drop(handle);
        drop(ticker);

        assert_eq!(clock.pending(), 0);
        assert!(collect(&clock, 100).is_empty());
    }

    #[test]
    fn delivery_can_cancel_later_timers() {
        let mut clock = ManualScheduler::new();
        let mut handles = Vec::new();
        handles.push(clock.once(10, TimerEvent::Tick));
        handles.push(clock.once(20, TimerEvent::Reveal((0, 0))));

        let mut fired = Vec::new();
        clock.advance(100, |event| {
            fired.push(event);
            handles.clear();
        });

        assert_eq!(fired, [TimerEvent::Tick]);
    }
}
