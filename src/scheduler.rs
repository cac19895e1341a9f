//! One-shot timers on a millisecond clock the host advances.
//!
//! Recurring work reschedules itself after it runs, so a job that decides
//! not to come back simply stops.

use crate::interface::Icon;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Job {
    /// One AI tick.
    Think,
    /// One render tick of the pet animation.
    Animate,
    /// One step of the play spin.
    Spin,
    /// Dim an icon after its click blink.
    Unblink(Icon),
}

#[derive(Debug)]
struct Timer {
    due: u64,
    seq: u64,
    job: Job,
}

#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    now: u64,
    seq: u64,
    timers: Vec<Timer>,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn after(&mut self, delay_ms: u64, job: Job) {
        let t = Timer {
            due: self.now.saturating_add(delay_ms),
            seq: self.seq,
            job,
        };
        self.seq += 1;
        // keep sorted by (due, seq); same-time jobs run in arrival order
        let at = self
            .timers
            .partition_point(|o| (o.due, o.seq) <= (t.due, t.seq));
        self.timers.insert(at, t);
    }

    /// Pops the earliest job due at or before `until`, moving the clock to
    /// its due time. Returns `None` and moves the clock to `until` when
    /// nothing else is due.
    pub(crate) fn next_due(&mut self, until: u64) -> Option<Job> {
        match self.timers.first() {
            Some(t) if t.due <= until => {
                let t = self.timers.remove(0);
                self.now = self.now.max(t.due);
                Some(t.job)
            }
            _ => {
                self.now = self.now.max(until);
                None
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self, job: Job) -> bool {
        self.timers.iter().any(|t| t.job == job)
    }

    pub(crate) fn clear(&mut self) {
        self.timers.clear();
    }
}
