//! Trailing-edge coalescing timer.
//!
//! Rapid rectangle updates collapse into one recomputation once the input
//! has been quiet for `delay_ms`. Latest value wins. Time is supplied by the
//! caller, so the timer never fires on its own: the host polls it from
//! incoming events or a tick, and the gesture flushes it on release so the
//! final value is always delivered.

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay_ms: u64,
    pending: Option<T>,
    deadline: u64,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
            deadline: 0,
        }
    }

    /// Store `value` and restart the quiet period.
    pub fn push(&mut self, value: T, now_ms: u64) {
        self.pending = Some(value);
        self.deadline = now_ms.saturating_add(self.delay_ms);
    }

    /// Take the pending value if the quiet period has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<T> {
        if self.pending.is_some() && now_ms >= self.deadline {
            return self.pending.take();
        }
        None
    }

    /// Take the pending value immediately.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value becomes due, for hosts that schedule a timer.
    pub fn deadline(&self) -> Option<u64> {
        self.pending.as_ref().map(|_| self.deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesces_until_quiet() {
        let mut d = Debouncer::new(80);
        d.push(1, 0);
        d.push(2, 50);
        assert_eq!(d.poll(100), None, "quiet period restarted at 50");
        assert_eq!(d.poll(130), Some(2));
        assert_eq!(d.poll(500), None);
    }

    #[test]
    fn flush_delivers_latest_early() {
        let mut d = Debouncer::new(80);
        d.push("a", 10);
        d.push("b", 20);
        assert_eq!(d.deadline(), Some(100));
        assert_eq!(d.flush(), Some("b"));
        assert!(!d.is_pending());
        assert_eq!(d.deadline(), None);
    }

    #[test]
    fn cancel_drops_pending() {
        let mut d = Debouncer::new(80);
        d.push(7, 0);
        d.cancel();
        assert_eq!(d.poll(1_000), None);
    }
}
