use std::time::{Duration, Instant};

/// Trailing-edge coalescing: a value is released once `window` has passed
/// without a newer one arriving. Time is supplied by the caller.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Records a value, replacing any pending one and restarting the window.
    pub fn observe(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Releases the pending value if its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let elapsed = matches!(
            &self.pending,
            Some((_, seen)) if now.duration_since(*seen) >= self.window
        );
        if elapsed {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(50);

    #[test]
    fn burst_collapses_to_last_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);

        for (i, value) in ["a", "b", "c", "d"].into_iter().enumerate() {
            debouncer.observe(value, start + Duration::from_millis(10 * i as u64));
            assert_eq!(debouncer.poll(start + Duration::from_millis(10 * i as u64 + 5)), None);
        }

        assert_eq!(debouncer.poll(start + Duration::from_millis(30 + 50)), Some("d"));
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn waits_for_the_full_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.observe(Some(3usize), start);
        assert_eq!(debouncer.poll(start + Duration::from_millis(49)), None);
        assert_eq!(debouncer.poll(start + WINDOW), Some(Some(3)));
    }

    #[test]
    fn clearing_hover_is_a_value_too() {
        let start = Instant::now();
        let mut debouncer: Debouncer<Option<usize>> = Debouncer::new(WINDOW);
        debouncer.observe(Some(1), start);
        debouncer.observe(None, start + Duration::from_millis(20));
        assert_eq!(debouncer.poll(start + Duration::from_millis(60)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(70)), Some(None));
    }
}
