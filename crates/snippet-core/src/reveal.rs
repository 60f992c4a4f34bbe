//! Typewriter reveal of a target string.
//!
//! [`Reveal`] holds the progress through one target; [`RevealTimer`] is the
//! repeating timer that drives it. The timer is aborted when dropped, so
//! replacing it along with the target is enough to stop frames for a stale
//! string.

use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug, Clone, Default)]
pub struct Reveal {
    target: String,
    shown: usize, // byte offset, always on a char boundary
}

impl Reveal {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            shown: 0,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn displayed(&self) -> &str {
        &self.target[..self.shown]
    }

    pub fn is_complete(&self) -> bool {
        self.shown == self.target.len()
    }

    /// Number of frames still to be shown.
    pub fn remaining(&self) -> usize {
        self.target[self.shown..].chars().count()
    }

    /// Show one more character. Returns false once the whole target is visible.
    pub fn advance(&mut self) -> bool {
        match self.target[self.shown..].chars().next() {
            Some(ch) => {
                self.shown += ch.len_utf8();
                true
            }
            None => false,
        }
    }

    pub fn finish(&mut self) {
        self.shown = self.target.len();
    }
}

/// Repeating timer firing `on_frame` every `delay`, at most `frames` times.
///
/// `on_frame` returning false stops the timer early (e.g. the receiving side
/// is gone).
pub struct RevealTimer {
    task: JoinHandle<()>,
}

impl RevealTimer {
    pub fn start<F>(delay: Duration, frames: usize, mut on_frame: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let task = tokio::spawn(async move {
            // interval() panics on a zero period
            let mut interval = tokio::time::interval(delay.max(Duration::from_millis(1)));
            // First tick completes immediately; the first character should appear after one delay.
            interval.tick().await;
            for _ in 0..frames {
                interval.tick().await;
                if !on_frame() {
                    break;
                }
            }
        });

        Self { task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RevealTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
