//! Per-recorder interaction state

use chrono::{DateTime, Duration, Utc};
use soulrecorder_event_store::{ScrollDirection, ScrollInfo, ScrollPosition};

/// Remembers the last focused element to drop repeated focus events.
#[derive(Debug)]
pub struct FocusTracker<N> {
    last: Option<N>,
}

impl<N> Default for FocusTracker<N> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<N: PartialEq + Clone> FocusTracker<N> {
    /// Returns `true` when `node` differs from the previously focused element.
    pub fn observe(&mut self, node: &N) -> bool {
        if self.last.as_ref() == Some(node) {
            return false;
        }
        self.last = Some(node.clone());
        true
    }

    pub fn last(&self) -> Option<&N> {
        self.last.as_ref()
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[derive(Clone, Copy, Debug)]
struct Burst {
    start: ScrollPosition,
    started_at: DateTime<Utc>,
    last_event_at: DateTime<Utc>,
    last_velocity: i64,
}

/// Groups scroll events into bursts separated by an idle window.
#[derive(Debug)]
pub struct ScrollTracker {
    idle: Duration,
    last: ScrollPosition,
    last_at: DateTime<Utc>,
    burst: Option<Burst>,
}

impl ScrollTracker {
    pub fn new(idle: Duration, position: ScrollPosition, at: DateTime<Utc>) -> Self {
        Self {
            idle,
            last: position,
            last_at: at,
            burst: None,
        }
    }

    pub fn is_scrolling(&self) -> bool {
        self.burst.is_some()
    }

    /// Feed a scroll event; yields the `scroll_start` payload for the first
    /// event of a burst.
    pub fn on_scroll(&mut self, position: ScrollPosition, now: DateTime<Utc>) -> Option<ScrollInfo> {
        let dx = position.x - self.last.x;
        let dy = position.y - self.last.y;
        let elapsed_ms = (now - self.last_at).num_milliseconds();
        let velocity = if elapsed_ms > 0 {
            (dx.hypot(dy) / elapsed_ms as f64 * 1000.0).round() as i64
        } else {
            0
        };

        let started = match self.burst.as_mut() {
            Some(burst) => {
                burst.last_event_at = now;
                burst.last_velocity = velocity;
                None
            }
            None => {
                self.burst = Some(Burst {
                    start: self.last,
                    started_at: now,
                    last_event_at: now,
                    last_velocity: velocity,
                });
                Some(ScrollInfo {
                    x: position.x,
                    y: position.y,
                    start_x: self.last.x,
                    start_y: self.last.y,
                    ..Default::default()
                })
            }
        };

        self.last = position;
        self.last_at = now;
        started
    }

    /// Yields the burst summary once the idle window has passed since the
    /// last scroll event, and closes the burst.
    pub fn poll_end(&mut self, now: DateTime<Utc>) -> Option<ScrollInfo> {
        let burst = self.burst?;
        if now - burst.last_event_at < self.idle {
            return None;
        }
        self.burst = None;

        let delta_x = self.last.x - burst.start.x;
        let delta_y = self.last.y - burst.start.y;
        Some(ScrollInfo {
            x: self.last.x,
            y: self.last.y,
            start_x: burst.start.x,
            start_y: burst.start.y,
            delta_x: Some(delta_x),
            delta_y: Some(delta_y),
            distance: Some(delta_x.hypot(delta_y).round() as i64),
            direction: Some(ScrollDirection::from_delta(delta_x, delta_y)),
            velocity: Some(burst.last_velocity),
            duration: Some((burst.last_event_at - burst.started_at).num_milliseconds()),
        })
    }
}

/// Detects URL changes between checks.
#[derive(Debug, Clone)]
pub struct NavigationTracker {
    current: String,
}

impl NavigationTracker {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            current: url.into(),
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Returns `(from, to)` when `url` differs from the last seen one.
    pub fn check(&mut self, url: &str) -> Option<(String, String)> {
        if url == self.current {
            return None;
        }
        let from = std::mem::replace(&mut self.current, url.to_string());
        Some((from, url.to_string()))
    }
}
