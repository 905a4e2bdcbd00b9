//! Contract for the runtime writer of `--scrollbar-visible-width`.
//!
//! Generated rules only read the property with a `0px` fallback. A host that
//! can measure its viewport implements [`Viewport`] and writes the
//! declaration built here on load and on resize, rate limited by [`Throttle`]
//! (leading call immediately, trailing call at [`Throttle::deadline`]).

use std::time::{Duration, Instant};

use crate::calc::assign;
use crate::rules::Declaration;
use crate::vars::VarRegistry;

pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(200);

pub trait Viewport {
    /// Width in pixels a vertical scrollbar takes from the viewport.
    fn scrollbar_width(&self) -> u32;
    /// Whether the document is taller than the viewport.
    fn content_overflows(&self) -> bool;
    /// Whether the root element forces `overflow-y: scroll`.
    fn overflow_forced(&self) -> bool;
}

/// The measured width while a scrollbar is showing, else `0px`.
pub fn visible_width_declaration(viewport: &dyn Viewport, vars: &VarRegistry) -> Declaration {
    let width = if viewport.content_overflows() || viewport.overflow_forced() {
        viewport.scrollbar_width()
    } else {
        0
    };
    assign(&vars.scrollbar_visible_width, format!("{}px", width))
}

/// Admits at most one call per interval. A call rejected inside the window
/// is remembered and becomes due once the window closes, so the last resize
/// of a burst is still written. A zero interval admits every call.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
    pending: bool,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE)
    }
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
            pending: false,
        }
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        if self.interval.is_zero() {
            return true;
        }
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                self.pending = true;
                false
            }
            _ => {
                self.last = Some(now);
                self.pending = false;
                true
            }
        }
    }

    /// When the deferred trailing call should run, if one is waiting.
    pub fn deadline(&self) -> Option<Instant> {
        match (self.pending, self.last) {
            (true, Some(last)) => Some(last + self.interval),
            _ => None,
        }
    }

    /// Consumes the trailing call once its deadline has passed.
    pub fn flush(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.last = Some(now);
                self.pending = false;
                true
            }
            _ => false,
        }
    }
}
