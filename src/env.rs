use std::rc::Rc;

/// Read-only queries against the hosting environment: wall clock, viewport
/// metrics for the scroll trigger, and the reduced-motion preference.
/// Injected so every time- and geometry-dependent decision is testable.
pub trait Environment {
    /// Current time in milliseconds. Drives trigger deadlines, spin
    /// completion fallbacks and suppression expiry.
    fn now_ms(&self) -> u64;
    /// Current vertical scroll offset, in pixels.
    fn scroll_offset(&self) -> f64;
    /// Total scrollable document height, in pixels.
    fn scroll_height(&self) -> f64;
    /// Visible viewport height, in pixels.
    fn viewport_height(&self) -> f64;
    /// Whether the environment asks for reduced motion.
    fn prefers_reduced_motion(&self) -> bool;
}

// Shared single-threaded handle, so the host (and tests) can keep a grip on
// the environment after handing it to a popup.
impl<E: Environment + ?Sized> Environment for Rc<E> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn scroll_offset(&self) -> f64 {
        (**self).scroll_offset()
    }

    fn scroll_height(&self) -> f64 {
        (**self).scroll_height()
    }

    fn viewport_height(&self) -> f64 {
        (**self).viewport_height()
    }

    fn prefers_reduced_motion(&self) -> bool {
        (**self).prefers_reduced_motion()
    }
}

/// Fixed-value environment for tests; fields are cells so a test can move
/// the clock or the scroll position while a popup holds a shared handle.
#[cfg(test)]
pub(crate) mod fake {
    use std::cell::Cell;

    use super::Environment;

    pub(crate) struct FakeEnv {
        pub now_ms: Cell<u64>,
        pub scroll_offset: Cell<f64>,
        pub scroll_height: Cell<f64>,
        pub viewport_height: Cell<f64>,
        pub reduced_motion: Cell<bool>,
    }

    impl Default for FakeEnv {
        fn default() -> Self {
            Self {
                now_ms: Cell::new(0),
                scroll_offset: Cell::new(0.0),
                scroll_height: Cell::new(3000.0),
                viewport_height: Cell::new(800.0),
                reduced_motion: Cell::new(false),
            }
        }
    }

    impl Environment for FakeEnv {
        fn now_ms(&self) -> u64 {
            self.now_ms.get()
        }

        fn scroll_offset(&self) -> f64 {
            self.scroll_offset.get()
        }

        fn scroll_height(&self) -> f64 {
            self.scroll_height.get()
        }

        fn viewport_height(&self) -> f64 {
            self.viewport_height.get()
        }

        fn prefers_reduced_motion(&self) -> bool {
            self.reduced_motion.get()
        }
    }
}
