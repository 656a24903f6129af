use std::cell::Cell;
use std::rc::Rc;

/// Process-wide coordinator for side effects shared across popup instances.
/// The background-scroll lock is held as a reference count: closing one
/// popup never unlocks scroll while another still holds a guard. Cloning
/// the manager clones the handle, not the count.
#[derive(Debug, Clone, Default)]
pub struct OverlayManager {
    scroll_locks: Rc<Cell<usize>>,
}

impl OverlayManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire_scroll_lock(&self) -> ScrollLockGuard {
        self.scroll_locks.set(self.scroll_locks.get() + 1);
        ScrollLockGuard {
            scroll_locks: Rc::clone(&self.scroll_locks),
            released: false,
        }
    }

    /// Whether any popup currently holds the background-scroll lock. The
    /// rendering collaborator watches this to toggle the actual lock.
    pub fn scroll_locked(&self) -> bool {
        self.scroll_locks.get() > 0
    }
}

/// Held while a popup is visible. Releasing twice is a no-op; dropping an
/// unreleased guard releases it.
#[derive(Debug)]
pub struct ScrollLockGuard {
    scroll_locks: Rc<Cell<usize>>,
    released: bool,
}

impl ScrollLockGuard {
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.scroll_locks
            .set(self.scroll_locks.get().saturating_sub(1));
    }
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        self.release();
    }
}
