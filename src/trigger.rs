use crate::config::{PopupConfig, TriggerKind};
use crate::env::Environment;
use crate::events::PageSignal;

/// Cursor Y distance from the top viewport edge that counts as an
/// exit-toward-tab-bar gesture, in device pixels.
pub const EXIT_EDGE_PX: f64 = 10.0;

/// One-shot subscription converting the configured behavioral signal into a
/// single fire. The value itself is the cancellation handle: the lifecycle
/// holds it and calls [`TriggerScheduler::cancel`] on early teardown.
///
/// Consumption model, matching the single cooperative thread the host runs:
/// page signals arrive through [`observe`](Self::observe), wall-clock time
/// through [`poll`](Self::poll). Exactly one of those calls returns `true`
/// over the scheduler's lifetime, no matter how many qualifying events
/// occur afterwards.
#[derive(Debug)]
pub struct TriggerScheduler {
    kind: TriggerKind,
    deadline_ms: Option<u64>,
    scroll_threshold: f64,
    pending: bool,
    spent: bool,
}

impl TriggerScheduler {
    /// Arms the configured trigger. `Immediate` — and `Scroll` on a page
    /// with no scrollable overflow, which could otherwise withhold the
    /// popup forever — resolve here and are delivered by the first `poll`.
    pub fn arm(config: &PopupConfig, env: &impl Environment) -> Self {
        let mut scheduler = Self {
            kind: config.trigger,
            deadline_ms: None,
            scroll_threshold: config.trigger_scroll_percent / 100.0,
            pending: false,
            spent: false,
        };

        match config.trigger {
            TriggerKind::Immediate => scheduler.pending = true,
            TriggerKind::Time => {
                scheduler.deadline_ms = Some(env.now_ms() + config.trigger_delay_ms());
            }
            TriggerKind::Scroll => {
                if env.scroll_height() <= env.viewport_height() {
                    scheduler.pending = true;
                }
            }
            TriggerKind::Exit | TriggerKind::FirstInteraction => {}
        }

        scheduler
    }

    /// Advances the wall clock. Delivers an arm-time fire or an elapsed
    /// time deadline.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.spent {
            return false;
        }
        if self.pending {
            return self.deliver();
        }
        if let Some(deadline) = self.deadline_ms
            && now_ms >= deadline
        {
            return self.deliver();
        }
        false
    }

    /// Feeds one page signal. Returns `true` on the single qualifying one.
    pub fn observe(&mut self, signal: PageSignal, env: &impl Environment) -> bool {
        if self.spent {
            return false;
        }
        let qualifies = match (self.kind, signal) {
            (TriggerKind::Scroll, PageSignal::Scroll) => {
                let max_scroll = env.scroll_height() - env.viewport_height();
                max_scroll <= 0.0 || env.scroll_offset() / max_scroll >= self.scroll_threshold
            }
            (TriggerKind::Exit, PageSignal::PointerLeave { client_y }) => {
                client_y < EXIT_EDGE_PX
            }
            (TriggerKind::FirstInteraction, PageSignal::Click | PageSignal::Scroll) => true,
            _ => false,
        };
        if qualifies { self.deliver() } else { false }
    }

    /// Turns the subscription inert; no fire will ever be delivered.
    pub fn cancel(&mut self) {
        if !self.spent {
            log::debug!("Trigger {} cancelled before firing", self.kind);
        }
        self.spent = true;
        self.pending = false;
    }

    /// Whether the fire was delivered or the subscription cancelled.
    pub fn is_spent(&self) -> bool {
        self.spent
    }

    fn deliver(&mut self) -> bool {
        self.spent = true;
        self.pending = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::fake::FakeEnv;

    fn config_with(trigger: TriggerKind) -> PopupConfig {
        PopupConfig {
            trigger,
            ..PopupConfig::default()
        }
    }

    #[test]
    fn immediate_fires_on_first_poll_only() {
        let env = FakeEnv::default();
        let mut t = TriggerScheduler::arm(&config_with(TriggerKind::Immediate), &env);

        assert!(t.poll(0));
        assert!(!t.poll(0));
        assert!(!t.observe(PageSignal::Click, &env));
    }

    #[test]
    fn time_trigger_respects_the_delay() {
        let env = FakeEnv::default();
        env.now_ms.set(500);
        let mut t = TriggerScheduler::arm(&config_with(TriggerKind::Time), &env);

        // Default delay is 3 seconds from arm time.
        assert!(!t.poll(500));
        assert!(!t.poll(3_499));
        assert!(t.poll(3_500));
        assert!(!t.poll(10_000));
    }

    #[test]
    fn scroll_trigger_fires_once_past_threshold() {
        let env = FakeEnv::default();
        env.scroll_height.set(3000.0);
        env.viewport_height.set(1000.0);
        let mut t = TriggerScheduler::arm(&config_with(TriggerKind::Scroll), &env);

        env.scroll_offset.set(500.0); // 25%, below the 50% default
        assert!(!t.observe(PageSignal::Scroll, &env));

        env.scroll_offset.set(1000.0); // exactly 50%
        assert!(t.observe(PageSignal::Scroll, &env));

        env.scroll_offset.set(2000.0);
        assert!(!t.observe(PageSignal::Scroll, &env));
        assert!(!t.observe(PageSignal::Scroll, &env));
    }

    #[test]
    fn short_page_fires_the_scroll_trigger_at_arm_time() {
        let env = FakeEnv::default();
        env.scroll_height.set(600.0);
        env.viewport_height.set(800.0);
        let mut t = TriggerScheduler::arm(&config_with(TriggerKind::Scroll), &env);

        assert!(t.poll(0));
    }

    #[test]
    fn exit_trigger_needs_the_top_edge() {
        let env = FakeEnv::default();
        let mut t = TriggerScheduler::arm(&config_with(TriggerKind::Exit), &env);

        assert!(!t.observe(PageSignal::PointerLeave { client_y: 300.0 }, &env));
        assert!(!t.observe(PageSignal::PointerLeave { client_y: 10.0 }, &env));
        assert!(t.observe(PageSignal::PointerLeave { client_y: 9.0 }, &env));
    }

    #[test]
    fn first_interaction_takes_click_or_scroll_whichever_is_first() {
        let env = FakeEnv::default();

        let mut t = TriggerScheduler::arm(&config_with(TriggerKind::FirstInteraction), &env);
        assert!(t.observe(PageSignal::Click, &env));
        assert!(!t.observe(PageSignal::Scroll, &env));

        let mut t = TriggerScheduler::arm(&config_with(TriggerKind::FirstInteraction), &env);
        assert!(!t.observe(PageSignal::PointerLeave { client_y: 0.0 }, &env));
        assert!(t.observe(PageSignal::Scroll, &env));
    }

    #[test]
    fn cancelled_subscriptions_stay_quiet() {
        let env = FakeEnv::default();
        let mut t = TriggerScheduler::arm(&config_with(TriggerKind::Time), &env);

        t.cancel();
        assert!(t.is_spent());
        assert!(!t.poll(u64::MAX));

        let mut t = TriggerScheduler::arm(&config_with(TriggerKind::Immediate), &env);
        t.cancel();
        assert!(!t.poll(0));
    }
}
