use std::cell::RefCell;
use std::rc::Rc;

use rand::RngCore;
use strum::Display as StrumDisplay;

use crate::config::PopupConfig;
use crate::env::Environment;
use crate::events::{FocusTarget, PageSignal, PopupInput};
use crate::overlay::{OverlayManager, ScrollLockGuard};
use crate::promotion::Promotion;
use crate::store::{KeyValueStore, PopupId, SeenLedger};
use crate::trigger::TriggerScheduler;
use crate::wheel::{self, SpinOutcome};

/// Spin length substituted when the environment asks for reduced motion.
pub const REDUCED_MOTION_SPIN_MS: u64 = 200;
/// Slack on the completion deadline so a prompt animation-end signal
/// normally wins the race against the timeout fallback.
pub const SPIN_DEADLINE_GRACE_MS: u64 = 50;

/// Lifecycle phases of one activation. `Checking` resolves within the call
/// that entered it; `Closed` is terminal — an instance never re-arms within
/// the same page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
pub enum Phase {
    Armed,
    Checking,
    Displaying,
    Spinning,
    Revealed,
    Closing,
    Closed,
}

/// Render intents, consumed by the rendering collaborator. The core never
/// knows how these are drawn; the host reports rotation completion back as
/// [`PopupInput::SpinAnimationDone`], with [`Popup::poll`] as the mandatory
/// timeout fallback.
pub trait PopupView {
    fn render_displaying(&mut self, config: &PopupConfig, promotions: &[Promotion]);
    fn render_spinning(&mut self, outcome: &SpinOutcome, duration_ms: u64);
    fn render_revealed(&mut self, winner: &Promotion);
    fn focus(&mut self, target: FocusTarget);
    fn teardown(&mut self);
}

// Shared single-threaded handle, same idea as the store and environment
// blanket impls.
impl<V: PopupView> PopupView for Rc<RefCell<V>> {
    fn render_displaying(&mut self, config: &PopupConfig, promotions: &[Promotion]) {
        self.borrow_mut().render_displaying(config, promotions);
    }

    fn render_spinning(&mut self, outcome: &SpinOutcome, duration_ms: u64) {
        self.borrow_mut().render_spinning(outcome, duration_ms);
    }

    fn render_revealed(&mut self, winner: &Promotion) {
        self.borrow_mut().render_revealed(winner);
    }

    fn focus(&mut self, target: FocusTarget) {
        self.borrow_mut().focus(target);
    }

    fn teardown(&mut self) {
        self.borrow_mut().teardown();
    }
}

/// One popup activation: trigger → display → spin → reveal → dismiss, with
/// per-visitor frequency capping. Owns the only mutable state in the core;
/// discarded once [`Phase::Closed`] is reached.
pub struct Popup<S, V, E, R> {
    id: PopupId,
    config: PopupConfig,
    promotions: Vec<Promotion>,
    phase: Phase,
    trigger: Option<TriggerScheduler>,
    ledger: SeenLedger<S>,
    view: V,
    env: E,
    rng: R,
    overlay: OverlayManager,
    scroll_guard: Option<ScrollLockGuard>,
    current_rotation: f64,
    outcome: Option<SpinOutcome>,
    spin_deadline_ms: Option<u64>,
    focus_index: usize,
}

impl<S, V, E, R> Popup<S, V, E, R>
where
    S: KeyValueStore,
    V: PopupView,
    E: Environment,
    R: RngCore,
{
    /// Arms a popup instance. `None` when there are no promotion entries:
    /// the feature stays inert — no trigger, no render, not an error.
    /// `Immediate` triggers (and a scroll trigger on a page with no
    /// overflow) activate synchronously before this returns.
    #[allow(clippy::too_many_arguments)]
    pub fn arm(
        id: PopupId,
        config: PopupConfig,
        promotions: Vec<Promotion>,
        store: S,
        view: V,
        env: E,
        rng: R,
        overlay: OverlayManager,
    ) -> Option<Self> {
        if promotions.is_empty() {
            log::debug!("Popup {id} has no promotions; staying inert");
            return None;
        }

        let trigger = TriggerScheduler::arm(&config, &env);
        let mut popup = Self {
            id,
            config,
            promotions,
            phase: Phase::Armed,
            trigger: Some(trigger),
            ledger: SeenLedger::new(store),
            view,
            env,
            rng,
            overlay,
            scroll_guard: None,
            current_rotation: 0.0,
            outcome: None,
            spin_deadline_ms: None,
            focus_index: 0,
        };
        popup.poll();
        Some(popup)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn id(&self) -> PopupId {
        self.id
    }

    /// The outcome computed for this activation, once a spin has started.
    pub fn outcome(&self) -> Option<&SpinOutcome> {
        self.outcome.as_ref()
    }

    fn is_open(&self) -> bool {
        matches!(
            self.phase,
            Phase::Displaying | Phase::Spinning | Phase::Revealed
        )
    }

    /// Feeds one behavioral page signal while the trigger is waiting.
    pub fn handle_page(&mut self, signal: PageSignal) {
        if self.phase != Phase::Armed {
            return;
        }
        let fired = match &mut self.trigger {
            Some(trigger) => trigger.observe(signal, &self.env),
            None => false,
        };
        if fired {
            self.activate();
        }
    }

    /// Advances the wall clock: drives the time trigger and the spin
    /// completion fallback, which guarantees `Spinning` terminates even if
    /// the animation-completion signal never arrives.
    pub fn poll(&mut self) {
        let now = self.env.now_ms();
        match self.phase {
            Phase::Armed => {
                let fired = self.trigger.as_mut().is_some_and(|t| t.poll(now));
                if fired {
                    self.activate();
                }
            }
            Phase::Spinning => {
                if self.spin_deadline_ms.is_some_and(|deadline| now >= deadline) {
                    self.reveal();
                }
            }
            _ => {}
        }
    }

    /// Routes one user input to the open popup. Everything that does not
    /// apply in the current phase — re-entrant spins, stray completion
    /// signals, inputs after close — is a no-op by contract.
    pub fn handle_input(&mut self, input: PopupInput) {
        match (self.phase, input) {
            (Phase::Displaying, PopupInput::SpinPressed) => self.start_spin(),
            (Phase::Spinning, PopupInput::SpinAnimationDone) => self.reveal(),
            (_, PopupInput::TabPressed { shift }) if self.is_open() => self.cycle_focus(shift),
            (
                _,
                PopupInput::ClosePressed
                | PopupInput::NoThanksPressed
                | PopupInput::BackdropPressed
                | PopupInput::EscapePressed,
            ) if self.is_open() => self.close(),
            _ => {}
        }
    }

    /// Tears the activation down. Idempotent: closing twice never panics
    /// and never double-releases the scroll lock. Also the early-teardown
    /// path — closing a still-armed popup cancels its trigger subscription.
    pub fn close(&mut self) {
        if matches!(self.phase, Phase::Closing | Phase::Closed) {
            return;
        }
        let was_open = self.is_open();
        self.phase = Phase::Closing;
        // A pending rotation-completion wait must not fire a stale reveal.
        self.spin_deadline_ms = None;
        if let Some(trigger) = &mut self.trigger {
            trigger.cancel();
        }
        self.trigger = None;
        if let Some(mut guard) = self.scroll_guard.take() {
            guard.release();
        }
        if was_open {
            self.view.teardown();
        }
        self.phase = Phase::Closed;
        log::debug!("Popup {} closed", self.id);
    }

    fn activate(&mut self) {
        // Fire delivered; the subscription and its listeners are done.
        self.trigger = None;
        self.phase = Phase::Checking;

        let now = self.env.now_ms();
        if self
            .ledger
            .has_been_seen(self.id, self.config.storage_duration, now)
        {
            log::debug!("Popup {} suppressed: already seen", self.id);
            self.phase = Phase::Closed;
            return;
        }
        // Marked at decision time, not at close: a reload or tab-close
        // mid-popup still counts as seen.
        self.ledger
            .mark_seen(self.id, self.config.storage_duration, now);

        self.scroll_guard = Some(self.overlay.acquire_scroll_lock());
        self.view.render_displaying(&self.config, &self.promotions);
        self.phase = Phase::Displaying;
        self.focus_first();
    }

    fn start_spin(&mut self) {
        let Some(outcome) = wheel::spin(self.promotions.len(), self.current_rotation, &mut self.rng)
        else {
            return;
        };
        self.current_rotation = outcome.rotation_degrees;

        let duration_ms = if self.env.prefers_reduced_motion() {
            REDUCED_MOTION_SPIN_MS
        } else {
            self.config.spin_duration_ms()
        };
        self.spin_deadline_ms = Some(self.env.now_ms() + duration_ms + SPIN_DEADLINE_GRACE_MS);

        self.view.render_spinning(&outcome, duration_ms);
        self.outcome = Some(outcome);
        self.phase = Phase::Spinning;
        self.focus_index = 0;
    }

    fn reveal(&mut self) {
        self.spin_deadline_ms = None;
        let Some(outcome) = self.outcome else {
            return;
        };
        let winner = &self.promotions[outcome.winning_index];
        self.view.render_revealed(winner);
        self.phase = Phase::Revealed;
        self.focus_first();
    }

    fn focus_first(&mut self) {
        self.focus_index = 0;
        if let Some(target) = self.focusables().first().copied() {
            self.view.focus(target);
        }
    }

    fn cycle_focus(&mut self, shift: bool) {
        let targets = self.focusables();
        if targets.is_empty() {
            return;
        }
        let len = targets.len();
        self.focus_index = if shift {
            (self.focus_index + len - 1) % len
        } else {
            (self.focus_index + 1) % len
        };
        self.view.focus(targets[self.focus_index]);
    }

    /// Interactive elements reachable right now. Recomputed on every key
    /// press because the set changes between phases.
    fn focusables(&self) -> Vec<FocusTarget> {
        match self.phase {
            Phase::Displaying => vec![FocusTarget::Close, FocusTarget::Spin, FocusTarget::NoThanks],
            // The spin control is disabled the instant spinning starts.
            Phase::Spinning => vec![FocusTarget::Close, FocusTarget::NoThanks],
            Phase::Revealed => {
                let mut targets = vec![FocusTarget::Close];
                if self.winner_has_cta() {
                    targets.push(FocusTarget::ClaimLink);
                }
                targets.push(FocusTarget::NoThanks);
                targets
            }
            _ => Vec::new(),
        }
    }

    fn winner_has_cta(&self) -> bool {
        self.outcome
            .as_ref()
            .is_some_and(|o| self.promotions[o.winning_index].cta.is_some())
    }
}
