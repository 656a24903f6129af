//! Trigger-and-lifecycle state machine and spin outcome engine for an
//! on-page promotional "spin-the-wheel" popup.
//!
//! The crate owns three things: a one-shot [`trigger::TriggerScheduler`]
//! that converts a configured behavioral signal into a single fire, a pure
//! [`wheel`] module that turns a random prize selection into a
//! reproducible rotation angle, and the [`lifecycle::Popup`] state machine
//! orchestrating trigger, display, spin, reveal and dismissal with
//! per-visitor frequency capping.
//!
//! Everything else is a collaborator behind a trait: rendering
//! ([`lifecycle::PopupView`]), persistence ([`store::KeyValueStore`]),
//! environment queries ([`env::Environment`]) and randomness
//! ([`rand::RngCore`]). The host drives the whole thing from a single
//! logical thread by dispatching events and polling the clock.

pub mod config;
pub mod env;
pub mod events;
pub mod lifecycle;
pub mod overlay;
pub mod promotion;
pub mod store;
pub mod trigger;
pub mod wheel;

pub use config::{ConfigError, PopupConfig, RawPopupConfig, StorageDuration, TriggerKind};
pub use env::Environment;
pub use events::{FocusTarget, PageSignal, PopupInput};
pub use lifecycle::{Phase, Popup, PopupView};
pub use overlay::{OverlayManager, ScrollLockGuard};
pub use promotion::{CallToAction, Promotion, RawPromotion};
pub use store::{KeyValueStore, MemoryStore, PopupId, Scope, SeenLedger, StoreError};
pub use trigger::TriggerScheduler;
pub use wheel::SpinOutcome;
