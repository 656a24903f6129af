/// Behavioral signals the host page dispatches while a popup waits for its
/// trigger. Which ones matter depends on the configured trigger kind; the
/// rest are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageSignal {
    /// Vertical scroll position changed.
    Scroll,
    /// Any click anywhere on the page.
    Click,
    /// Pointer left the document; `client_y` is the cursor's viewport Y
    /// coordinate at the moment of leaving.
    PointerLeave { client_y: f64 },
}

/// User inputs routed to an open popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupInput {
    SpinPressed,
    ClosePressed,
    NoThanksPressed,
    /// Click landing on the backdrop, outside the modal bounds.
    BackdropPressed,
    EscapePressed,
    TabPressed { shift: bool },
    /// The renderer finished the rotation animation.
    SpinAnimationDone,
}

/// Interactive elements the focus trap cycles through. The set is
/// recomputed per phase: the spin control disappears once spinning starts
/// and a claim link may appear at reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Close,
    Spin,
    NoThanks,
    ClaimLink,
}
