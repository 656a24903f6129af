use rand::Rng;

/// Degrees in one full turn. Segment 0 starts at the 12-o'clock reference
/// direction; the pointer is fixed at that same direction.
pub const FULL_TURN_DEGREES: f64 = 360.0;
/// Fewest whole extra turns added to a spin.
pub const MIN_EXTRA_TURNS: u32 = 5;
/// Most whole extra turns added to a spin.
pub const MAX_EXTRA_TURNS: u32 = 8;

/// Outcome of one spin: computed once per activation, never recomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinOutcome {
    /// Index of the winning promotion, in `[0, n)`.
    pub winning_index: usize,
    /// Absolute rotation target in plain real degrees; mod 360 it rests on
    /// the winning segment's midpoint.
    pub rotation_degrees: f64,
}

/// Angular size of one segment when the wheel carries `n` entries.
pub fn segment_size(n: usize) -> f64 {
    FULL_TURN_DEGREES / n as f64
}

/// Center of segment `index`, measured from the reference direction.
/// Segment `i` spans `[i * 360/n, (i + 1) * 360/n)`.
pub fn segment_midpoint(n: usize, index: usize) -> f64 {
    (index as f64 + 0.5) * segment_size(n)
}

/// Deterministic rotation target: rests the midpoint of `winning_index`
/// under the fixed pointer after `extra_turns` whole forward turns past
/// `current_rotation`. Monotonically non-decreasing across repeated spins;
/// never wraps negative.
pub fn rotation_for(
    n: usize,
    winning_index: usize,
    current_rotation: f64,
    extra_turns: u32,
) -> f64 {
    let midpoint = segment_midpoint(n, winning_index);
    let sub_turn = current_rotation.rem_euclid(FULL_TURN_DEGREES);
    let whole_turns = current_rotation - sub_turn;
    // One more turn when the midpoint sits behind the current sub-turn
    // angle, so the delta always contains exactly `extra_turns` whole turns.
    let bump = if midpoint < sub_turn {
        FULL_TURN_DEGREES
    } else {
        0.0
    };
    whole_turns + f64::from(extra_turns) * FULL_TURN_DEGREES + bump + midpoint
}

/// Draws a uniform winning segment and a uniform 5..=8 extra-turn flourish
/// from the injected source. `None` only when the wheel has no segments,
/// which the lifecycle never allows to activate.
pub fn spin<R: Rng + ?Sized>(
    n: usize,
    current_rotation: f64,
    rng: &mut R,
) -> Option<SpinOutcome> {
    if n == 0 {
        return None;
    }
    let winning_index = rng.gen_range(0..n);
    let extra_turns = rng.gen_range(MIN_EXTRA_TURNS..=MAX_EXTRA_TURNS);
    Some(SpinOutcome {
        winning_index,
        rotation_degrees: rotation_for(n, winning_index, current_rotation, extra_turns),
    })
}
