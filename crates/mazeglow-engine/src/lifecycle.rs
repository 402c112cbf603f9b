//! Visual lifecycle of the background canvas.
//!
//! The canvas cycles strictly through `Hidden -> FadingIn -> Visible ->
//! FadingOut -> Hidden`. Fades advance with [`VisualLifecycle::update`];
//! [`VisualLifecycle::reveal`] and [`VisualLifecycle::conceal`] start them.
//! A new generation may only be issued while the canvas is `Hidden`.

use std::collections::VecDeque;
use std::time::Duration;

/// Transitions remembered for inspection.
const HISTORY_LEN: usize = 64;

/// Where the canvas is in its fade cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisualState {
    /// Fully transparent; a new job may start.
    #[default]
    Hidden,
    /// Opacity rising toward 1.
    FadingIn,
    /// Fully shown.
    Visible,
    /// Opacity falling toward 0.
    FadingOut,
}

impl VisualState {
    /// The only state this one may move to.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Hidden => Self::FadingIn,
            Self::FadingIn => Self::Visible,
            Self::Visible => Self::FadingOut,
            Self::FadingOut => Self::Hidden,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::FadingIn => "fading-in",
            Self::Visible => "visible",
            Self::FadingOut => "fading-out",
        }
    }
}

impl std::fmt::Display for VisualState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Easing curve applied to fade progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FadeEasing {
    /// Linear interpolation.
    Linear,
    /// Ease in (slow start).
    EaseIn,
    /// Ease out (slow end).
    EaseOut,
    /// Ease in and out (slow start and end).
    #[default]
    EaseInOut,
}

impl FadeEasing {
    /// Applies the easing function to a normalized time value.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            },
        }
    }
}

/// The canvas fade state machine.
#[derive(Debug, Clone)]
pub struct VisualLifecycle {
    state: VisualState,
    fade_in: Duration,
    fade_out: Duration,
    easing: FadeEasing,
    elapsed: Duration,
    fade_from: f32,
    opacity: f32,
    history: VecDeque<VisualState>,
    cycles: u64,
}

impl VisualLifecycle {
    /// Creates a hidden lifecycle.
    #[must_use]
    pub fn new(fade_in: Duration, fade_out: Duration) -> Self {
        Self {
            state: VisualState::Hidden,
            fade_in,
            fade_out,
            easing: FadeEasing::default(),
            elapsed: Duration::ZERO,
            fade_from: 0.0,
            opacity: 0.0,
            history: VecDeque::from([VisualState::Hidden]),
            cycles: 0,
        }
    }

    /// Sets the easing curve.
    #[must_use]
    pub fn with_easing(mut self, easing: FadeEasing) -> Self {
        self.easing = easing;
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> VisualState {
        self.state
    }

    /// Current canvas opacity, 0.0-1.0.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Whether a new job may be issued.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.state == VisualState::Hidden
    }

    /// Completed `FadingOut -> Hidden` transitions.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Recent states, oldest first.
    pub fn history(&self) -> impl Iterator<Item = VisualState> + '_ {
        self.history.iter().copied()
    }

    fn enter(&mut self, to: VisualState) {
        debug_assert_eq!(to, self.state.next(), "{} -> {to} skips a state", self.state);
        if self.state == VisualState::FadingOut {
            self.cycles += 1;
        }
        self.state = to;
        self.elapsed = Duration::ZERO;
        self.fade_from = self.opacity;
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(to);
    }

    /// Starts fading in. Only possible from `Hidden`.
    pub fn reveal(&mut self) -> bool {
        if self.state != VisualState::Hidden {
            return false;
        }
        self.enter(VisualState::FadingIn);
        true
    }

    /// Starts fading out. A fade-in in progress passes through `Visible`
    /// and fades out from its current opacity. Returns `false` when already
    /// fading out or hidden.
    pub fn conceal(&mut self) -> bool {
        match self.state {
            VisualState::Hidden | VisualState::FadingOut => false,
            VisualState::FadingIn => {
                self.enter(VisualState::Visible);
                self.enter(VisualState::FadingOut);
                true
            },
            VisualState::Visible => {
                self.enter(VisualState::FadingOut);
                true
            },
        }
    }

    /// Advances the active fade. Returns the new state when a fade
    /// completed during this step.
    pub fn update(&mut self, dt: Duration) -> Option<VisualState> {
        let duration = match self.state {
            VisualState::FadingIn => self.fade_in,
            VisualState::FadingOut => self.fade_out,
            VisualState::Hidden | VisualState::Visible => return None,
        };
        self.elapsed += dt;
        let t = if duration.is_zero() {
            1.0
        } else {
            self.elapsed.as_secs_f32() / duration.as_secs_f32()
        };
        let eased = self.easing.apply(t);

        if self.state == VisualState::FadingIn {
            self.opacity = self.fade_from + (1.0 - self.fade_from) * eased;
        } else {
            self.opacity = self.fade_from * (1.0 - eased);
        }

        if t >= 1.0 {
            self.opacity = if self.state == VisualState::FadingIn { 1.0 } else { 0.0 };
            self.enter(self.state.next());
            return Some(self.state);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn lifecycle() -> VisualLifecycle {
        VisualLifecycle::new(ms(800), ms(800)).with_easing(FadeEasing::Linear)
    }

    #[test]
    fn test_starts_hidden() {
        let lc = lifecycle();
        assert!(lc.is_hidden());
        assert!(lc.opacity().abs() < f32::EPSILON);
    }

    #[test]
    fn test_full_cycle() {
        let mut lc = lifecycle();
        assert!(lc.reveal());
        assert_eq!(lc.update(ms(400)), None);
        assert!((lc.opacity() - 0.5).abs() < 1e-4);
        assert_eq!(lc.update(ms(400)), Some(VisualState::Visible));
        assert!((lc.opacity() - 1.0).abs() < f32::EPSILON);
        assert!(lc.conceal());
        assert_eq!(lc.update(ms(800)), Some(VisualState::Hidden));
        assert!(lc.opacity().abs() < f32::EPSILON);
        assert_eq!(lc.cycles(), 1);
    }

    #[test]
    fn test_reveal_only_from_hidden() {
        let mut lc = lifecycle();
        lc.reveal();
        assert!(!lc.reveal());
        lc.update(ms(800));
        assert!(!lc.reveal());
    }

    #[test]
    fn test_conceal_mid_fade_in() {
        let mut lc = lifecycle();
        lc.reveal();
        lc.update(ms(200));
        let before = lc.opacity();
        assert!(lc.conceal());
        assert_eq!(lc.state(), VisualState::FadingOut);
        assert!((lc.opacity() - before).abs() < f32::EPSILON);
        let states: Vec<_> = lc.history().collect();
        assert_eq!(
            states,
            vec![
                VisualState::Hidden,
                VisualState::FadingIn,
                VisualState::Visible,
                VisualState::FadingOut
            ]
        );
        lc.update(ms(400));
        assert!((lc.opacity() - before * 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_conceal_is_idempotent() {
        let mut lc = lifecycle();
        assert!(!lc.conceal());
        lc.reveal();
        lc.update(ms(800));
        assert!(lc.conceal());
        assert!(!lc.conceal());
    }

    #[test]
    fn test_zero_duration_fades() {
        let mut lc = VisualLifecycle::new(Duration::ZERO, Duration::ZERO);
        lc.reveal();
        assert_eq!(lc.update(Duration::ZERO), Some(VisualState::Visible));
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [FadeEasing::Linear, FadeEasing::EaseIn, FadeEasing::EaseOut, FadeEasing::EaseInOut] {
            assert!(easing.apply(0.0).abs() < f32::EPSILON);
            assert!((easing.apply(1.0) - 1.0).abs() < f32::EPSILON);
        }
        assert!((FadeEasing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[derive(Debug, Clone, Copy)]
    enum Poke {
        Reveal,
        Conceal,
        Wait(u64),
    }

    fn arb_poke() -> impl Strategy<Value = Poke> {
        prop_oneof![
            Just(Poke::Reveal),
            Just(Poke::Conceal),
            (0u64..1200).prop_map(Poke::Wait),
        ]
    }

    proptest! {
        #[test]
        fn prop_states_follow_cycle(pokes in prop::collection::vec(arb_poke(), 0..60)) {
            let mut lc = lifecycle();
            for poke in pokes {
                match poke {
                    Poke::Reveal => { lc.reveal(); },
                    Poke::Conceal => { lc.conceal(); },
                    Poke::Wait(millis) => { lc.update(ms(millis)); },
                }
                prop_assert!((0.0..=1.0).contains(&lc.opacity()));
            }
            let states: Vec<_> = lc.history().collect();
            for pair in states.windows(2) {
                prop_assert_eq!(pair[1], pair[0].next());
            }
        }
    }
}
