//! Easing curves for stepped tweens.

use crate::AnimationError;

/// Easing kind.
///
/// The four named curves are evaluated by [`ease`]. Any other name is kept
/// verbatim for native transitions and behaves like `Linear` when stepped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// A curve only the host understands, e.g. `cubic-bezier(...)`.
    Custom(String),
}

impl Easing {
    /// Parse an easing name. Only an empty name is rejected.
    pub fn parse(s: &str) -> Result<Self, AnimationError> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "" => Err(AnimationError::InvalidEasing(s.to_string())),
            "linear" => Ok(Easing::Linear),
            "ease-in" => Ok(Easing::EaseIn),
            "ease-out" => Ok(Easing::EaseOut),
            "ease-in-out" => Ok(Easing::EaseInOut),
            _ => Ok(Easing::Custom(s.to_string())),
        }
    }

    /// The name used in a `transition` declaration.
    pub fn as_css(&self) -> &str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "ease-in",
            Easing::EaseOut => "ease-out",
            Easing::EaseInOut => "ease-in-out",
            Easing::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for Easing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_css())
    }
}

fn ease_in(start: f64, t: f64, end: f64) -> f64 {
    start + t.powf(1.25) * (end - start)
}

fn ease_out(start: f64, t: f64, end: f64) -> f64 {
    start + t.powf(0.5) * (end - start)
}

/// Value at `step` of `total_steps`.
///
/// Linear uses the per-step `delta`; the curves interpolate between `start` and
/// `end` directly. The final step returns `end` exactly.
pub fn ease(start: f64, step: u32, total_steps: u32, delta: f64, end: f64, easing: &Easing) -> f64 {
    if step == total_steps {
        return end;
    }

    let t = f64::from(step) / f64::from(total_steps);
    match easing {
        Easing::EaseIn => ease_in(start, t, end),
        Easing::EaseOut => ease_out(start, t, end),
        Easing::EaseInOut => {
            if f64::from(step) < f64::from(total_steps) / 2.0 {
                ease_in(start, t, end)
            } else {
                ease_out(start, t, end)
            }
        }
        Easing::Linear | Easing::Custom(_) => start + f64::from(step) * delta,
    }
}

/// Like [`ease`], but intermediate values are clamped to `0..=255` and rounded.
pub fn ease_channel(
    start: f64,
    step: u32,
    total_steps: u32,
    delta: f64,
    end: f64,
    easing: &Easing,
) -> f64 {
    if step == total_steps {
        return end;
    }
    ease(start, step, total_steps, delta, end, easing)
        .clamp(0.0, 255.0)
        .round()
}
