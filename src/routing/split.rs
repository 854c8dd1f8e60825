//! Percentage-based traffic split.
//!
//! # Responsibilities
//! - Decide, per request, whether a split route uses its primary or secondary origin
//! - Honor the global gradual-migration switch
//!
//! # Design Decisions
//! - One uniform draw in 1..=100 per decision, never cached across requests
//! - Draws come from the thread-local generator, so there is no shared RNG state to lock
//! - The generator can be injected for deterministic tests

use rand::Rng;

/// Outcome of a split decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Primary,
    Secondary,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Primary => "primary",
            Split::Secondary => "secondary",
        }
    }
}

/// Samples split decisions.
#[derive(Debug, Clone, Copy)]
pub struct SplitDecider {
    enabled: bool,
}

impl SplitDecider {
    /// Create a decider. When `enabled` is false every decision is `Primary`.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Choose an origin for one request, sending `percent`% to the secondary.
    pub fn choose(&self, percent: u8) -> Split {
        self.choose_with(&mut rand::thread_rng(), percent)
    }

    /// Same as [`choose`](Self::choose) with a caller-supplied generator.
    pub fn choose_with<R: Rng + ?Sized>(&self, rng: &mut R, percent: u8) -> Split {
        if !self.enabled {
            return Split::Primary;
        }

        let draw: u8 = rng.gen_range(1..=100);
        if draw <= percent {
            Split::Secondary
        } else {
            Split::Primary
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn secondary_share(decider: SplitDecider, percent: u8, samples: usize, rng: &mut StdRng) -> f64 {
        let hits = (0..samples)
            .filter(|_| decider.choose_with(&mut *rng, percent) == Split::Secondary)
            .count();
        hits as f64 / samples as f64
    }

    #[test]
    fn test_disabled_never_migrates() {
        let decider = SplitDecider::new(false);
        for _ in 0..1_000 {
            assert_eq!(decider.choose(100), Split::Primary);
        }
    }

    #[test]
    fn test_bounds() {
        let decider = SplitDecider::new(true);
        for _ in 0..1_000 {
            assert_eq!(decider.choose(100), Split::Secondary);
            assert_eq!(decider.choose(0), Split::Primary);
        }
    }

    #[test]
    fn test_half_split_converges() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let share = secondary_share(SplitDecider::new(true), 50, 10_000, &mut rng);
        assert!((share - 0.5).abs() < 0.02, "share = {share}");
    }

    #[test]
    fn test_low_split_converges() {
        let mut rng = StdRng::seed_from_u64(42);
        let share = secondary_share(SplitDecider::new(true), 10, 10_000, &mut rng);
        assert!((share - 0.10).abs() < 0.02, "share = {share}");
    }

    #[test]
    fn test_concurrent_choose() {
        let decider = SplitDecider::new(true);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(move || {
                    (0..2_000)
                        .filter(|_| decider.choose(50) == Split::Secondary)
                        .count()
                })
            })
            .collect();

        let hits: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        let share = hits as f64 / 16_000.0;
        assert!((share - 0.5).abs() < 0.05, "share = {share}");
    }
}
