//! Per-step learning-rate schedules.
//!
//! `LinearWarmup` ramps from 0 to the base rate over the warmup steps,
//! then decays linearly to 0 at the last step.

/// Share of all optimiser steps spent warming up.
pub const WARMUP_FRACTION: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LrSchedule {
    Constant(f64),
    LinearWarmup {
        base:   f64,
        warmup: usize,
        total:  usize,
    },
}

impl LrSchedule {
    /// Warmup over `WARMUP_FRACTION` of `total_steps`, rounded down.
    pub fn linear_warmup(base: f64, total_steps: usize) -> Self {
        let warmup = (total_steps as f64 * WARMUP_FRACTION) as usize;
        Self::LinearWarmup { base, warmup, total: total_steps }
    }

    /// Learning rate for optimiser step `step` (0-based).
    pub fn lr_at(&self, step: usize) -> f64 {
        match *self {
            Self::Constant(lr) => lr,
            Self::LinearWarmup { base, warmup, total } => {
                if step < warmup {
                    base * step as f64 / warmup.max(1) as f64
                } else {
                    let remaining = total.saturating_sub(step) as f64;
                    let span = total.saturating_sub(warmup).max(1) as f64;
                    base * (remaining / span).max(0.0)
                }
            }
        }
    }
}
