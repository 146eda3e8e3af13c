//! AtomicSpectrum

use super::AtomicFloat;
use crate::spectrum::{Spectrum, RGB_SAMPLES};
use std::sync::atomic::Ordering;

/// A spectrum whose components can be accumulated from many threads.
/// Each component is updated independently; readers only see a consistent
/// value once writers are done (e.g. after a barrier).
#[derive(Clone, Debug, Default)]
pub struct AtomicSpectrum {
    c: [AtomicFloat; RGB_SAMPLES],
}

impl AtomicSpectrum {
    /// Add a spectrum.
    ///
    /// * `s` - The spectrum to add.
    pub fn add(&self, s: &Spectrum) {
        for (a, v) in self.c.iter().zip(s.c.iter()) {
            if *v != 0.0 {
                a.add(*v);
            }
        }
    }

    /// Returns the current value.
    pub fn load(&self) -> Spectrum {
        Spectrum::rgb(
            self.c[0].load(Ordering::Acquire),
            self.c[1].load(Ordering::Acquire),
            self.c[2].load(Ordering::Acquire),
        )
    }

    /// Returns the current value and resets it to black.
    pub fn take(&self) -> Spectrum {
        Spectrum::rgb(self.c[0].take(), self.c[1].take(), self.c[2].take())
    }

    /// Reset to black.
    pub fn reset(&self) {
        self.c.iter().for_each(|a| a.store(0.0, Ordering::Release));
    }
}
