use std::time::Duration;

use super::EnvelopeGenerator;

// -------------------------------------------------------------------------------------------------

/// One-shot decay envelope.
///
/// On attack the output jumps to 1 and decays linearly back to 0 over the configured decay
/// time. A decay time of zero makes attacks a no-op, so the contour contributes nothing.
/// There is no release stage: the envelope runs out on its own once per note.
#[derive(Debug, Default, Clone)]
pub struct DecayEnvelope {
    decay: Duration,
    elapsed: Duration,
    value: f32,
    active: bool,
}

impl DecayEnvelope {
    /// Decay time range at a normalized setting of 1.
    const MAX_DECAY: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self::default()
    }

    /// Get the configured decay time.
    pub fn decay(&self) -> Duration {
        self.decay
    }

    /// Set the decay time from a normalized value, mapping linearly to 0..=1 s.
    pub fn set_decay(&mut self, value: f32) {
        self.decay = Self::MAX_DECAY.mul_f32(value.clamp(0.0, 1.0));
    }
}

impl EnvelopeGenerator for DecayEnvelope {
    fn attack(&mut self) {
        if self.decay.is_zero() {
            // zero decay mutes the contour
            return;
        }
        self.value = 1.0;
        self.elapsed = Duration::ZERO;
        self.active = true;
    }

    fn release(&mut self) {
        // one-shot per note
    }

    fn advance(&mut self, dt: Duration) -> f32 {
        if self.active {
            if self.decay.is_zero() {
                self.value = 0.0;
                self.active = false;
            } else {
                self.elapsed += dt;
                let progress = self.elapsed.as_secs_f32() / self.decay.as_secs_f32();
                self.value = (1.0 - progress).max(0.0);
                if self.value <= 0.0 {
                    self.active = false;
                }
            }
        }
        self.value
    }

    fn value(&self) -> f32 {
        self.value
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_decay_mutes_the_contour() {
        let mut envelope = DecayEnvelope::new();
        envelope.attack();
        assert!(!envelope.is_active());
        assert_eq!(envelope.advance(Duration::from_millis(10)), 0.0);
        assert_eq!(envelope.value(), 0.0);
    }

    #[test]
    fn decays_linearly_to_zero() {
        let mut envelope = DecayEnvelope::new();
        envelope.set_decay(1.0); // 1 s
        envelope.attack();
        assert!(envelope.is_active());
        let halfway = envelope.advance(Duration::from_millis(500));
        assert!((halfway - 0.5).abs() < 1e-6);
        let done = envelope.advance(Duration::from_millis(600));
        assert_eq!(done, 0.0);
        assert!(!envelope.is_active());
    }

    #[test]
    fn retrigger_restarts_from_one() {
        let mut envelope = DecayEnvelope::new();
        envelope.set_decay(0.5);
        envelope.attack();
        envelope.advance(Duration::from_millis(200));
        envelope.attack();
        let value = envelope.advance(Duration::from_millis(50));
        assert!(value > 0.8);
    }

    #[test]
    fn release_is_a_noop() {
        let mut envelope = DecayEnvelope::new();
        envelope.set_decay(1.0);
        envelope.attack();
        let before = envelope.advance(Duration::from_millis(100));
        envelope.release();
        assert!(envelope.is_active());
        assert_eq!(envelope.value(), before);
    }
}
