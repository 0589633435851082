use std::time::Duration;

use super::EnvelopeGenerator;

// -------------------------------------------------------------------------------------------------

/// Attack-decay-sustain envelope.
///
/// On attack the output ramps linearly from 0 to 1 over the attack time, then decays
/// exponentially towards the sustain level. The decay stage endpoint is measured from the
/// attack start instant, not from the end of the attack stage. With both attack and decay
/// at zero the output is forced to 0, silencing the contour.
///
/// There is no release stage: after note-off the output keeps its current stage value
/// until the next attack retriggers the envelope.
#[derive(Debug, Default, Clone)]
pub struct AdsEnvelope {
    attack: Duration,
    decay: Duration,
    sustain: f32,
    elapsed: Duration,
    value: f32,
    active: bool,
}

impl AdsEnvelope {
    /// Attack and decay time ranges at a normalized setting of 1.
    const MAX_ATTACK: Duration = Duration::from_secs(1);
    const MAX_DECAY: Duration = Duration::from_secs(1);

    /// Smallest sustain target, avoids a zero target in the exponential decay stage.
    const SUSTAIN_FLOOR: f32 = 0.001;

    pub fn new() -> Self {
        Self::default()
    }

    /// Get the configured attack time.
    pub fn attack_time(&self) -> Duration {
        self.attack
    }

    /// Set the attack time from a normalized value, mapping linearly to 0..=1 s.
    pub fn set_attack(&mut self, value: f32) {
        self.attack = Self::MAX_ATTACK.mul_f32(value.clamp(0.0, 1.0));
    }

    /// Get the configured decay time.
    pub fn decay_time(&self) -> Duration {
        self.decay
    }

    /// Set the decay time from a normalized value, mapping linearly to 0..=1 s.
    pub fn set_decay(&mut self, value: f32) {
        self.decay = Self::MAX_DECAY.mul_f32(value.clamp(0.0, 1.0));
    }

    /// Get the sustain level.
    pub fn sustain(&self) -> f32 {
        self.sustain
    }

    /// Set the sustain level from a normalized value.
    pub fn set_sustain(&mut self, value: f32) {
        self.sustain = value.clamp(0.0, 1.0);
    }
}

impl EnvelopeGenerator for AdsEnvelope {
    fn attack(&mut self) {
        if self.attack.is_zero() && self.decay.is_zero() {
            // degenerate settings silence the contour
            self.value = 0.0;
            self.active = false;
            return;
        }
        self.elapsed = Duration::ZERO;
        self.active = true;
    }

    fn release(&mut self) {
        // the contour holds its current stage value until the next attack
    }

    fn advance(&mut self, dt: Duration) -> f32 {
        if !self.active {
            return self.value;
        }
        self.elapsed += dt;
        let t = self.elapsed.as_secs_f32();
        let attack = self.attack.as_secs_f32();
        let decay = self.decay.as_secs_f32();
        if t < attack {
            self.value = (t / attack).min(1.0);
        } else if decay > 0.0 {
            let sustain = self.sustain.max(Self::SUSTAIN_FLOOR);
            if decay > attack && t < decay {
                // exponential ramp from 1 at the end of the attack towards the
                // sustain target at `decay` after the attack start
                let progress = (t - attack) / (decay - attack);
                self.value = sustain.powf(progress);
            } else {
                self.value = sustain;
                self.active = false;
            }
        } else {
            self.value = 1.0;
            self.active = false;
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
    fn degenerate_settings_force_zero() {
        let mut envelope = AdsEnvelope::new();
        envelope.set_sustain(0.8);
        envelope.attack();
        assert!(!envelope.is_active());
        assert_eq!(envelope.value(), 0.0);
        assert_eq!(envelope.advance(Duration::from_millis(10)), 0.0);
    }

    #[test]
    fn attack_ramps_linearly() {
        let mut envelope = AdsEnvelope::new();
        envelope.set_attack(1.0); // 1 s
        envelope.set_decay(0.0);
        envelope.attack();
        let halfway = envelope.advance(Duration::from_millis(500));
        assert!((halfway - 0.5).abs() < 1e-6);
        let done = envelope.advance(Duration::from_millis(600));
        assert_eq!(done, 1.0);
        // without decay the envelope holds at full level
        assert_eq!(envelope.advance(Duration::from_millis(100)), 1.0);
    }

    #[test]
    fn decay_reaches_sustain_level() {
        let mut envelope = AdsEnvelope::new();
        envelope.set_attack(0.1);
        envelope.set_decay(0.5);
        envelope.set_sustain(0.25);
        envelope.attack();
        // past the decay endpoint the output settles at the sustain level
        let settled = envelope.advance(Duration::from_millis(600));
        assert_eq!(settled, 0.25);
        assert!(!envelope.is_active());
        assert_eq!(envelope.advance(Duration::from_millis(100)), 0.25);
    }

    #[test]
    fn zero_sustain_decays_to_floor() {
        let mut envelope = AdsEnvelope::new();
        envelope.set_attack(0.0);
        envelope.set_decay(0.2);
        envelope.set_sustain(0.0);
        envelope.attack();
        let settled = envelope.advance(Duration::from_millis(300));
        assert_eq!(settled, 0.001);
    }

    #[test]
    fn decay_is_measured_from_attack_start() {
        let mut envelope = AdsEnvelope::new();
        envelope.set_attack(0.2);
        envelope.set_decay(0.4);
        envelope.set_sustain(0.0);
        envelope.attack();
        envelope.advance(Duration::from_millis(200));
        // halfway through the decay span (which starts at the attack end and
        // finishes 0.4 s after the trigger)
        let value = envelope.advance(Duration::from_millis(100));
        assert!((value - 0.001f32.powf(0.5)).abs() < 1e-3);
        let settled = envelope.advance(Duration::from_millis(200));
        assert_eq!(settled, 0.001);
    }

    #[test]
    fn release_keeps_the_contour_frozen() {
        let mut envelope = AdsEnvelope::new();
        envelope.set_attack(0.1);
        envelope.set_decay(0.5);
        envelope.set_sustain(0.5);
        envelope.attack();
        envelope.advance(Duration::from_millis(600));
        envelope.release();
        assert_eq!(envelope.value(), 0.5);
        assert_eq!(envelope.advance(Duration::from_secs(1)), 0.5);
    }

    #[test]
    fn retrigger_restarts_the_staging() {
        let mut envelope = AdsEnvelope::new();
        envelope.set_attack(0.5);
        envelope.set_decay(0.0);
        envelope.attack();
        envelope.advance(Duration::from_millis(400));
        envelope.attack();
        let value = envelope.advance(Duration::from_millis(50));
        assert!((value - 0.1).abs() < 1e-6);
    }
}
