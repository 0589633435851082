//! Resonant low-pass filter with envelope and LFO cutoff modulation.

use std::time::Duration;

use crate::{
    envelope::{AdsEnvelope, DecayEnvelope, EnvelopeGenerator, EnvelopeMode, SpringEnvelope},
    lfo::Lfo,
    utils::{
        ramp::LinearRamp,
        svf::{SvfCoefficients, SvfFilter, SvfFilterMode},
    },
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Cutoff bounds in Hz, applied to the modulated cutoff before it reaches the filter.
const MIN_CUTOFF_HZ: f32 = 0.0;
const MAX_CUTOFF_HZ: f32 = 20000.0;
/// Q at a normalized resonance setting of 1.
const MAX_RESONANCE_Q: f32 = 15.0;
/// Smallest Q the filter math accepts.
const MIN_Q: f32 = 0.01;
/// Scales `cutoff_hz * contour` into the envelope's cutoff offset gain.
const CONTOUR_GAIN_FACTOR: f32 = 100.0;
/// Ramp time smoothing the spring envelope's per-tick offset jumps.
const SPRING_RAMP_DURATION: Duration = Duration::from_secs(1);

// -------------------------------------------------------------------------------------------------

/// Resonant low-pass filter stage with an envelope driven cutoff contour.
///
/// The base cutoff follows the normalized cutoff setting through an exponential curve that
/// biases the sweep towards low frequencies. The cutoff contour envelope and the LFO are
/// summed onto the base cutoff at one modulation input, and the effective cutoff is clamped
/// to \[0, 20000\] Hz before it is applied to the filter.
///
/// All three envelope variants are owned by the filter so their settings persist across
/// [`EnvelopeMode`] switches; note events drive whichever variant is selected.
pub struct ResonantFilter {
    sample_rate: u32,
    cutoff: f32,
    resonance: f32,
    contour: f32,
    cutoff_hz: f32,
    q: f32,
    mode: SvfFilterMode,
    envelope_mode: EnvelopeMode,
    decay_envelope: DecayEnvelope,
    ads_envelope: AdsEnvelope,
    spring_envelope: SpringEnvelope,
    cutoff_offset: LinearRamp,
    coefficients: SvfCoefficients,
    filter: SvfFilter,
}

impl ResonantFilter {
    pub fn new(sample_rate: u32) -> Result<Self, Error> {
        let mut filter = Self {
            sample_rate,
            cutoff: 0.0,
            resonance: 0.0,
            contour: 0.0,
            cutoff_hz: 0.0,
            q: MIN_Q,
            mode: SvfFilterMode::Lowpass,
            envelope_mode: EnvelopeMode::default(),
            decay_envelope: DecayEnvelope::new(),
            ads_envelope: AdsEnvelope::new(),
            spring_envelope: SpringEnvelope::new(),
            cutoff_offset: LinearRamp::new(0.0),
            coefficients: SvfCoefficients::new(SvfFilterMode::Lowpass, sample_rate, 0.0, MIN_Q)?,
            filter: SvfFilter::new(),
        };
        filter.set_cutoff(0.4);
        filter.set_resonance(0.1);
        Ok(filter)
    }

    /// Get the normalized cutoff setting.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// The base cutoff frequency in Hz derived from the cutoff setting.
    pub fn cutoff_frequency(&self) -> f32 {
        self.cutoff_hz
    }

    /// Set the cutoff from a normalized value. The value is eased exponentially
    /// (`2^(10v - 10)`) before scaling into the 0..=20000 Hz range, which makes the sweep
    /// perceptually linear and fine grained at low frequencies.
    pub fn set_cutoff(&mut self, value: f32) {
        self.cutoff = value;
        let eased = exponential_ease(value.clamp(0.0, 1.0));
        self.cutoff_hz = eased * MAX_CUTOFF_HZ;
        self.spring_envelope.set_filter_frequency(self.cutoff_hz);
    }

    /// Get the normalized resonance setting.
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Set the resonance from a normalized value, mapping linearly to Q 0..=15.
    pub fn set_resonance(&mut self, value: f32) {
        self.resonance = value;
        self.q = value.clamp(0.0, 1.0) * MAX_RESONANCE_Q;
    }

    /// Get the normalized contour (envelope amount) setting.
    pub fn contour(&self) -> f32 {
        self.contour
    }

    /// Set the contour amount, scaling how strongly the decay and ADS envelopes sweep
    /// the cutoff. The resulting offset gain is proportional to the base cutoff.
    pub fn set_contour(&mut self, value: f32) {
        self.contour = value;
    }

    /// Get the selected envelope variant.
    pub fn envelope_mode(&self) -> EnvelopeMode {
        self.envelope_mode
    }

    /// Select the envelope variant driving the cutoff contour. The modulation offset of the
    /// previous variant is discarded.
    pub fn set_envelope_mode(&mut self, mode: EnvelopeMode) {
        if self.envelope_mode != mode {
            self.envelope_mode = mode;
            self.cutoff_offset.init(0.0);
        }
    }

    /// Access to the decay envelope settings.
    pub fn decay_envelope(&self) -> &DecayEnvelope {
        &self.decay_envelope
    }
    pub fn decay_envelope_mut(&mut self) -> &mut DecayEnvelope {
        &mut self.decay_envelope
    }

    /// Access to the ADS envelope settings.
    pub fn ads_envelope(&self) -> &AdsEnvelope {
        &self.ads_envelope
    }
    pub fn ads_envelope_mut(&mut self) -> &mut AdsEnvelope {
        &mut self.ads_envelope
    }

    /// Access to the spring envelope settings.
    pub fn spring_envelope(&self) -> &SpringEnvelope {
        &self.spring_envelope
    }
    pub fn spring_envelope_mut(&mut self) -> &mut SpringEnvelope {
        &mut self.spring_envelope
    }

    /// Note-on: retrigger the selected contour envelope.
    pub fn attack(&mut self) {
        self.active_envelope_mut().attack();
    }

    /// Note-off: forwarded to the selected contour envelope.
    pub fn release(&mut self) {
        self.active_envelope_mut().release();
    }

    /// Process one control block in place: advances the contour envelope by one tick, then
    /// filters the block with the modulated cutoff.
    pub fn process_block(&mut self, block: &mut [f32], lfo: &mut Lfo, dt: Duration) {
        // Control tick: advance the envelope and retarget the cutoff offset ramp. The new
        // target always supersedes the previous one (cancel-then-ramp).
        match self.envelope_mode {
            EnvelopeMode::Spring => {
                let offset = self.spring_envelope.advance(dt);
                if self.spring_envelope.is_active() {
                    let ramp_samples =
                        (SPRING_RAMP_DURATION.as_secs_f32() * self.sample_rate as f32) as u32;
                    self.cutoff_offset.set_target(offset, ramp_samples);
                }
            }
            _ => {
                let value = self.active_envelope_mut().advance(dt);
                let gain = self.cutoff_hz * self.contour.clamp(0.0, 1.0) * CONTOUR_GAIN_FACTOR;
                self.cutoff_offset.set_target(value * gain, block.len() as u32);
            }
        }

        // Sample loop with the modulated cutoff. Coefficient updates short-circuit when the
        // effective cutoff did not change since the last sample.
        let max_cutoff = MAX_CUTOFF_HZ.min(self.sample_rate as f32 / 2.0);
        for sample in block.iter_mut() {
            let modulation = self.cutoff_offset.next() + lfo.next_offset();
            let cutoff = (self.cutoff_hz + modulation).clamp(MIN_CUTOFF_HZ, max_cutoff);
            let q = self.q.max(MIN_Q);
            if let Err(err) = self.coefficients.set(self.mode, self.sample_rate, cutoff, q) {
                log::warn!("Skipping invalid filter parameter update: {err}");
            }
            *sample = self.filter.process_sample(&self.coefficients, *sample as f64) as f32;
        }
    }

    fn active_envelope_mut(&mut self) -> &mut dyn EnvelopeGenerator {
        match self.envelope_mode {
            EnvelopeMode::Decay => &mut self.decay_envelope,
            EnvelopeMode::Ads => &mut self.ads_envelope,
            EnvelopeMode::Spring => &mut self.spring_envelope,
        }
    }
}

/// Exponential easing curve for the cutoff sweep: `2^(10x - 10)`.
fn exponential_ease(value: f32) -> f32 {
    2.0_f32.powf(10.0 * value - 10.0)
}

// -------------------------------------------------------------------------------------------------
