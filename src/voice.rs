//! The complete synthesizer voice: oscillators into filter, with the parameter bus on top.

use std::time::Duration;

use crossbeam_channel::Receiver;
use strum::VariantArray;

use crate::{
    envelope::EnvelopeMode,
    filter::ResonantFilter,
    lfo::Lfo,
    oscillator::DualOscillator,
    parameter::{ParameterChange, ParameterChangeSubscribers, ParameterId, SubscriberId},
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Number of frames per control tick in [`SynthVoice::process`]. Tick-driven envelopes advance
/// once per block; ramps on the sample clock advance every frame.
const CONTROL_BLOCK_SIZE: usize = 64;
/// Fixed gain stage between the filter and the output.
const MASTER_GAIN: f32 = 0.5;

// -------------------------------------------------------------------------------------------------

/// A complete monophonic synthesizer voice.
///
/// Routes the dual oscillator through the resonant filter and renders mono `f32` buffers on
/// demand via [`Self::process`]. Note events fan out to the oscillator's note stack and the
/// filter's contour envelope; parameter changes are applied through a closed id set and
/// re-broadcast on the subscriber stream.
///
/// The voice performs no internal locking: note events, parameter changes and `process`
/// calls must be driven from a single control thread. Rendering is optional, the voice stays
/// fully operable when `process` is never called.
pub struct SynthVoice {
    sample_rate: u32,
    oscillator: DualOscillator,
    filter: ResonantFilter,
    lfo: Lfo,
    subscribers: ParameterChangeSubscribers,
}

impl SynthVoice {
    pub fn new(sample_rate: u32) -> Result<Self, Error> {
        if sample_rate == 0 {
            return Err(Error::ParameterError(
                "Invalid sample rate: must be > 0".to_string(),
            ));
        }
        Ok(Self {
            sample_rate,
            oscillator: DualOscillator::new(sample_rate),
            filter: ResonantFilter::new(sample_rate)?,
            lfo: Lfo::new(sample_rate),
            subscribers: ParameterChangeSubscribers::new(),
        })
    }

    /// The voice's output sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// True while any note is held.
    pub fn is_active(&self) -> bool {
        self.oscillator.is_active()
    }

    /// Access to the dual oscillator.
    pub fn oscillator(&self) -> &DualOscillator {
        &self.oscillator
    }

    /// Access to the filter stage.
    pub fn filter(&self) -> &ResonantFilter {
        &self.filter
    }

    /// Access to the LFO.
    pub fn lfo(&self) -> &Lfo {
        &self.lfo
    }

    /// Note-on: pushes the note, retriggers the contour envelope and reports the new
    /// sounding frequency on the notification stream.
    pub fn attack(&mut self, note: u8) {
        let frequency = self.oscillator.attack(note);
        self.filter.attack();
        self.subscribers
            .notify(ParameterId::OscillatorFrequency, frequency);
    }

    /// Note-off: pops the note and glides back to the remaining top-of-stack pitch, or
    /// silences the voice when no note is left. Off events for unknown notes are ignored.
    pub fn release(&mut self, note: u8) {
        let frequency = self.oscillator.release(note);
        self.filter.release();
        if let Some(frequency) = frequency {
            self.subscribers
                .notify(ParameterId::OscillatorFrequency, frequency);
        }
    }

    /// Apply a normalized parameter value and broadcast the change.
    ///
    /// Values are expected in range \[0, 1\] but are not rejected outside of it; the physical
    /// values derived from them are clamped where they are applied. Setting the read-only
    /// frequency pseudo parameter has no effect.
    pub fn set_parameter(&mut self, parameter: ParameterId, value: f32) {
        match parameter {
            ParameterId::OscillatorFrequency => return, // read-only
            ParameterId::OscillatorMix => self.oscillator.set_mix(value),
            ParameterId::OscillatorDetune => self.oscillator.set_detune(value),
            ParameterId::OscillatorCoarseTune => self.oscillator.set_coarse_tune(value),
            ParameterId::OscillatorGlide => self.oscillator.set_glide(value),
            ParameterId::FilterCutoff => self.filter.set_cutoff(value),
            ParameterId::FilterResonance => self.filter.set_resonance(value),
            ParameterId::FilterContour => self.filter.set_contour(value),
            ParameterId::EnvelopeAttack => self.filter.ads_envelope_mut().set_attack(value),
            ParameterId::EnvelopeDecay => {
                // the decay time is shared by the decay and ADS envelope variants
                self.filter.decay_envelope_mut().set_decay(value);
                self.filter.ads_envelope_mut().set_decay(value);
            }
            ParameterId::EnvelopeSustain => self.filter.ads_envelope_mut().set_sustain(value),
            ParameterId::EnvelopeEnergy => self.filter.spring_envelope_mut().set_energy(value),
            ParameterId::EnvelopeStiffness => {
                self.filter.spring_envelope_mut().set_stiffness(value)
            }
            ParameterId::EnvelopeDamping => self.filter.spring_envelope_mut().set_damping(value),
            ParameterId::LfoFrequency => self.lfo.set_frequency(value),
            ParameterId::LfoCutoffGain => self.lfo.set_cutoff_gain(value),
        }
        self.subscribers.notify(parameter, value);
    }

    /// Current raw value of a settable parameter, `None` for read-only ids.
    pub fn parameter_value(&self, parameter: ParameterId) -> Option<f32> {
        match parameter {
            ParameterId::OscillatorFrequency => None,
            ParameterId::OscillatorMix => Some(self.oscillator.mix()),
            ParameterId::OscillatorDetune => Some(self.oscillator.detune()),
            ParameterId::OscillatorCoarseTune => Some(self.oscillator.coarse_tune()),
            ParameterId::OscillatorGlide => Some(self.oscillator.glide()),
            ParameterId::FilterCutoff => Some(self.filter.cutoff()),
            ParameterId::FilterResonance => Some(self.filter.resonance()),
            ParameterId::FilterContour => Some(self.filter.contour()),
            ParameterId::EnvelopeAttack => Some(normalized_seconds(
                self.filter.ads_envelope().attack_time(),
            )),
            ParameterId::EnvelopeDecay => {
                Some(normalized_seconds(self.filter.ads_envelope().decay_time()))
            }
            ParameterId::EnvelopeSustain => Some(self.filter.ads_envelope().sustain()),
            ParameterId::EnvelopeEnergy => Some(self.filter.spring_envelope().energy()),
            ParameterId::EnvelopeStiffness => Some(self.filter.spring_envelope().stiffness()),
            ParameterId::EnvelopeDamping => Some(self.filter.spring_envelope().damping()),
            ParameterId::LfoFrequency => Some(self.lfo.frequency()),
            ParameterId::LfoCutoffGain => Some(self.lfo.cutoff_gain()),
        }
    }

    /// Re-broadcast the current value of every settable parameter, used to synchronize a
    /// freshly attached subscriber without re-deriving state.
    pub fn notify_parameters(&mut self) {
        for parameter in ParameterId::VARIANTS {
            if let Some(value) = self.parameter_value(*parameter) {
                self.subscribers.notify(*parameter, value);
            }
        }
    }

    /// Get the envelope variant driving the filter contour.
    pub fn envelope_mode(&self) -> EnvelopeMode {
        self.filter.envelope_mode()
    }

    /// Select the envelope variant driving the filter contour.
    pub fn set_envelope_mode(&mut self, mode: EnvelopeMode) {
        self.filter.set_envelope_mode(mode);
    }

    /// Add a parameter change subscriber. Returns the subscription id along with the
    /// event receiver.
    pub fn subscribe(&mut self) -> (SubscriberId, Receiver<ParameterChange>) {
        self.subscribers.subscribe()
    }

    /// Remove a parameter change subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.unsubscribe(id);
    }

    /// Render the next `output.len()` mono frames into `output`.
    ///
    /// The buffer is split into control blocks: tick-driven envelopes advance once per
    /// block, while pitch glides, modulation ramps and the LFO run on the sample clock.
    pub fn process(&mut self, output: &mut [f32]) {
        for block in output.chunks_mut(CONTROL_BLOCK_SIZE) {
            let dt = Duration::from_secs_f64(block.len() as f64 / self.sample_rate as f64);
            for sample in block.iter_mut() {
                *sample = self.oscillator.next_sample();
            }
            self.filter.process_block(block, &mut self.lfo, dt);
            for sample in block.iter_mut() {
                *sample *= MASTER_GAIN;
            }
        }
    }
}

fn normalized_seconds(duration: Duration) -> f32 {
    duration.as_secs_f32()
}

// -------------------------------------------------------------------------------------------------
