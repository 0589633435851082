//! Dual oscillator with mix, detune, coarse tune and glide controls.

use crate::{
    notes::{note_to_frequency, NoteStack},
    utils::ramp::LinearRamp,
};

// -------------------------------------------------------------------------------------------------

/// Cents offset of the detune control at its normalized extremes (±).
const DETUNE_RANGE_CENTS: f32 = 100.0;
/// Semitone offset of the coarse tune control at its normalized extremes (±).
const COARSE_TUNE_RANGE_SEMITONES: f32 = 12.0;

// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum WaveShape {
    Square,
    Sawtooth,
}

/// Naive single-waveform generator driven by a per-sample frequency.
#[derive(Debug, Clone)]
struct WaveGenerator {
    shape: WaveShape,
    sample_rate: u32,
    phase: f64,
}

impl WaveGenerator {
    fn new(shape: WaveShape, sample_rate: u32) -> Self {
        Self {
            shape,
            sample_rate,
            phase: 0.0,
        }
    }

    /// Advance phase at `frequency` Hz and return the next sample.
    #[inline]
    fn next(&mut self, frequency: f32) -> f32 {
        let value = match self.shape {
            WaveShape::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            WaveShape::Sawtooth => (2.0 * self.phase - 1.0) as f32,
        };
        self.phase += frequency as f64 / self.sample_rate as f64;
        while self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        value
    }
}

// -------------------------------------------------------------------------------------------------

/// Two detunable waveform generators (one square, one sawtooth) tracking one logical pitch.
///
/// The generators are started lazily on the first attack and stopped again when the last held
/// note is released. Pitch changes while notes are held glide linearly over the configured
/// glide time; a glide time of zero retargets immediately. A new pitch target always cancels
/// an in-flight glide.
pub struct DualOscillator {
    sample_rate: u32,
    notes: NoteStack,
    generators: Option<(WaveGenerator, WaveGenerator)>,
    base_frequency: LinearRamp,
    mix: f32,
    detune: f32,
    coarse_tune: f32,
    glide: f32,
    square_ratio: f32,
    saw_ratio: f32,
}

impl DualOscillator {
    pub fn new(sample_rate: u32) -> Self {
        let mut oscillator = Self {
            sample_rate,
            notes: NoteStack::new(),
            generators: None,
            base_frequency: LinearRamp::new(0.0),
            mix: 0.5,
            detune: 0.5,
            coarse_tune: 0.5,
            glide: 0.0,
            square_ratio: 1.0,
            saw_ratio: 1.0,
        };
        oscillator.update_pitch_ratios();
        oscillator
    }

    /// True while any note is held and the generators are running.
    #[inline(always)]
    pub fn is_active(&self) -> bool {
        self.generators.is_some()
    }

    /// The pitch the oscillator currently glides towards, if any note is held.
    pub fn target_frequency(&self) -> Option<f32> {
        self.notes.top().map(note_to_frequency)
    }

    /// Get the oscillator mix setting.
    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Cross-fade the two generators: the square level is `value`, the sawtooth level is
    /// `1 - value`, so a mix of 0 routes the full signal to the sawtooth path.
    pub fn set_mix(&mut self, value: f32) {
        self.mix = value;
    }

    /// Get the detune setting.
    pub fn detune(&self) -> f32 {
        self.detune
    }

    /// Set the detune from a normalized value. The value maps to a ±100 cents offset applied
    /// positively to the square generator and negatively to the sawtooth one; 0.5 is neutral.
    /// Takes effect immediately when the generators are running, else on the next attack.
    pub fn set_detune(&mut self, value: f32) {
        self.detune = value;
        self.update_pitch_ratios();
    }

    /// Get the coarse tune setting.
    pub fn coarse_tune(&self) -> f32 {
        self.coarse_tune
    }

    /// Set the coarse tune from a normalized value. The value maps to a ±12 semitone offset
    /// applied to the square generator only, stacking with its detune; 0.5 is neutral.
    pub fn set_coarse_tune(&mut self, value: f32) {
        self.coarse_tune = value;
        self.update_pitch_ratios();
    }

    /// Get the glide setting.
    pub fn glide(&self) -> f32 {
        self.glide
    }

    /// Set the glide/portamento time from a normalized value, mapping linearly to 0..=1 s.
    pub fn set_glide(&mut self, value: f32) {
        self.glide = value.clamp(0.0, 1.0);
    }

    /// Press `note`. Starts the generators at the note's pitch, or glides a running
    /// oscillator pair towards it. Returns the new target frequency in Hz.
    pub fn attack(&mut self, note: u8) -> f32 {
        self.notes.push(note);
        let frequency = note_to_frequency(note);
        if self.generators.is_none() {
            self.generators = Some((
                WaveGenerator::new(WaveShape::Square, self.sample_rate),
                WaveGenerator::new(WaveShape::Sawtooth, self.sample_rate),
            ));
            self.base_frequency.init(frequency);
        } else {
            self.base_frequency.set_target(frequency, self.glide_samples());
        }
        frequency
    }

    /// Release `note`. Stops the generators when the last held note goes, otherwise glides
    /// back to the remaining top-of-stack pitch. Returns the frequency now sounding, or
    /// `None` when the voice fell silent. Off events for unknown notes are ignored.
    pub fn release(&mut self, note: u8) -> Option<f32> {
        self.notes.pop(note);
        match self.notes.top() {
            Some(top) => {
                let frequency = note_to_frequency(top);
                self.base_frequency.set_target(frequency, self.glide_samples());
                Some(frequency)
            }
            None => {
                self.generators = None;
                None
            }
        }
    }

    /// Render the next sample of the oscillator mix. Silent when no note is held.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let Some((square, saw)) = &mut self.generators else {
            return 0.0;
        };
        let base = self.base_frequency.next();
        let mix = self.mix.clamp(0.0, 1.0);
        let square_sample = square.next(base * self.square_ratio);
        let saw_sample = saw.next(base * self.saw_ratio);
        square_sample * mix + saw_sample * (1.0 - mix)
    }

    fn update_pitch_ratios(&mut self) {
        let detune_cents = (self.detune.clamp(0.0, 1.0) - 0.5) * 2.0 * DETUNE_RANGE_CENTS;
        let coarse_cents =
            (self.coarse_tune.clamp(0.0, 1.0) - 0.5) * 2.0 * COARSE_TUNE_RANGE_SEMITONES * 100.0;
        self.square_ratio = cents_to_ratio(detune_cents + coarse_cents);
        self.saw_ratio = cents_to_ratio(-detune_cents);
    }

    fn glide_samples(&self) -> u32 {
        (self.glide * self.sample_rate as f32) as u32
    }
}

fn cents_to_ratio(cents: f32) -> f32 {
    2.0_f32.powf(cents / 1200.0)
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_without_notes() {
        let mut oscillator = DualOscillator::new(44100);
        assert!(!oscillator.is_active());
        assert_eq!(oscillator.target_frequency(), None);
        for _ in 0..100 {
            assert_eq!(oscillator.next_sample(), 0.0);
        }
    }

    #[test]
    fn attack_starts_and_release_stops_the_generators() {
        let mut oscillator = DualOscillator::new(44100);
        assert_eq!(oscillator.attack(69), 440.0);
        assert!(oscillator.is_active());
        assert_eq!(oscillator.target_frequency(), Some(440.0));
        assert_eq!(oscillator.release(69), None);
        assert!(!oscillator.is_active());
        assert_eq!(oscillator.next_sample(), 0.0);
    }

    #[test]
    fn last_note_priority_survives_releases() {
        let mut oscillator = DualOscillator::new(44100);
        oscillator.attack(60);
        oscillator.attack(64);
        oscillator.attack(67);
        assert_eq!(oscillator.release(67), Some(note_to_frequency(64)));
        // releasing a non-top note keeps the top sounding
        assert_eq!(oscillator.release(60), Some(note_to_frequency(64)));
        assert_eq!(oscillator.target_frequency(), Some(note_to_frequency(64)));
    }

    #[test]
    fn release_of_unknown_note_is_a_noop() {
        let mut oscillator = DualOscillator::new(44100);
        oscillator.attack(69);
        assert_eq!(oscillator.release(70), Some(440.0));
        assert!(oscillator.is_active());
        assert_eq!(oscillator.target_frequency(), Some(440.0));
    }

    #[test]
    fn mix_zero_routes_to_the_sawtooth_path() {
        let mut oscillator = DualOscillator::new(44100);
        oscillator.set_mix(0.0);
        oscillator.attack(69);
        // a fresh sawtooth generator starts its period at -1
        assert_eq!(oscillator.next_sample(), -1.0);

        let mut oscillator = DualOscillator::new(44100);
        oscillator.set_mix(1.0);
        oscillator.attack(69);
        // a fresh square generator starts its period at +1
        assert_eq!(oscillator.next_sample(), 1.0);
    }

    #[test]
    fn zero_glide_retargets_immediately() {
        let mut oscillator = DualOscillator::new(44100);
        oscillator.attack(69);
        oscillator.attack(81);
        assert!(!oscillator.base_frequency.is_ramping());
        assert_eq!(oscillator.base_frequency.current(), 880.0);
    }

    #[test]
    fn glide_ramps_towards_the_new_pitch() {
        let mut oscillator = DualOscillator::new(44100);
        oscillator.set_glide(0.5);
        oscillator.attack(69);
        assert!(!oscillator.base_frequency.is_ramping());
        oscillator.attack(81);
        assert!(oscillator.base_frequency.is_ramping());
        assert_eq!(oscillator.base_frequency.target(), 880.0);
        oscillator.next_sample();
        let early = oscillator.base_frequency.current();
        assert!(early > 440.0 && early < 880.0);
    }

    #[test]
    fn detune_spreads_the_generators_apart() {
        let mut oscillator = DualOscillator::new(44100);
        // neutral settings leave both generators at the nominal pitch
        assert_eq!(oscillator.square_ratio, 1.0);
        assert_eq!(oscillator.saw_ratio, 1.0);
        oscillator.set_detune(1.0);
        // +100 cents on the square, -100 cents on the sawtooth
        assert!((oscillator.square_ratio - 2.0_f32.powf(100.0 / 1200.0)).abs() < 1e-6);
        assert!((oscillator.saw_ratio - 2.0_f32.powf(-100.0 / 1200.0)).abs() < 1e-6);
    }

    #[test]
    fn coarse_tune_shifts_the_square_generator_only() {
        let mut oscillator = DualOscillator::new(44100);
        oscillator.set_coarse_tune(1.0);
        // +12 semitones is exactly one octave up
        assert!((oscillator.square_ratio - 2.0).abs() < 1e-6);
        assert_eq!(oscillator.saw_ratio, 1.0);
        oscillator.set_coarse_tune(0.0);
        assert!((oscillator.square_ratio - 0.5).abs() < 1e-6);
    }
}
