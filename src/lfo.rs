//! Low frequency oscillator feeding the filter cutoff modulation input.

use std::f64::consts::PI;

use strum::{Display, EnumString};

// -------------------------------------------------------------------------------------------------

/// Waveform types for the LFO.
#[derive(Debug, Default, Copy, Clone, PartialEq, Display, EnumString)]
pub enum LfoWaveform {
    Sine,
    #[default]
    Triangle,
    Sawtooth,
    Square,
}

// -------------------------------------------------------------------------------------------------

/// LFO rate in Hz at a normalized frequency setting of 1.
const MAX_FREQUENCY_HZ: f32 = 50.0;
/// Cutoff modulation depth in Hz at a normalized gain setting of 1.
const MAX_CUTOFF_GAIN_HZ: f32 = 1000.0;

/// Free-running low frequency oscillator modulating the filter cutoff.
///
/// The oscillator runs for the lifetime of the voice and is never stopped or retriggered by
/// note events; its output is scaled by the cutoff gain and summed with the envelope
/// contribution at the filter's cutoff modulation input.
#[derive(Debug, Clone)]
pub struct Lfo {
    sample_rate: u32,
    phase: f64,
    phase_inc: f64,
    waveform: LfoWaveform,
    frequency: f32,
    cutoff_gain: f32,
}

impl Lfo {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
            phase_inc: 0.0,
            waveform: LfoWaveform::default(),
            frequency: 0.0,
            cutoff_gain: 0.0,
        }
    }

    /// Get the normalized frequency setting.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Set a new rate from a normalized value, mapping linearly to 0..=50 Hz.
    pub fn set_frequency(&mut self, value: f32) {
        self.frequency = value;
        let rate = (value.clamp(0.0, 1.0) * MAX_FREQUENCY_HZ) as f64;
        self.phase_inc = 2.0 * PI * rate / self.sample_rate as f64;
    }

    /// Get the normalized cutoff gain setting.
    pub fn cutoff_gain(&self) -> f32 {
        self.cutoff_gain
    }

    /// Set the modulation depth from a normalized value, mapping linearly to 0..=1000 Hz.
    pub fn set_cutoff_gain(&mut self, value: f32) {
        self.cutoff_gain = value;
    }

    /// Get the LFO waveform.
    pub fn waveform(&self) -> LfoWaveform {
        self.waveform
    }

    /// Set a new LFO waveform.
    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.waveform = waveform;
    }

    /// Advance phase one sample frame and return the cutoff offset in Hz.
    #[inline]
    pub fn next_offset(&mut self) -> f32 {
        let raw = match self.waveform {
            LfoWaveform::Sine => self.phase.sin(),
            LfoWaveform::Triangle => {
                // Triangle wave: -1 to 1
                let normalized_phase = self.phase / (2.0 * PI);
                if normalized_phase < 0.5 {
                    4.0 * normalized_phase - 1.0
                } else {
                    -4.0 * normalized_phase + 3.0
                }
            }
            LfoWaveform::Sawtooth => {
                // Sawtooth wave: -1 to 1
                let normalized_phase = self.phase / (2.0 * PI);
                2.0 * normalized_phase - 1.0
            }
            LfoWaveform::Square => {
                // Square wave: -1 or 1
                if self.phase < PI {
                    1.0
                } else {
                    -1.0
                }
            }
        };

        self.phase += self.phase_inc;
        while self.phase >= 2.0 * PI {
            self.phase -= 2.0 * PI;
        }
        raw as f32 * self.cutoff_gain.clamp(0.0, 1.0) * MAX_CUTOFF_GAIN_HZ
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_gain_produces_no_offset() {
        let mut lfo = Lfo::new(44100);
        lfo.set_frequency(1.0);
        for _ in 0..1000 {
            assert_eq!(lfo.next_offset(), 0.0);
        }
    }

    #[test]
    fn offset_is_bounded_by_the_gain() {
        let mut lfo = Lfo::new(44100);
        lfo.set_frequency(0.5);
        lfo.set_cutoff_gain(0.5); // 500 Hz depth
        for _ in 0..44100 {
            let offset = lfo.next_offset();
            assert!(offset.abs() <= 500.0 + 1e-3);
        }
    }

    #[test]
    fn frequency_mapping_gives_the_expected_period() {
        let sample_rate = 1000;
        let mut lfo = Lfo::new(sample_rate);
        lfo.set_waveform(LfoWaveform::Square);
        lfo.set_frequency(0.2); // 10 Hz -> 100 samples per period
        lfo.set_cutoff_gain(1.0);
        let mut sign_changes = 0;
        let mut last = lfo.next_offset();
        for _ in 0..sample_rate {
            let value = lfo.next_offset();
            if value.signum() != last.signum() {
                sign_changes += 1;
            }
            last = value;
        }
        // 10 full periods in one second, two sign changes each
        assert_eq!(sign_changes, 20);
    }
}
