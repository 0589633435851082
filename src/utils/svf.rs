use std::f64;

use strum::{Display, EnumString};

use crate::Error;

// -------------------------------------------------------------------------------------------------

/// Available responses for the state variable filter.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Display, EnumString)]
pub enum SvfFilterMode {
    #[default]
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
}

// -------------------------------------------------------------------------------------------------

/// The coefficients that hold parameters and necessary data to process the filter.
///
/// See [`SvfFilter`] for more info about the filter implementation.
#[derive(Default, Clone, PartialEq)]
pub struct SvfCoefficients {
    mode: SvfFilterMode,
    sample_rate: u32,
    cutoff: f32,
    q: f32,
    a1: f64,
    a2: f64,
    a3: f64,
    m0: f64,
    m1: f64,
    m2: f64,
}

impl SvfCoefficients {
    pub fn new(mode: SvfFilterMode, sample_rate: u32, cutoff: f32, q: f32) -> Result<Self, Error> {
        let mut coefficients = SvfCoefficients::default();
        coefficients.set(mode, sample_rate, cutoff, q)?;
        Ok(coefficients)
    }

    /// Get currently applied filter mode.
    pub fn mode(&self) -> SvfFilterMode {
        self.mode
    }

    /// Get currently applied sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The frequency in Hz where the cutoff of the filter is.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// The steepness of the filter.
    pub fn q(&self) -> f32 {
        self.q
    }

    /// Sets and applies a batch of new filter parameters.
    pub fn set(
        &mut self,
        mode: SvfFilterMode,
        sample_rate: u32,
        cutoff: f32,
        q: f32,
    ) -> Result<(), Error> {
        if self.mode != mode || self.sample_rate != sample_rate || self.cutoff != cutoff || self.q != q
        {
            self.mode = mode;
            self.sample_rate = sample_rate;
            self.cutoff = cutoff;
            self.q = q;
            self.apply()
        } else {
            Ok(())
        }
    }

    /// Applies the current filter parameters.
    pub fn apply(&mut self) -> Result<(), Error> {
        if self.sample_rate == 0 {
            return Err(Error::ParameterError(format!(
                "Invalid filter sample-rate: must be > 0, but is {s}",
                s = self.sample_rate
            )));
        }
        if self.q <= 0.0 {
            return Err(Error::ParameterError(format!(
                "Invalid filter Q: must be > 0, but is {q}",
                q = self.q
            )));
        }
        if self.cutoff < 0.0 || self.cutoff > self.sample_rate as f32 / 2.0 {
            return Err(Error::ParameterError(format!(
                "Invalid filter frequency: must be in range [0, {n}], but is {f}",
                n = self.sample_rate as f32 / 2.0,
                f = self.cutoff
            )));
        }
        let g = f64::tan(f64::consts::PI * self.cutoff as f64 / self.sample_rate as f64);
        let k = 1.0 / self.q as f64;
        self.a1 = 1.0 / (1.0 + g * (g + k));
        self.a2 = g * self.a1;
        self.a3 = g * self.a2;
        match self.mode {
            SvfFilterMode::Lowpass => {
                self.m0 = 0.0;
                self.m1 = 0.0;
                self.m2 = 1.0;
            }
            SvfFilterMode::Highpass => {
                self.m0 = 1.0;
                self.m1 = -k;
                self.m2 = -1.0;
            }
            SvfFilterMode::Bandpass => {
                self.m0 = 0.0;
                self.m1 = 1.0;
                self.m2 = 0.0;
            }
            SvfFilterMode::Notch => {
                self.m0 = 1.0;
                self.m1 = -k;
                self.m2 = 0.0;
            }
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// State variable filter (SVF), designed by Andrew Simper of Cytomic.
/// See <http://cytomic.com/files/dsp/SvfLinearTrapOptimised2.pdf>
///
/// This is a second-order filter. It has a cutoff slope of 12 dB/octave.
/// Q = 0.707 means no resonant peaking.
///
/// This filter is stable when modulated at high rates.
#[derive(Default, Clone)]
pub struct SvfFilter {
    ic1eq: f64,
    ic2eq: f64,
}

impl SvfFilter {
    pub fn new() -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
        }
    }

    /// Process helper function that calls `process_sample` for each sample in a buffer.
    #[inline]
    pub fn process<'a>(
        &mut self,
        coefficients: &SvfCoefficients,
        output: impl Iterator<Item = &'a mut f32>,
    ) {
        for sample in output {
            *sample = self.process_sample(coefficients, *sample as f64) as f32;
        }
    }

    /// Apply the filter on a single sample.
    #[inline]
    pub fn process_sample(&mut self, coefficients: &SvfCoefficients, input: f64) -> f64 {
        let v0 = input;
        let v3 = v0 - self.ic2eq;
        let v1 = coefficients.a1 * self.ic1eq + coefficients.a2 * v3;
        let v2 = self.ic2eq + coefficients.a2 * self.ic1eq + coefficients.a3 * v3;
        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;
        coefficients.m0 * v0 + coefficients.m1 * v1 + coefficients.m2 * v2
    }

    /// Reset state of filter.
    /// Can be used when the audio callback is restarted.
    #[inline]
    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameters() {
        assert!(SvfCoefficients::new(SvfFilterMode::Lowpass, 0, 1000.0, 1.0).is_err());
        assert!(SvfCoefficients::new(SvfFilterMode::Lowpass, 44100, 1000.0, 0.0).is_err());
        assert!(SvfCoefficients::new(SvfFilterMode::Lowpass, 44100, 30000.0, 1.0).is_err());
        assert!(SvfCoefficients::new(SvfFilterMode::Lowpass, 44100, 1000.0, 1.0).is_ok());
    }

    #[test]
    fn lowpass_passes_dc() {
        let coefficients =
            SvfCoefficients::new(SvfFilterMode::Lowpass, 44100, 1000.0, 0.707).unwrap();
        let mut filter = SvfFilter::new();
        let mut last = 0.0;
        for _ in 0..44100 {
            last = filter.process_sample(&coefficients, 1.0);
        }
        // a constant input settles at the constant
        assert!((last - 1.0).abs() < 1e-3);
    }

    #[test]
    fn lowpass_attenuates_above_cutoff() {
        let sample_rate = 44100;
        let coefficients =
            SvfCoefficients::new(SvfFilterMode::Lowpass, sample_rate, 500.0, 0.707).unwrap();
        let mut filter = SvfFilter::new();
        // feed a 8 kHz sine, measure the peak output after the filter settled
        let frequency = 8000.0;
        let mut peak = 0.0f64;
        for frame in 0..sample_rate {
            let phase = frame as f64 * frequency / sample_rate as f64;
            let input = (2.0 * f64::consts::PI * phase).sin();
            let output = filter.process_sample(&coefficients, input);
            if frame > sample_rate / 2 {
                peak = peak.max(output.abs());
            }
        }
        assert!(peak < 0.05, "expected strong attenuation, got peak {peak}");
    }
}
