#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod envelope;
mod error;
mod filter;
mod lfo;
mod notes;
mod oscillator;
mod parameter;
mod voice;

// public, flat re-exports
pub use envelope::{AdsEnvelope, DecayEnvelope, EnvelopeGenerator, EnvelopeMode, SpringEnvelope};
pub use error::Error;
pub use filter::ResonantFilter;
pub use lfo::{Lfo, LfoWaveform};
pub use notes::{note_to_frequency, NoteStack};
pub use oscillator::DualOscillator;
pub use parameter::{ParameterChange, ParameterId, SubscriberId};
pub use voice::SynthVoice;

// public mods
pub mod utils;
