//! Filter cutoff contour envelope generators.

use std::time::Duration;

use strum::{Display, EnumString, VariantArray};

// -------------------------------------------------------------------------------------------------

mod ads;
pub use ads::AdsEnvelope;

mod decay;
pub use decay::DecayEnvelope;

mod spring;
pub use spring::SpringEnvelope;

// -------------------------------------------------------------------------------------------------

/// Selects which envelope variant shapes the filter cutoff contour.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantArray)]
pub enum EnvelopeMode {
    Decay,
    #[default]
    Ads,
    Spring,
}

// -------------------------------------------------------------------------------------------------

/// Common contract for the filter cutoff envelope generators.
///
/// Envelopes are advanced at control rate from the voice's render loop with a uniform
/// `advance` tick. [`DecayEnvelope`] and [`AdsEnvelope`] produce a normalized value in
/// range \[0, 1\] which the filter scales by its contour gain; [`SpringEnvelope`] produces
/// a cutoff offset in Hz directly.
pub trait EnvelopeGenerator {
    /// (Re)trigger the envelope. Always cancels a run still in flight and starts over.
    fn attack(&mut self);

    /// Note-off. Variants without a release stage treat this as a no-op.
    fn release(&mut self);

    /// Advance the envelope by `dt` and return the new output value.
    fn advance(&mut self, dt: Duration) -> f32;

    /// The last computed output value.
    fn value(&self) -> f32;

    /// True while the envelope still produces a changing output.
    fn is_active(&self) -> bool;
}
