//! Parameter identifiers and the change notification stream.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use strum::{Display, EnumString, VariantArray};

// -------------------------------------------------------------------------------------------------

/// Identifies a single voice parameter.
///
/// All settable parameters take normalized values in range \[0, 1\] and map to their physical
/// ranges internally. [`ParameterId::OscillatorFrequency`] is a read-only pseudo parameter:
/// it reports the sounding pitch in Hz on the notification stream whenever the pitch changes,
/// and setting it has no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, VariantArray)]
pub enum ParameterId {
    OscillatorFrequency,
    OscillatorMix,
    OscillatorDetune,
    OscillatorCoarseTune,
    OscillatorGlide,
    FilterCutoff,
    FilterResonance,
    FilterContour,
    EnvelopeAttack,
    EnvelopeDecay,
    EnvelopeSustain,
    EnvelopeEnergy,
    EnvelopeStiffness,
    EnvelopeDamping,
    LfoFrequency,
    LfoCutoffGain,
}

impl ParameterId {
    /// True for parameters which only report state and cannot be set.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::OscillatorFrequency)
    }
}

// -------------------------------------------------------------------------------------------------

/// A single parameter change notification.
///
/// `value` carries the raw value as passed to the setter (normalized for settable parameters,
/// Hz for the frequency pseudo parameter) and not the derived physical value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterChange {
    pub parameter: ParameterId,
    pub value: f32,
}

// -------------------------------------------------------------------------------------------------

/// Identifies a single subscription on the parameter change stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(usize);

// -------------------------------------------------------------------------------------------------

// Queue depth per subscriber. Bulk notifications must fit without blocking the control thread.
const SUBSCRIBER_QUEUE_SIZE: usize = 1024;

/// Fan-out hub for [`ParameterChange`] notifications.
///
/// Events are pushed with `try_send` and never block: when a subscriber's queue is full the
/// event is dropped with a warning, and disconnected subscribers are removed on the next send.
#[derive(Debug)]
pub(crate) struct ParameterChangeSubscribers {
    subscribers: Vec<(SubscriberId, Sender<ParameterChange>)>,
    next_subscriber_id: usize,
}

impl ParameterChangeSubscribers {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_subscriber_id: 1,
        }
    }

    /// Add a new subscriber and return its id along with the event receiver.
    pub fn subscribe(&mut self) -> (SubscriberId, Receiver<ParameterChange>) {
        let (sender, receiver) = bounded(SUBSCRIBER_QUEUE_SIZE);
        let id = SubscriberId(self.next_subscriber_id);
        self.next_subscriber_id += 1;
        self.subscribers.push((id, sender));
        (id, receiver)
    }

    /// Remove a previously added subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(subscriber, _)| *subscriber != id);
    }

    /// Broadcast a parameter change to all subscribers.
    pub fn notify(&mut self, parameter: ParameterId, value: f32) {
        self.subscribers
            .retain(|(_, sender)| match sender.try_send(ParameterChange { parameter, value }) {
                Ok(()) => true,
                Err(TrySendError::Full(event)) => {
                    log::warn!(
                        "Dropping parameter change event '{}': subscriber queue is full",
                        event.parameter
                    );
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

// -------------------------------------------------------------------------------------------------
