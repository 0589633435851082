use std::time::Duration;

use super::EnvelopeGenerator;

// -------------------------------------------------------------------------------------------------

/// Critically/under-damped spring envelope.
///
/// Models a unit mass on a spring whose excursion sweeps the filter cutoff: the output is a
/// cutoff offset of `filter_frequency * (2^position - 1)` Hz, so a positive excursion of 1
/// doubles the cutoff. The integration runs once per control tick with semi-implicit Euler
/// and self-terminates when position and velocity settle at equilibrium.
///
/// Retriggering always restarts the integration from `position = 0` with a fresh initial
/// velocity; residual momentum never carries over between attacks.
#[derive(Debug, Clone)]
pub struct SpringEnvelope {
    energy: f32,
    stiffness: f32,
    damping: f32,
    filter_frequency: f32,
    run_stiffness: f32,
    run_damping: f32,
    position: f32,
    velocity: f32,
    acceleration: f32,
    value: f32,
    active: bool,
}

impl SpringEnvelope {
    /// Position and velocity magnitudes below which the integration stops.
    const EQUILIBRIUM_THRESHOLD: f32 = 0.001;

    pub fn new() -> Self {
        Self {
            energy: 1.0,
            stiffness: 1.0,
            damping: 0.5,
            filter_frequency: 1000.0,
            run_stiffness: 0.0,
            run_damping: 0.0,
            position: 0.0,
            velocity: 0.0,
            acceleration: 0.0,
            value: 0.0,
            active: false,
        }
    }

    /// Get the energy setting.
    pub fn energy(&self) -> f32 {
        self.energy
    }

    /// Set the initial excursion energy. A value of 0.5 is neutral; values above push the
    /// cutoff up on attack, values below pull it down.
    pub fn set_energy(&mut self, value: f32) {
        self.energy = value;
    }

    /// Get the stiffness setting.
    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    /// Set the spring stiffness (higher values oscillate faster).
    pub fn set_stiffness(&mut self, value: f32) {
        self.stiffness = value;
    }

    /// Get the damping setting.
    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Set the damping factor (higher values settle sooner).
    pub fn set_damping(&mut self, value: f32) {
        self.damping = value;
    }

    /// Set the base cutoff frequency the excursion scales against.
    pub fn set_filter_frequency(&mut self, frequency: f32) {
        self.filter_frequency = frequency;
    }
}

impl Default for SpringEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeGenerator for SpringEnvelope {
    fn attack(&mut self) {
        // spring constants are fixed per run when the envelope triggers
        self.run_stiffness = (self.stiffness * 10.0).max(1.0);
        self.run_damping = self.damping.max(0.2);
        self.velocity = (self.energy - 0.5) * 2.0;
        self.position = 0.0;
        self.acceleration = 0.0;
        self.active = true;
    }

    fn release(&mut self) {
        // the spring swings out on its own
    }

    fn advance(&mut self, _dt: Duration) -> f32 {
        if !self.active {
            return self.value;
        }
        self.velocity += self.acceleration;
        self.position += self.velocity;
        self.acceleration =
            -self.position * (self.run_stiffness / 100.0) - self.velocity * self.run_damping;
        if self.position.abs() < Self::EQUILIBRIUM_THRESHOLD
            && self.velocity.abs() < Self::EQUILIBRIUM_THRESHOLD
        {
            self.active = false;
            return self.value;
        }
        self.value = self.filter_frequency * (2.0_f32.powf(self.position) - 1.0);
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
