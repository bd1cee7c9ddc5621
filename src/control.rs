//! Discrete driving commands and the sources that produce them.
//!
//! A vehicle does not care whether its commands come from a keyboard or from
//! a network: both sit behind [`CommandSource`] and are fed to the vehicle by
//! [`drive`].

use serde::{Deserialize, Serialize};

use crate::vehicle::Vehicle;

/// Number of entries in a command vector.
pub const COMMAND_LEN: usize = 6;

/// One driving control, in command-vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Control {
    Forward,
    Backward,
    TurnRight,
    TurnLeft,
    Accelerate,
    Brake,
}

impl Control {
    pub const ALL: [Self; COMMAND_LEN] = [
        Self::Forward,
        Self::Backward,
        Self::TurnRight,
        Self::TurnLeft,
        Self::Accelerate,
        Self::Brake,
    ];

    /// Position in the command vector.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Boolean command vector applied to a vehicle for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DriveCommands([bool; COMMAND_LEN]);

impl DriveCommands {
    /// Nothing pressed.
    pub const NONE: Self = Self([false; COMMAND_LEN]);

    #[must_use]
    pub const fn new(active: [bool; COMMAND_LEN]) -> Self {
        Self(active)
    }

    /// Threshold network outputs into commands.
    ///
    /// Output `i` activates [`Control::ALL`]`[i]` when strictly above
    /// `threshold`. Missing outputs stay inactive; extra outputs are ignored.
    #[must_use]
    pub fn from_outputs(outputs: &[f32], threshold: f32) -> Self {
        let mut active = [false; COMMAND_LEN];
        for (slot, &value) in active.iter_mut().zip(outputs) {
            *slot = value > threshold;
        }
        Self(active)
    }

    #[must_use]
    pub const fn is_active(self, control: Control) -> bool {
        self.0[control.index()]
    }

    pub fn set(&mut self, control: Control, active: bool) {
        self.0[control.index()] = active;
    }

    #[must_use]
    pub const fn as_array(self) -> [bool; COMMAND_LEN] {
        self.0
    }

    /// `1.0` / `0.0` per control, for sinks that take numeric input.
    #[must_use]
    pub fn as_floats(self) -> [f32; COMMAND_LEN] {
        self.0.map(|on| if on { 1.0 } else { 0.0 })
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0.iter().all(|on| !on)
    }
}

/// Anything that can be polled for this tick's commands.
pub trait CommandSource {
    fn poll(&mut self) -> DriveCommands;
}

/// Agent-driven source: holds whatever the controller pushed last.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticInput {
    pending: DriveCommands,
}

impl SyntheticInput {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: DriveCommands::NONE,
        }
    }

    pub fn push(&mut self, commands: DriveCommands) {
        self.pending = commands;
    }

    pub fn clear(&mut self) {
        self.pending = DriveCommands::NONE;
    }

    #[must_use]
    pub const fn pending(&self) -> DriveCommands {
        self.pending
    }
}

impl CommandSource for SyntheticInput {
    fn poll(&mut self) -> DriveCommands {
        self.pending
    }
}

/// Live device source backed by a key-state query.
pub struct DeviceInput<F> {
    is_pressed: F,
}

impl<F: FnMut(Control) -> bool> DeviceInput<F> {
    pub fn new(is_pressed: F) -> Self {
        Self { is_pressed }
    }
}

impl<F: FnMut(Control) -> bool> CommandSource for DeviceInput<F> {
    fn poll(&mut self) -> DriveCommands {
        let mut commands = DriveCommands::NONE;
        for control in Control::ALL {
            commands.set(control, (self.is_pressed)(control));
        }
        commands
    }
}

/// Poll `source` and apply the result to `vehicle`.
pub fn drive<V, S>(vehicle: &mut V, source: &mut S) -> DriveCommands
where
    V: Vehicle + ?Sized,
    S: CommandSource + ?Sized,
{
    let commands = source.poll();
    vehicle.apply_commands(commands);
    commands
}
