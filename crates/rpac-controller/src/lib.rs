//! Access control for one piece of equipment.
//!
//! This crate holds the decision logic: the [`AccessController`] state
//! machine, the [`RelaySequencer`] that owns the relay output, the
//! [`DisconnectTimer`] grace window, and the task wiring in
//! [`spawn_controller`].

pub mod controller;
pub mod indicator;
pub mod relay;
pub mod runtime;
pub mod session;
pub mod state_machine;
pub mod warning;

pub use controller::AccessController;
pub use indicator::{IndicatorCode, IndicatorPattern, IndicatorSink, RecordingIndicator};
pub use relay::{RelayCommand, RelayHandle, RelaySequencer};
pub use runtime::{ControllerHandle, spawn_controller};
pub use session::EquipmentSession;
pub use state_machine::{AccessState, StateMachine, StateTransition};
pub use warning::{DisconnectTimer, WarningPoll, WarningReason, WarningState};
