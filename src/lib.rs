pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliCommand, CliConfig};

pub use adapters::{InMemorySource, TangoRestSource};
pub use config::DeviceConfig;
pub use crate::core::{
    alarm::{AlarmAggregator, ALARM_MESSAGE},
    device::DriveAmplifier,
    monitor::{AlarmMonitor, PollOutcome},
};
pub use domain::model::{AlarmInputs, AlarmOutcome, DeviceState, SignalName, SignalValue};
pub use domain::ports::SignalSource;
pub use utils::error::{DeviceError, Result};
