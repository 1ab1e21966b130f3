pub mod alarm;
pub mod attributes;
pub mod device;
pub mod monitor;

pub use crate::domain::model::{
    AlarmInputs, AlarmOutcome, DeviceState, SignalName, SignalValue, StateSnapshot,
};
pub use crate::domain::ports::SignalSource;
pub use crate::utils::error::Result;
