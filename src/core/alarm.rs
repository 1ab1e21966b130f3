use crate::domain::model::{AlarmInputs, AlarmOutcome};

pub const ALARM_MESSAGE: &str = "One or more alarms of the amplifier are active.";

/// Derives the aggregate amplifier alarm from the five alarm inputs.
pub struct AlarmAggregator;

impl AlarmAggregator {
    /// Any active input raises the alarm. Without an alarm no message is produced
    /// and the caller keeps its current status.
    pub fn evaluate(inputs: AlarmInputs) -> AlarmOutcome {
        let is_alarm = inputs.temperature_alarm
            || inputs.vswr_alarm
            || inputs.psu_status
            || inputs.interlock
            || inputs.amplifier_state;

        AlarmOutcome {
            is_alarm,
            message: is_alarm.then(|| ALARM_MESSAGE.to_string()),
        }
    }
}
