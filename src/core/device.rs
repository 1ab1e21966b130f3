use crate::core::alarm::AlarmAggregator;
use crate::core::attributes::{self, AttributeSpec, ALARM_BINDINGS, ATTRIBUTES, COMMANDS};
use crate::core::{AlarmInputs, AlarmOutcome, DeviceState, SignalName, SignalSource, SignalValue};
use crate::domain::model::StateSnapshot;
use crate::utils::error::{DeviceError, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

pub const RUNNING_STATUS: &str = "Amplifier is running";

/// Value written to a TTL signal by the enable and disable commands.
pub const TTL_TRIGGER: SignalValue = SignalValue::Long(1);

/// Drive amplifier facade. Attribute access and commands are forwarded to the
/// PLC signals named by the device properties; the device state follows the
/// aggregate alarm.
pub struct DriveAmplifier<S: SignalSource> {
    source: S,
    attribute_signals: HashMap<&'static str, SignalName>,
    command_signals: HashMap<&'static str, SignalName>,
    state: RwLock<StateSnapshot>,
}

impl<S: SignalSource> DriveAmplifier<S> {
    /// Resolves every attribute and command property to its PLC signal.
    pub fn new(source: S, properties: &HashMap<String, String>) -> Result<Self> {
        let resolve = |property: &str| -> Result<SignalName> {
            properties
                .get(property)
                .ok_or_else(|| DeviceError::MissingProperty {
                    property: property.to_string(),
                })?
                .parse()
        };

        let mut attribute_signals = HashMap::new();
        for spec in ATTRIBUTES {
            attribute_signals.insert(spec.name, resolve(spec.property)?);
        }

        let mut command_signals = HashMap::new();
        for spec in COMMANDS {
            command_signals.insert(spec.name, resolve(spec.property)?);
        }

        Ok(Self {
            source,
            attribute_signals,
            command_signals,
            state: RwLock::new(StateSnapshot {
                state: DeviceState::Unknown,
                status: String::new(),
                changed_at: Utc::now(),
            }),
        })
    }

    pub fn init_device(&self) {
        self.set_state(DeviceState::On, Some(RUNNING_STATUS.to_string()));
        tracing::info!("✅ Drive amplifier initialised");
    }

    pub fn state(&self) -> StateSnapshot {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn signal_for(&self, attribute: &str) -> Result<&SignalName> {
        self.attribute_signals
            .get(attribute)
            .ok_or_else(|| DeviceError::UnknownAttribute {
                name: attribute.to_string(),
            })
    }

    pub async fn read_attribute(&self, name: &str) -> Result<SignalValue> {
        let spec = attributes::find_attribute(name)?;
        self.read_spec(spec).await
    }

    pub async fn write_attribute(&self, name: &str, value: SignalValue) -> Result<()> {
        let spec = attributes::find_attribute(name)?;
        if !spec.is_writable() {
            return Err(DeviceError::ReadOnlyAttribute {
                name: name.to_string(),
            });
        }

        let value = value.coerce(spec.data_type, spec.name)?;
        let signal = self.signal_for(spec.name)?;
        tracing::debug!("Writing {} = {} to {}", spec.name, value, signal);
        self.source.write(signal, value).await
    }

    /// Reads the five alarm inputs. The first failing read is returned as is.
    pub async fn read_alarm_inputs(&self) -> Result<AlarmInputs> {
        let mut values = [false; 5];
        for (slot, name) in values.iter_mut().zip(ALARM_BINDINGS) {
            let spec = attributes::find_attribute(name)?;
            *slot = self.read_spec(spec).await?.require_bool(spec.name)?;
        }

        let [temperature_alarm, vswr_alarm, psu_status, interlock, amplifier_state] = values;
        Ok(AlarmInputs {
            temperature_alarm,
            vswr_alarm,
            psu_status,
            interlock,
            amplifier_state,
        })
    }

    /// Reads the alarm inputs and applies the aggregate alarm to the device state.
    /// A failed read puts the device into FAULT and is returned to the caller.
    pub async fn check_alarms(&self) -> Result<AlarmOutcome> {
        match self.read_alarm_inputs().await {
            Ok(inputs) => {
                let outcome = AlarmAggregator::evaluate(inputs);
                self.apply_alarm(&outcome);
                Ok(outcome)
            }
            Err(e) => {
                self.fault(&e);
                Err(e)
            }
        }
    }

    pub fn apply_alarm(&self, outcome: &AlarmOutcome) {
        if outcome.is_alarm {
            self.set_state(DeviceState::Alarm, outcome.message.clone());
            return;
        }

        // Leaving FAULT must reset the status under the same guard that changes the state.
        self.update_state(|current| {
            let status = (current.state == DeviceState::Fault).then(|| RUNNING_STATUS.to_string());
            (DeviceState::On, status)
        });
    }

    pub fn fault(&self, error: &DeviceError) {
        self.set_state(DeviceState::Fault, Some(error.to_string()));
    }

    pub async fn execute_command(&self, name: &str) -> Result<bool> {
        let spec = attributes::find_command(name)?;
        let signal = self
            .command_signals
            .get(spec.name)
            .ok_or_else(|| DeviceError::UnknownCommand {
                name: name.to_string(),
            })?;

        tracing::info!("⚡ {}: writing {} to {}", spec.name, TTL_TRIGGER, signal);
        self.source.write(signal, TTL_TRIGGER).await?;
        Ok(true)
    }

    pub async fn enable_ttl(&self) -> Result<bool> {
        self.execute_command(attributes::ENABLE_TTL).await
    }

    pub async fn disable_ttl(&self) -> Result<bool> {
        self.execute_command(attributes::DISABLE_TTL).await
    }

    async fn read_spec(&self, spec: &AttributeSpec) -> Result<SignalValue> {
        let signal = self.signal_for(spec.name)?;
        let raw = self.source.read(signal).await?;
        tracing::debug!("Read {} = {} from {}", spec.name, raw, signal);
        raw.coerce(spec.data_type, spec.name)
    }

    fn set_state(&self, state: DeviceState, status: Option<String>) {
        self.update_state(|_| (state, status));
    }

    /// Decides the next state and status from the current snapshot while holding the write lock.
    /// A `None` status keeps the current one.
    fn update_state<F>(&self, next: F)
    where
        F: FnOnce(&StateSnapshot) -> (DeviceState, Option<String>),
    {
        let mut current = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let (state, status) = next(&current);
        let status_changed = status.as_ref().is_some_and(|s| *s != current.status);
        if current.state == state && !status_changed {
            return;
        }

        if current.state != state {
            tracing::info!("🔄 State {} -> {}", current.state, state);
        }
        current.state = state;
        if let Some(status) = status {
            current.status = status;
        }
        current.changed_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySource;
    use crate::core::alarm::ALARM_MESSAGE;
    use std::sync::Arc;

    fn properties() -> HashMap<String, String> {
        attributes::required_properties()
            .map(|p| {
                let attr = p.trim_start_matches("PLCAttName_");
                (p.to_string(), format!("sr/plc/1/{}", attr))
            })
            .collect()
    }

    fn signal(attr: &str) -> SignalName {
        format!("sr/plc/1/{}", attr).parse().unwrap()
    }

    fn healthy_source() -> Arc<InMemorySource> {
        let source = Arc::new(InMemorySource::new());
        for attr in ["TempA", "VSWRA", "PSUS", "Interlock", "State", "Bypass"] {
            source.set(&signal(attr), SignalValue::Bool(false));
        }
        source.set(&signal("Power"), SignalValue::Double(42.5));
        source
    }

    fn device(source: &Arc<InMemorySource>) -> DriveAmplifier<Arc<InMemorySource>> {
        let device = DriveAmplifier::new(source.clone(), &properties()).unwrap();
        device.init_device();
        device
    }

    #[test]
    fn test_missing_property_fails_construction() {
        let mut props = properties();
        props.remove("PLCAttName_DisableTTL");
        let result = DriveAmplifier::new(InMemorySource::new(), &props);
        assert!(matches!(
            result,
            Err(DeviceError::MissingProperty { property }) if property == "PLCAttName_DisableTTL"
        ));
    }

    #[test]
    fn test_malformed_property_fails_construction() {
        let mut props = properties();
        props.insert("PLCAttName_TempA".to_string(), "TempA".to_string());
        let result = DriveAmplifier::new(InMemorySource::new(), &props);
        assert!(matches!(result, Err(DeviceError::InvalidSignalName { .. })));
    }

    #[test]
    fn test_init_device_sets_on() {
        let source = healthy_source();
        let device = device(&source);
        let snapshot = device.state();
        assert_eq!(snapshot.state, DeviceState::On);
        assert_eq!(snapshot.status, RUNNING_STATUS);
    }

    #[tokio::test]
    async fn test_read_attribute_forwards_to_plc() {
        let source = healthy_source();
        let device = device(&source);
        assert_eq!(
            device.read_attribute("Power").await.unwrap(),
            SignalValue::Double(42.5)
        );
        assert_eq!(
            device.read_attribute("Interlock").await.unwrap(),
            SignalValue::Bool(false)
        );
    }

    #[tokio::test]
    async fn test_read_unknown_attribute() {
        let source = healthy_source();
        let device = device(&source);
        let err = device.read_attribute("Voltage").await.unwrap_err();
        assert!(matches!(err, DeviceError::UnknownAttribute { .. }));
    }

    #[tokio::test]
    async fn test_write_bypass_coerces_to_bool() {
        let source = healthy_source();
        let device = device(&source);
        device
            .write_attribute("Bypass", SignalValue::Long(1))
            .await
            .unwrap();
        assert_eq!(
            source.writes(),
            vec![(signal("Bypass"), SignalValue::Bool(true))]
        );
    }

    #[tokio::test]
    async fn test_write_read_only_attribute_is_rejected() {
        let source = healthy_source();
        let device = device(&source);
        let err = device
            .write_attribute("Temperature_Alarm", SignalValue::Bool(true))
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::ReadOnlyAttribute { .. }));
        assert!(source.writes().is_empty());
    }

    #[tokio::test]
    async fn test_check_alarms_sets_alarm_state() {
        let source = healthy_source();
        let device = device(&source);
        source.set(&signal("VSWRA"), SignalValue::Bool(true));

        let outcome = device.check_alarms().await.unwrap();
        assert!(outcome.is_alarm);

        let snapshot = device.state();
        assert_eq!(snapshot.state, DeviceState::Alarm);
        assert_eq!(snapshot.status, ALARM_MESSAGE);
    }

    #[tokio::test]
    async fn test_cleared_alarm_returns_to_on_and_keeps_status() {
        let source = healthy_source();
        let device = device(&source);
        source.set(&signal("State"), SignalValue::Bool(true));
        device.check_alarms().await.unwrap();

        source.set(&signal("State"), SignalValue::Bool(false));
        let outcome = device.check_alarms().await.unwrap();
        assert!(!outcome.is_alarm);

        let snapshot = device.state();
        assert_eq!(snapshot.state, DeviceState::On);
        assert_eq!(snapshot.status, ALARM_MESSAGE);
    }

    #[tokio::test]
    async fn test_unavailable_input_faults_instead_of_defaulting() {
        let source = healthy_source();
        let device = device(&source);
        source.remove(&signal("PSUS"));

        let err = device.check_alarms().await.unwrap_err();
        assert!(matches!(err, DeviceError::SignalUnavailable { .. }));
        assert_eq!(device.state().state, DeviceState::Fault);
    }

    #[tokio::test]
    async fn test_recovery_from_fault_restores_running_status() {
        let source = healthy_source();
        let device = device(&source);
        source.remove(&signal("Interlock"));
        assert!(device.check_alarms().await.is_err());

        source.set(&signal("Interlock"), SignalValue::Bool(false));
        device.check_alarms().await.unwrap();
        let snapshot = device.state();
        assert_eq!(snapshot.state, DeviceState::On);
        assert_eq!(snapshot.status, RUNNING_STATUS);
    }

    #[tokio::test]
    async fn test_non_bool_alarm_input_is_a_type_error() {
        let source = healthy_source();
        let device = device(&source);
        source.set(&signal("TempA"), SignalValue::Double(0.5));
        let err = device.check_alarms().await.unwrap_err();
        assert!(matches!(err, DeviceError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_type_error_on_alarm_input_faults_the_device() {
        let source = healthy_source();
        let device = device(&source);
        source.set(&signal("VSWRA"), SignalValue::Long(7));

        assert!(device.read_alarm_inputs().await.is_err());
        assert!(device.check_alarms().await.is_err());
        let snapshot = device.state();
        assert_eq!(snapshot.state, DeviceState::Fault);
        assert!(snapshot.status.contains(attributes::VSWR_ALARM));
    }

    #[test]
    fn test_leaving_fault_never_keeps_fault_status() {
        let source = healthy_source();
        let device = device(&source);
        let cleared = AlarmAggregator::evaluate(AlarmInputs::default());
        let error = DeviceError::unavailable(&signal("PSUS"), "gateway down");

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..2_000 {
                    device.apply_alarm(&cleared);
                }
            });
            scope.spawn(|| {
                for _ in 0..2_000 {
                    device.fault(&error);
                }
            });
            scope.spawn(|| {
                for _ in 0..4_000 {
                    let snapshot = device.state();
                    if snapshot.state == DeviceState::On {
                        assert_eq!(snapshot.status, RUNNING_STATUS);
                    }
                }
            });
        });

        device.apply_alarm(&cleared);
        let snapshot = device.state();
        assert_eq!(snapshot.state, DeviceState::On);
        assert_eq!(snapshot.status, RUNNING_STATUS);
    }

    #[tokio::test]
    async fn test_enable_ttl_writes_one_once() {
        let source = healthy_source();
        let device = device(&source);
        assert!(device.enable_ttl().await.unwrap());
        assert_eq!(
            source.writes(),
            vec![(signal("EnableTTL"), SignalValue::Long(1))]
        );
    }

    #[tokio::test]
    async fn test_disable_ttl_writes_one_once() {
        let source = healthy_source();
        let device = device(&source);
        assert!(device.disable_ttl().await.unwrap());
        assert_eq!(
            source.writes(),
            vec![(signal("DisableTTL"), SignalValue::Long(1))]
        );
    }

    #[tokio::test]
    async fn test_command_write_failure_propagates() {
        let source = healthy_source();
        let device = device(&source);
        source.fail_writes(true);
        assert!(device.execute_command("EnableTtl").await.is_err());
    }
}
