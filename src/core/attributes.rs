//! Attribute and command table of the drive amplifier.
//!
//! Each entry names the device property whose value is the full name of the
//! PLC attribute the local attribute or command is forwarded to.

use crate::domain::model::{AccessMode, DataType, DisplayLevel};
use crate::utils::error::{DeviceError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub property: &'static str,
    pub data_type: DataType,
    pub access: AccessMode,
    pub display_level: DisplayLevel,
    pub description: &'static str,
}

impl AttributeSpec {
    pub fn is_writable(&self) -> bool {
        self.access == AccessMode::ReadWrite
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub property: &'static str,
    pub doc_out: &'static str,
}

pub const TEMPERATURE_ALARM: &str = "Temperature_Alarm";
pub const VSWR_ALARM: &str = "VSWR_Alarm";
pub const PSU_STATUS: &str = "PSU_Status";
pub const INTERLOCK: &str = "Interlock";
pub const POWER: &str = "Power";
pub const AMPLIFIER_STATE: &str = "AmplifierState";
pub const BYPASS: &str = "Bypass";

pub const ENABLE_TTL: &str = "EnableTtl";
pub const DISABLE_TTL: &str = "DisableTtl";

pub const ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec {
        name: TEMPERATURE_ALARM,
        property: "PLCAttName_TempA",
        data_type: DataType::Bool,
        access: AccessMode::Read,
        display_level: DisplayLevel::Operator,
        description: "Name of the PLC device attribute, corresponding to the \
                      temperature alarm of the amplifier.",
    },
    AttributeSpec {
        name: VSWR_ALARM,
        property: "PLCAttName_VSWRA",
        data_type: DataType::Bool,
        access: AccessMode::Read,
        display_level: DisplayLevel::Operator,
        description: "Name of the PLC device attribute, corresponding to the \
                      Voltage Standing Wave Ratio alarm of the amplifier.",
    },
    AttributeSpec {
        name: PSU_STATUS,
        property: "PLCAttName_PSUS",
        data_type: DataType::Bool,
        access: AccessMode::Read,
        display_level: DisplayLevel::Operator,
        description: "Name of the PLC device attribute, corresponding to the \
                      Power Supply Unit status of the amplifier.",
    },
    AttributeSpec {
        name: INTERLOCK,
        property: "PLCAttName_Interlock",
        data_type: DataType::Bool,
        access: AccessMode::Read,
        display_level: DisplayLevel::Operator,
        description: "Name of the PLC device attribute, corresponding to the \
                      safety interlock of the amplifier.",
    },
    AttributeSpec {
        name: POWER,
        property: "PLCAttName_Power",
        data_type: DataType::Double,
        access: AccessMode::Read,
        display_level: DisplayLevel::Operator,
        description: "Name of the PLC device attribute, corresponding to the \
                      forwarded power of the amplifier.",
    },
    AttributeSpec {
        name: AMPLIFIER_STATE,
        property: "PLCAttName_State",
        data_type: DataType::Bool,
        access: AccessMode::Read,
        display_level: DisplayLevel::Operator,
        description: "Name of the PLC device attribute, corresponding to the \
                      state of the amplifier.",
    },
    AttributeSpec {
        name: BYPASS,
        property: "PLCAttName_Bypass",
        data_type: DataType::Bool,
        access: AccessMode::ReadWrite,
        display_level: DisplayLevel::Operator,
        description: "Name of the PLC device attribute, corresponding to the \
                      bypass command of the amplifier.",
    },
];

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: ENABLE_TTL,
        property: "PLCAttName_EnableTTL",
        doc_out: "True to PLCAttName_EnableTTL",
    },
    CommandSpec {
        name: DISABLE_TTL,
        property: "PLCAttName_DisableTTL",
        doc_out: "True to PLCAttName_DisableTTL",
    },
];

/// Attributes bound to the aggregate alarm, in [`AlarmInputs`](crate::domain::model::AlarmInputs) field order.
pub const ALARM_BINDINGS: [&str; 5] = [
    TEMPERATURE_ALARM,
    VSWR_ALARM,
    PSU_STATUS,
    INTERLOCK,
    AMPLIFIER_STATE,
];

pub fn find_attribute(name: &str) -> Result<&'static AttributeSpec> {
    ATTRIBUTES
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| DeviceError::UnknownAttribute {
            name: name.to_string(),
        })
}

pub fn find_command(name: &str) -> Result<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| DeviceError::UnknownCommand {
            name: name.to_string(),
        })
}

/// Every property the device needs, attributes first.
pub fn required_properties() -> impl Iterator<Item = &'static str> {
    ATTRIBUTES
        .iter()
        .map(|spec| spec.property)
        .chain(COMMANDS.iter().map(|spec| spec.property))
}

/// Attribute and command table as printed by the `attributes` subcommand.
pub fn render_table() -> String {
    let mut out = format!(
        "{:<18} {:<22} {:<7} {:<11} {}\n",
        "ATTRIBUTE", "PROPERTY", "TYPE", "ACCESS", "LEVEL"
    );
    for spec in ATTRIBUTES {
        let access = match spec.access {
            AccessMode::Read => "read",
            AccessMode::ReadWrite => "read-write",
        };
        out.push_str(&format!(
            "{:<18} {:<22} {:<7} {:<11} {}\n",
            spec.name, spec.property, spec.data_type, access, spec.display_level
        ));
        out.push_str(&format!("    {}\n", spec.description));
    }

    out.push('\n');
    out.push_str(&format!("{:<18} {:<22} {}\n", "COMMAND", "PROPERTY", "OUTPUT"));
    for spec in COMMANDS {
        out.push_str(&format!(
            "{:<18} {:<22} bool ({})\n",
            spec.name, spec.property, spec.doc_out
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_only_bypass_is_writable() {
        let writable: Vec<&str> = ATTRIBUTES
            .iter()
            .filter(|spec| spec.is_writable())
            .map(|spec| spec.name)
            .collect();
        assert_eq!(writable, vec![BYPASS]);
    }

    #[test]
    fn test_power_is_the_only_double() {
        for spec in ATTRIBUTES {
            let expected = if spec.name == POWER {
                DataType::Double
            } else {
                DataType::Bool
            };
            assert_eq!(spec.data_type, expected, "{}", spec.name);
        }
    }

    #[test]
    fn test_alarm_bindings_are_bool_attributes() {
        for name in ALARM_BINDINGS {
            let spec = find_attribute(name).unwrap();
            assert_eq!(spec.data_type, DataType::Bool);
        }
    }

    #[test]
    fn test_properties_are_unique() {
        let all: Vec<&str> = required_properties().collect();
        let unique: HashSet<&str> = all.iter().copied().collect();
        assert_eq!(all.len(), 9);
        assert_eq!(unique.len(), all.len());
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(find_attribute("Bypass").is_ok());
        assert!(matches!(
            find_attribute("bypass"),
            Err(DeviceError::UnknownAttribute { .. })
        ));
        assert!(find_command("EnableTtl").is_ok());
        assert!(matches!(
            find_command("Reset"),
            Err(DeviceError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_rendered_table_lists_every_entry() {
        let table = render_table();
        for spec in ATTRIBUTES {
            let row = table
                .lines()
                .find(|line| line.starts_with(spec.name))
                .unwrap();
            assert!(row.contains(spec.property));
            assert!(row.ends_with("operator"), "{}", row);
        }
        assert!(table.contains("    Name of the PLC device attribute, corresponding to the bypass command"));
        assert!(table.contains("read-write"));
        for spec in COMMANDS {
            assert!(table.contains(spec.doc_out));
        }
    }
}
