macro_rules ! sensor_type {
    {
        pub enum SensorType {
            $($name:ident = $value:literal,)*
            [$reserved_range:pat],
            [$oem_reserved_range:pat],
        }
    } => {
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum SensorType {
            $($name = $value,)*
            Reserved(u8),
            OemReserved(u8),
        }

        impl From<u8> for SensorType {
            fn from(value: u8) -> Self {
                match value {
                    $($value => Self::$name,)*
                    0 | $reserved_range => Self::Reserved(value),
                    $oem_reserved_range => Self::OemReserved(value),
                }
            }
        }

        impl From<SensorType> for u8 {
            fn from(value: SensorType) -> u8 {
                match value {
                    $(SensorType::$name => $value,)*
                    SensorType::Reserved(v) => v,
                    SensorType::OemReserved(v) => v,
                }
            }
        }

        impl TryFrom<&str> for SensorType {
            type Error = ();

            fn try_from(input: &str) -> Result<Self, Self::Error> {
                let to_lower = input.to_ascii_lowercase();

                $(
                    if stringify!($name).to_ascii_lowercase() == to_lower {
                        return Ok(SensorType::$name);
                    }
                )*

                Err(())
            }
        }
    }
}

sensor_type! {
    pub enum SensorType {
        Temperature = 0x01,
        Voltage = 0x02,
        Current = 0x03,
        Fan = 0x04,
        ChassisIntrusion = 0x05,
        PlatformSecurityViolationAttempt = 0x06,
        Processor = 0x07,
        PowerSupply = 0x08,
        PowerUnit = 0x09,
        CoolingDevice = 0x0A,
        UnitsBasedSensor = 0x0B,
        Memory = 0x0C,
        DriveSlotBay = 0x0D,
        PostMemoryResize = 0x0E,
        SystemFirmwareProgress = 0x0F,
        EventLoggingDisabled = 0x10,
        Watchdog1 = 0x11,
        SystemEvent = 0x12,
        CriticalInterrupt = 0x13,
        ButtonOrSwitch = 0x14,
        ModuleOrBoard = 0x15,
        MicroControllerOrCoprocessor = 0x16,
        AddinCard = 0x17,
        Chassis = 0x18,
        ChipSet = 0x19,
        OtherFRU = 0x1A,
        CableOrInterconnect = 0x1B,
        Terminator = 0x1C,
        SystemBootOrRestartInitiated = 0x1D,
        BootError = 0x1E,
        BaseOsBootOrInstallationStatus = 0x1F,
        OsStopOrShutdown = 0x20,
        SlotOrConnector = 0x21,
        SystemACPIPowerState = 0x22,
        Watchdog2 = 0x23,
        PlatformAlert = 0x24,
        EntityPresence = 0x25,
        MonitorAsicOrIc = 0x26,
        LAN = 0x27,
        ManagementSubSysHealth = 0x28,
        Battery = 0x29,
        SessionAudit = 0x2A,
        VersionChange = 0x2B,
        FRUState = 0x2C,
        [0x2D..=0xBF],
        [0xC0..=0xFF],
    }
}

impl SensorType {
    /// The category name collectors match metric include/exclude
    /// predicates against (IPMI v2 Table 42-3).
    pub fn metric_name(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Voltage => "voltage",
            Self::Current => "current",
            Self::Fan => "fan_speed",
            Self::ChassisIntrusion => "physical_security",
            Self::PlatformSecurityViolationAttempt => "platform_security",
            Self::Processor => "processor",
            Self::PowerSupply => "power_supply",
            Self::PowerUnit => "power_unit",
            Self::CoolingDevice => "cooling_device",
            Self::UnitsBasedSensor => "sensor",
            Self::Memory => "memory",
            Self::DriveSlotBay => "bay",
            Self::PostMemoryResize => "post_memory_resize",
            Self::SystemFirmwareProgress => "system_fw",
            Self::EventLoggingDisabled => "sel_disabled",
            Self::Watchdog1 => "watchdog1",
            Self::SystemEvent => "sys_event",
            Self::CriticalInterrupt => "critical_interrupt",
            Self::ButtonOrSwitch => "button",
            Self::ModuleOrBoard => "module",
            Self::MicroControllerOrCoprocessor => "coproc",
            Self::AddinCard => "add_in_card",
            Self::Chassis => "chassis",
            Self::ChipSet => "chip",
            Self::OtherFRU => "fru",
            Self::CableOrInterconnect => "cable",
            Self::Terminator => "terminator",
            Self::SystemBootOrRestartInitiated => "sys_boot",
            Self::BootError => "boot_error",
            Self::BaseOsBootOrInstallationStatus => "os_boot",
            Self::OsStopOrShutdown => "os_critical_stop",
            Self::SlotOrConnector => "slot",
            Self::SystemACPIPowerState => "system_acpi_power",
            Self::Watchdog2 => "watchdog2",
            Self::PlatformAlert => "platform_alert",
            Self::EntityPresence => "presence",
            Self::MonitorAsicOrIc => "monitor_ic",
            Self::LAN => "lan",
            Self::ManagementSubSysHealth => "management_subsys_health",
            Self::Battery => "battery",
            Self::SessionAudit => "session_audit",
            Self::VersionChange => "version_change",
            Self::FRUState => "fru_state",
            Self::Reserved(_) => "reserved",
            Self::OemReserved(_) => "unknown_oem",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_name_matches_category2prom() {
        assert_eq!(SensorType::Temperature.metric_name(), "temperature");
        assert_eq!(SensorType::FRUState.metric_name(), "fru_state");
        assert_eq!(SensorType::Reserved(0x2D).metric_name(), "reserved");
        assert_eq!(SensorType::OemReserved(0xC0).metric_name(), "unknown_oem");
    }
}
