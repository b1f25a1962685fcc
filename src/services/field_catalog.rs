//! Static metadata for the dashboard fields the client knows how to present
//!
//! The catalog is built once on first use and never changes afterwards.
//! Order matters: sensors are created in catalog order.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// Unit of measurement
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Unit {
    #[serde(rename = "°C")]
    Celsius,
    #[serde(rename = "m³/h")]
    CubicMetersPerHour,
}

impl Unit {
    /// Display symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Celsius => "°C",
            Unit::CubicMetersPerHour => "m³/h",
        }
    }
}

/// What kind of quantity a field holds
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Temperature,
    VolumeFlowRate,
    /// Value is one of a fixed set of labels
    Enum,
}

/// How consecutive values relate to each other
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
}

/// Display metadata for one dashboard field
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub unit: Option<Unit>,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    pub icon: Option<&'static str>,
    /// Labels of a coded field, indexed by the raw integer code
    pub options: Option<&'static [&'static str]>,
}

impl FieldDescriptor {
    fn new(key: &'static str, name: &'static str) -> Self {
        Self {
            key,
            name,
            unit: None,
            device_class: None,
            state_class: None,
            icon: None,
            options: None,
        }
    }

    fn unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    fn device_class(mut self, device_class: DeviceClass) -> Self {
        self.device_class = Some(device_class);
        self
    }

    fn measurement(mut self) -> Self {
        self.state_class = Some(StateClass::Measurement);
        self
    }

    fn icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
        self
    }

    fn options(mut self, options: &'static [&'static str]) -> Self {
        self.options = Some(options);
        self
    }

    /// Whether the raw value is an integer code translated via `options`
    pub fn is_coded(&self) -> bool {
        self.options.is_some()
    }

    /// Label for a raw code; `None` for codes outside the option list
    pub fn label(&self, code: i64) -> Option<&'static str> {
        let options = self.options?;
        usize::try_from(code)
            .ok()
            .and_then(|index| options.get(index).copied())
    }
}

/// Key of the season field
pub const SEASON_KEY: &str = "season";

/// Season labels indexed by the appliance's season code
pub const SEASON_OPTIONS: &[&str] = &["heating", "shoulder", "cooling"];

/// Immutable lookup table of known fields
#[derive(Debug)]
pub struct FieldCatalog {
    fields: Vec<FieldDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl FieldCatalog {
    fn new(fields: Vec<FieldDescriptor>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(position, field)| (field.key, position))
            .collect();
        Self { fields, index }
    }

    /// Descriptor for a field key
    pub fn get(&self, key: &str) -> Option<&FieldDescriptor> {
        self.index.get(key).map(|&position| &self.fields[position])
    }

    /// All descriptors in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

static CATALOG: Lazy<FieldCatalog> = Lazy::new(|| {
    use DeviceClass::*;
    use Unit::*;

    FieldCatalog::new(vec![
        FieldDescriptor::new("indoorTemperature", "Indoor Temperature")
            .unit(Celsius)
            .device_class(Temperature)
            .measurement(),
        FieldDescriptor::new("outdoorTemperature", "Outdoor Temperature")
            .unit(Celsius)
            .device_class(Temperature)
            .measurement(),
        FieldDescriptor::new("exhaustAirFlow", "Exhaust Air Flow")
            .unit(CubicMetersPerHour)
            .device_class(VolumeFlowRate)
            .measurement()
            .icon("mdi:fan-remove"),
        FieldDescriptor::new("supplyAirFlow", "Supply Air Flow")
            .unit(CubicMetersPerHour)
            .device_class(VolumeFlowRate)
            .measurement()
            .icon("mdi:fan-add"),
        FieldDescriptor::new("fanSpeed", "Fan Speed")
            .measurement()
            .icon("mdi:fan"),
        FieldDescriptor::new("setPointTemperature", "Setpoint Temperature")
            .unit(Celsius)
            .device_class(Temperature)
            .measurement(),
        FieldDescriptor::new(SEASON_KEY, "Season")
            .icon("mdi:sun-snowflake")
            .device_class(Enum)
            .options(SEASON_OPTIONS),
        FieldDescriptor::new("schedule", "Schedule").icon("mdi:calendar-clock"),
        FieldDescriptor::new("status", "Status").icon("mdi:information-outline"),
        FieldDescriptor::new("heatPumpStatus", "Heat Pump Status").icon("mdi:heat-pump-outline"),
        FieldDescriptor::new("hpStandby", "HP Standby").icon("mdi:power-sleep"),
        FieldDescriptor::new("freeCoolingEnabled", "Free Cooling Enabled")
            .icon("mdi:snowflake-thermometer"),
    ])
});

/// The process-wide field catalog
pub fn catalog() -> &'static FieldCatalog {
    &CATALOG
}

/// Season label for a raw season code
pub fn season_label(code: i64) -> Option<&'static str> {
    catalog().get(SEASON_KEY).and_then(|field| field.label(code))
}
