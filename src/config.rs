use crate::error::ConfigError;
use crate::scheduler::{ERROR_BACKOFF_MS, PROTOCOL_REFRESH_PERIOD_MS, TELEMETRY_PUBLISH_PERIOD_MS};
use crate::sensors::SensorType;
use crate::telemetry::DEFAULT_TOPIC_PREFIX;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Room assigned to sensors that no room lists.
pub const UNASSIGNED_ROOM_ID: &str = "00";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorSettings {
    /// Base seed for every random stream; `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub publish_interval_ms: u64,
    pub protocol_refresh_ms: u64,
    pub error_backoff_ms: u64,
    pub topic_prefix: String,
    pub log_level: String,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            seed: None,
            publish_interval_ms: TELEMETRY_PUBLISH_PERIOD_MS,
            protocol_refresh_ms: PROTOCOL_REFRESH_PERIOD_MS,
            error_backoff_ms: ERROR_BACKOFF_MS,
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sensors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub sensor_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolAddress {
    Bacnet { object_id: u32 },
    Modbus { register: u16 },
}

/// A sensor resolved from configuration, ready to be constructed and bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorBinding {
    pub sensor_id: String,
    pub sensor_type: SensorType,
    pub room_id: String,
    pub address: Option<ProtocolAddress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub simulator: SimulatorSettings,
    #[serde(default)]
    pub rooms: Vec<RoomConfig>,
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
}

impl SimulatorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SimulatorConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("publish_interval_ms", self.simulator.publish_interval_ms),
            ("protocol_refresh_ms", self.simulator.protocol_refresh_ms),
            ("error_backoff_ms", self.simulator.error_backoff_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::InvalidInterval { name: *name });
        }

        let mut seen = HashSet::new();
        for sensor in &self.sensors {
            if !seen.insert(sensor.id.as_str()) {
                return Err(ConfigError::DuplicateSensorId(sensor.id.clone()));
            }
        }
        Ok(())
    }

    /// Resolve type tags, protocol addresses and room assignments.
    pub fn bindings(&self) -> Result<Vec<SensorBinding>, ConfigError> {
        let mut sensor_to_room: HashMap<&str, &str> = HashMap::new();
        for room in &self.rooms {
            for sensor_id in &room.sensors {
                if let Some(first_room) = sensor_to_room.insert(sensor_id.as_str(), room.id.as_str()) {
                    return Err(ConfigError::SensorInMultipleRooms {
                        sensor_id: sensor_id.clone(),
                        first_room: first_room.to_string(),
                        second_room: room.id.clone(),
                    });
                }
            }
        }

        self.sensors
            .iter()
            .map(|sensor| {
                let sensor_type = SensorType::from_tag(&sensor.sensor_type).ok_or_else(|| {
                    ConfigError::UnknownSensorType {
                        sensor_id: sensor.id.clone(),
                        sensor_type: sensor.sensor_type.clone(),
                    }
                })?;

                Ok(SensorBinding {
                    sensor_id: sensor.id.clone(),
                    sensor_type,
                    room_id: sensor_to_room
                        .get(sensor.id.as_str())
                        .copied()
                        .unwrap_or(UNASSIGNED_ROOM_ID)
                        .to_string(),
                    address: sensor.address()?,
                })
            })
            .collect()
    }

    /// Telemetry publish interval in logical seconds.
    pub fn logical_step_s(&self) -> f64 {
        self.simulator.publish_interval_ms as f64 / 1000.0
    }
}

impl SensorConfig {
    /// The one address this sensor binds to. Setting the other protocol's
    /// field as well is rejected rather than ignored.
    fn address(&self) -> Result<Option<ProtocolAddress>, ConfigError> {
        let protocol = self
            .protocol
            .as_deref()
            .map_or_else(|| "none".to_string(), str::to_ascii_lowercase);

        let (address, stray_field) = match protocol.as_str() {
            "bacnet" => {
                let object_id = self.object_id.ok_or_else(|| ConfigError::MissingAddress {
                    sensor_id: self.id.clone(),
                    protocol: "bacnet",
                    field: "object_id",
                })?;
                (
                    Some(ProtocolAddress::Bacnet { object_id }),
                    self.register.map(|_| "register"),
                )
            }
            "modbus" => {
                let register = self.register.ok_or_else(|| ConfigError::MissingAddress {
                    sensor_id: self.id.clone(),
                    protocol: "modbus",
                    field: "register",
                })?;
                (
                    Some(ProtocolAddress::Modbus { register }),
                    self.object_id.map(|_| "object_id"),
                )
            }
            "none" => (
                None,
                self.object_id
                    .map(|_| "object_id")
                    .or_else(|| self.register.map(|_| "register")),
            ),
            _ => {
                return Err(ConfigError::UnknownProtocol {
                    sensor_id: self.id.clone(),
                    protocol: protocol.clone(),
                })
            }
        };

        match stray_field {
            Some(field) => Err(ConfigError::ConflictingAddress {
                sensor_id: self.id.clone(),
                protocol,
                field,
            }),
            None => Ok(address),
        }
    }
}

const REFERENCE_ROOMS: [(&str, &str); 8] = [
    ("01", "Server Room"),
    ("02", "Conference Room"),
    ("03", "Storage Closet"),
    ("04", "Open Office"),
    ("05", "Kitchen"),
    ("06", "Lab Workshop"),
    ("07", "Break Room"),
    ("08", "Executive Office"),
];

// (sensor id, room id, type, address)
const REFERENCE_SENSORS: [(&str, &str, SensorType, ProtocolAddress); 16] = [
    ("temp-01", "01", SensorType::Temperature, ProtocolAddress::Bacnet { object_id: 1 }),
    ("energy-01", "01", SensorType::Energy, ProtocolAddress::Modbus { register: 0 }),
    ("co2-02", "02", SensorType::Co2, ProtocolAddress::Bacnet { object_id: 2 }),
    ("occupancy-02", "02", SensorType::Occupancy, ProtocolAddress::Modbus { register: 1 }),
    ("humidity-03", "03", SensorType::Humidity, ProtocolAddress::Bacnet { object_id: 3 }),
    ("light-03", "03", SensorType::Light, ProtocolAddress::Modbus { register: 2 }),
    ("temp-04", "04", SensorType::Temperature, ProtocolAddress::Bacnet { object_id: 4 }),
    ("occupancy-04", "04", SensorType::Occupancy, ProtocolAddress::Modbus { register: 3 }),
    ("humidity-05", "05", SensorType::Humidity, ProtocolAddress::Bacnet { object_id: 5 }),
    ("energy-05", "05", SensorType::Energy, ProtocolAddress::Modbus { register: 4 }),
    ("air-quality-06", "06", SensorType::AirQuality, ProtocolAddress::Bacnet { object_id: 6 }),
    ("motion-06", "06", SensorType::Motion, ProtocolAddress::Modbus { register: 5 }),
    ("co2-07", "07", SensorType::Co2, ProtocolAddress::Bacnet { object_id: 7 }),
    ("light-07", "07", SensorType::Light, ProtocolAddress::Modbus { register: 6 }),
    ("air-quality-08", "08", SensorType::AirQuality, ProtocolAddress::Bacnet { object_id: 8 }),
    ("motion-08", "08", SensorType::Motion, ProtocolAddress::Modbus { register: 7 }),
];

impl Default for SimulatorConfig {
    /// Eight rooms, sixteen sensors: eight BACnet objects and eight Modbus registers.
    fn default() -> Self {
        let rooms = REFERENCE_ROOMS
            .iter()
            .map(|(room_id, room_name)| RoomConfig {
                id: room_id.to_string(),
                name: room_name.to_string(),
                sensors: REFERENCE_SENSORS
                    .iter()
                    .filter(|(_, sensor_room, _, _)| sensor_room == room_id)
                    .map(|(sensor_id, _, _, _)| sensor_id.to_string())
                    .collect(),
            })
            .collect();

        let sensors = REFERENCE_SENSORS
            .iter()
            .map(|(sensor_id, _, sensor_type, address)| {
                let (protocol, object_id, register) = match *address {
                    ProtocolAddress::Bacnet { object_id } => ("bacnet", Some(object_id), None),
                    ProtocolAddress::Modbus { register } => ("modbus", None, Some(register)),
                };
                SensorConfig {
                    id: sensor_id.to_string(),
                    sensor_type: sensor_type.tag().to_string(),
                    protocol: Some(protocol.to_string()),
                    object_id,
                    register,
                }
            })
            .collect();

        Self {
            simulator: SimulatorSettings::default(),
            rooms,
            sensors,
        }
    }
}
