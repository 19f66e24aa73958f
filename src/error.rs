use thiserror::Error;

/// Startup failures. Any of these aborts the simulator before a loop is spawned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("sensor {sensor_id}: unknown sensor type '{sensor_type}'")]
    UnknownSensorType { sensor_id: String, sensor_type: String },

    #[error("sensor {sensor_id}: unknown protocol '{protocol}' (expected 'bacnet' or 'modbus')")]
    UnknownProtocol { sensor_id: String, protocol: String },

    #[error("sensor {sensor_id}: protocol {protocol} requires field '{field}'")]
    MissingAddress {
        sensor_id: String,
        protocol: &'static str,
        field: &'static str,
    },

    #[error("sensor {sensor_id}: field '{field}' does not apply to protocol {protocol}; a sensor binds to exactly one address")]
    ConflictingAddress {
        sensor_id: String,
        protocol: String,
        field: &'static str,
    },

    #[error("sensor {sensor_id} is listed in room {first_room} and room {second_room}")]
    SensorInMultipleRooms {
        sensor_id: String,
        first_room: String,
        second_room: String,
    },

    #[error("sensor {sensor_id}: BACnet object id {object_id} is already bound")]
    DuplicateObjectId { sensor_id: String, object_id: u32 },

    #[error("sensor {sensor_id}: Modbus register {register} is already bound")]
    DuplicateRegister { sensor_id: String, register: u16 },

    #[error("sensor {sensor_id}: Modbus register {register} outside holding block 0..{limit}")]
    RegisterOutOfRange {
        sensor_id: String,
        register: u16,
        limit: u16,
    },

    #[error("sensor id '{0}' is defined more than once")]
    DuplicateSensorId(String),

    #[error("{name} must be greater than zero")]
    InvalidInterval { name: &'static str },
}

/// A single entry failed during a refresh pass. The entry keeps its last good value.
#[derive(Debug, Clone, Error)]
pub enum UpdateError {
    #[error("sensor {sensor_id} panicked during read: {message}")]
    SensorPanicked { sensor_id: String, message: String },
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize telemetry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("no telemetry subscribers for topic {0}")]
    NoSubscribers(String),
}
