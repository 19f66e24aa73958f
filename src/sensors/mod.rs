pub mod climate;
pub mod electrical;
pub mod presence;

pub use climate::{AirQualitySensor, Co2Sensor, HumiditySensor, TemperatureSensor};
pub use electrical::{EnergySensor, LightSensor};
pub use presence::{MotionSensor, OccupancySensor};

use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const DEFAULT_MAX_OCCUPANCY: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Temperature,
    Humidity,
    Co2,
    AirQuality,
    Light,
    Energy,
    Motion,
    Occupancy,
}

impl SensorType {
    pub const ALL: [SensorType; 8] = [
        SensorType::Temperature,
        SensorType::Humidity,
        SensorType::Co2,
        SensorType::AirQuality,
        SensorType::Light,
        SensorType::Energy,
        SensorType::Motion,
        SensorType::Occupancy,
    ];

    /// Configuration tag, e.g. `"air_quality"`.
    pub fn tag(self) -> &'static str {
        match self {
            SensorType::Temperature => "temperature",
            SensorType::Humidity => "humidity",
            SensorType::Co2 => "co2",
            SensorType::AirQuality => "air_quality",
            SensorType::Light => "light",
            SensorType::Energy => "energy",
            SensorType::Motion => "motion",
            SensorType::Occupancy => "occupancy",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    /// Closed range every reading of this type stays within.
    pub fn range(self) -> RangeInclusive<f64> {
        match self {
            SensorType::Temperature => climate::TEMP_MIN_C..=climate::TEMP_MAX_C,
            SensorType::Humidity => climate::HUMIDITY_MIN_PCT..=climate::HUMIDITY_MAX_PCT,
            SensorType::Co2 => climate::CO2_MIN_PPM..=climate::CO2_MAX_PPM,
            SensorType::AirQuality => climate::AQI_MIN..=climate::AQI_MAX,
            SensorType::Light => 0.0..=electrical::LIGHT_ON_MAX_LUX,
            SensorType::Energy => 0.0..=f64::MAX,
            SensorType::Motion => 0.0..=1.0,
            SensorType::Occupancy => 0.0..=f64::from(DEFAULT_MAX_OCCUPANCY),
        }
    }
}

impl std::fmt::Display for SensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Identity, bookkeeping and random source shared by every sensor model.
#[derive(Debug)]
pub struct SensorCore {
    sensor_id: String,
    room_id: String,
    last_value: Option<f64>,
    last_update: DateTime<Utc>,
    pub(crate) rng: StdRng,
}

impl SensorCore {
    pub fn new(sensor_id: &str, room_id: &str, rng: StdRng) -> Self {
        Self {
            sensor_id: sensor_id.to_string(),
            room_id: room_id.to_string(),
            last_value: None,
            last_update: Utc::now(),
            rng,
        }
    }

    fn record(&mut self, value: f64) {
        self.last_value = Some(value);
        self.last_update = Utc::now();
    }
}

/// A stateful generator for one physical quantity.
pub trait Sensor: Send {
    fn sensor_type(&self) -> SensorType;
    fn core(&self) -> &SensorCore;
    fn core_mut(&mut self) -> &mut SensorCore;

    /// Advance the model by one step and return the new reading.
    fn read(&mut self) -> f64;

    /// `read` plus last-value bookkeeping. Protocol stores call this.
    fn get_value(&mut self) -> f64 {
        let value = self.read();
        self.core_mut().record(value);
        value
    }

    fn sensor_id(&self) -> &str {
        &self.core().sensor_id
    }

    fn room_id(&self) -> &str {
        &self.core().room_id
    }

    fn last_value(&self) -> Option<f64> {
        self.core().last_value
    }

    fn last_update(&self) -> DateTime<Utc> {
        self.core().last_update
    }
}

impl std::fmt::Debug for dyn Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sensor")
            .field("type", &self.sensor_type())
            .field("sensor_id", &self.sensor_id())
            .field("room_id", &self.room_id())
            .field("last_value", &self.last_value())
            .finish()
    }
}

pub fn create_sensor(
    sensor_type: SensorType,
    sensor_id: &str,
    room_id: &str,
    rng: StdRng,
) -> Box<dyn Sensor> {
    let core = SensorCore::new(sensor_id, room_id, rng);
    match sensor_type {
        SensorType::Temperature => Box::new(TemperatureSensor::new(core)),
        SensorType::Humidity => Box::new(HumiditySensor::new(core)),
        SensorType::Co2 => Box::new(Co2Sensor::new(core)),
        SensorType::AirQuality => Box::new(AirQualitySensor::new(core)),
        SensorType::Light => Box::new(LightSensor::new(core)),
        SensorType::Energy => Box::new(EnergySensor::new(core)),
        SensorType::Motion => Box::new(MotionSensor::new(core)),
        SensorType::Occupancy => Box::new(OccupancySensor::new(core)),
    }
}

/// Factory keyed by the configuration type tag.
pub fn create_sensor_from_tag(
    tag: &str,
    sensor_id: &str,
    room_id: &str,
    rng: StdRng,
) -> Result<Box<dyn Sensor>, ConfigError> {
    let sensor_type = SensorType::from_tag(tag).ok_or_else(|| ConfigError::UnknownSensorType {
        sensor_id: sensor_id.to_string(),
        sensor_type: tag.to_string(),
    })?;
    Ok(create_sensor(sensor_type, sensor_id, room_id, rng))
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
