use super::{round_to, Sensor, SensorCore, SensorType};
use rand::Rng;

pub const TEMP_MIN_C: f64 = 18.0;
pub const TEMP_MAX_C: f64 = 28.0;
const BASE_TEMP_C: f64 = 21.0;
const MAX_DRIFT_C: f64 = 0.01;
const TEMP_NOISE_C: f64 = 0.1;
const DRIFT_RESET_PROBABILITY: f64 = 0.01;

pub const HUMIDITY_MIN_PCT: f64 = 30.0;
pub const HUMIDITY_MAX_PCT: f64 = 70.0;
const BASE_HUMIDITY_PCT: f64 = 45.0;
const HUMIDITY_STEP_PCT: f64 = 0.5;

pub const CO2_MIN_PPM: f64 = 400.0;
pub const CO2_MAX_PPM: f64 = 2000.0;
const BASE_CO2_PPM: f64 = 450.0;
const CO2_APPROACH_RATE: f64 = 0.1;
const CO2_NOISE_PPM: f64 = 10.0;
const CO2_PER_OCCUPANT: f64 = 0.1;

pub const AQI_MIN: f64 = 0.0;
pub const AQI_MAX: f64 = 100.0;
const AQI_STEP: f64 = 2.0;

/// HVAC-style temperature: slow signed drift plus small noise.
#[derive(Debug)]
pub struct TemperatureSensor {
    core: SensorCore,
    base_temp_c: f64,
    current_temp_c: f64,
    drift_rate: f64,
}

impl TemperatureSensor {
    pub fn new(core: SensorCore) -> Self {
        Self::with_base(core, BASE_TEMP_C)
    }

    pub fn with_base(mut core: SensorCore, base_temp_c: f64) -> Self {
        let drift_rate = core.rng.gen_range(-MAX_DRIFT_C..=MAX_DRIFT_C);
        Self {
            core,
            base_temp_c,
            current_temp_c: base_temp_c.clamp(TEMP_MIN_C, TEMP_MAX_C),
            drift_rate,
        }
    }

    pub fn base_temp_c(&self) -> f64 {
        self.base_temp_c
    }

    pub fn drift_rate(&self) -> f64 {
        self.drift_rate
    }
}

impl Sensor for TemperatureSensor {
    fn sensor_type(&self) -> SensorType {
        SensorType::Temperature
    }

    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn read(&mut self) -> f64 {
        let noise = self.core.rng.gen_range(-TEMP_NOISE_C..=TEMP_NOISE_C);
        self.current_temp_c = (self.current_temp_c + self.drift_rate + noise).clamp(TEMP_MIN_C, TEMP_MAX_C);

        // Occasionally pick a new drift direction
        if self.core.rng.gen_bool(DRIFT_RESET_PROBABILITY) {
            self.drift_rate = self.core.rng.gen_range(-MAX_DRIFT_C..=MAX_DRIFT_C);
        }

        round_to(self.current_temp_c, 2)
    }
}

#[derive(Debug)]
pub struct HumiditySensor {
    core: SensorCore,
    current_pct: f64,
}

impl HumiditySensor {
    pub fn new(core: SensorCore) -> Self {
        Self {
            core,
            current_pct: BASE_HUMIDITY_PCT,
        }
    }
}

impl Sensor for HumiditySensor {
    fn sensor_type(&self) -> SensorType {
        SensorType::Humidity
    }

    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn read(&mut self) -> f64 {
        let step = self.core.rng.gen_range(-HUMIDITY_STEP_PCT..=HUMIDITY_STEP_PCT);
        self.current_pct = (self.current_pct + step).clamp(HUMIDITY_MIN_PCT, HUMIDITY_MAX_PCT);
        round_to(self.current_pct, 2)
    }
}

/// CO2 concentration relaxing toward `base × occupancy_multiplier`.
#[derive(Debug)]
pub struct Co2Sensor {
    core: SensorCore,
    base_ppm: f64,
    current_ppm: f64,
    occupancy_multiplier: f64,
}

impl Co2Sensor {
    pub fn new(core: SensorCore) -> Self {
        Self {
            core,
            base_ppm: BASE_CO2_PPM,
            current_ppm: BASE_CO2_PPM,
            occupancy_multiplier: 1.0,
        }
    }

    /// Couple the target concentration to a head count. Not wired to any
    /// occupancy sensor; an external occupancy feed may call it.
    pub fn set_occupancy(&mut self, count: u32) {
        self.occupancy_multiplier = 1.0 + f64::from(count) * CO2_PER_OCCUPANT;
    }

    pub fn occupancy_multiplier(&self) -> f64 {
        self.occupancy_multiplier
    }

    pub fn target_ppm(&self) -> f64 {
        self.base_ppm * self.occupancy_multiplier
    }
}

impl Sensor for Co2Sensor {
    fn sensor_type(&self) -> SensorType {
        SensorType::Co2
    }

    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn read(&mut self) -> f64 {
        let target = self.target_ppm();
        let noise = self.core.rng.gen_range(-CO2_NOISE_PPM..=CO2_NOISE_PPM);
        self.current_ppm += (target - self.current_ppm) * CO2_APPROACH_RATE + noise;
        self.current_ppm = self.current_ppm.clamp(CO2_MIN_PPM, CO2_MAX_PPM);
        round_to(self.current_ppm, 2)
    }
}

#[derive(Debug)]
pub struct AirQualitySensor {
    core: SensorCore,
    current_aqi: f64,
}

impl AirQualitySensor {
    pub fn new(mut core: SensorCore) -> Self {
        let current_aqi = core.rng.gen_range(50.0..=100.0);
        Self { core, current_aqi }
    }
}

impl Sensor for AirQualitySensor {
    fn sensor_type(&self) -> SensorType {
        SensorType::AirQuality
    }

    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn read(&mut self) -> f64 {
        let step = self.core.rng.gen_range(-AQI_STEP..=AQI_STEP);
        self.current_aqi = (self.current_aqi + step).clamp(AQI_MIN, AQI_MAX);
        round_to(self.current_aqi, 2)
    }
}
