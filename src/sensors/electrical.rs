use super::{round_to, Sensor, SensorCore, SensorType};
use rand::Rng;

pub const LIGHT_ON_MIN_LUX: f64 = 300.0;
pub const LIGHT_ON_MAX_LUX: f64 = 600.0;
pub const LIGHT_OFF_MAX_LUX: f64 = 50.0;
pub const LIGHT_TOGGLE_PROBABILITY: f64 = 0.02;

const ENERGY_INITIAL_MAX_KWH: f64 = 5.0;
pub const ENERGY_RATE_MIN_KWH: f64 = 0.001;
pub const ENERGY_RATE_MAX_KWH: f64 = 0.005;

/// Switched lighting circuit measured in lux.
#[derive(Debug)]
pub struct LightSensor {
    core: SensorCore,
    is_on: bool,
    lux_level: f64,
}

impl LightSensor {
    pub fn new(mut core: SensorCore) -> Self {
        let is_on = core.rng.gen_bool(0.5);
        Self {
            core,
            is_on,
            lux_level: if is_on { 500.0 } else { 0.0 },
        }
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn lux_level(&self) -> f64 {
        self.lux_level
    }
}

impl Sensor for LightSensor {
    fn sensor_type(&self) -> SensorType {
        SensorType::Light
    }

    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn read(&mut self) -> f64 {
        if self.core.rng.gen_bool(LIGHT_TOGGLE_PROBABILITY) {
            self.is_on = !self.is_on;
        }

        self.lux_level = if self.is_on {
            self.core.rng.gen_range(LIGHT_ON_MIN_LUX..=LIGHT_ON_MAX_LUX)
        } else {
            self.core.rng.gen_range(0.0..=LIGHT_OFF_MAX_LUX)
        };

        round_to(self.lux_level, 2)
    }
}

/// Cumulative energy meter. Never decreases.
#[derive(Debug)]
pub struct EnergySensor {
    core: SensorCore,
    cumulative_kwh: f64,
    consumption_rate: f64,
}

impl EnergySensor {
    pub fn new(mut core: SensorCore) -> Self {
        let cumulative_kwh = core.rng.gen_range(0.0..=ENERGY_INITIAL_MAX_KWH);
        let consumption_rate = core.rng.gen_range(ENERGY_RATE_MIN_KWH..=ENERGY_RATE_MAX_KWH);
        Self {
            core,
            cumulative_kwh,
            consumption_rate,
        }
    }

    pub fn consumption_rate(&self) -> f64 {
        self.consumption_rate
    }
}

impl Sensor for EnergySensor {
    fn sensor_type(&self) -> SensorType {
        SensorType::Energy
    }

    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn read(&mut self) -> f64 {
        self.cumulative_kwh += self.consumption_rate;
        round_to(self.cumulative_kwh, 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn core(seed: u64) -> SensorCore {
        SensorCore::new("test", "01", StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_energy_rate_fixed_per_instance() {
        let mut sensor = EnergySensor::new(core(4));
        let rate = sensor.consumption_rate();
        assert!((ENERGY_RATE_MIN_KWH..=ENERGY_RATE_MAX_KWH).contains(&rate));

        let first = sensor.read();
        for _ in 0..100 {
            sensor.read();
        }
        let last = sensor.read();
        assert!((last - first - rate * 101.0).abs() < 1e-3);
        assert_eq!(sensor.consumption_rate(), rate);
    }

    #[test]
    fn test_light_level_matches_state() {
        let mut sensor = LightSensor::new(core(8));
        for _ in 0..1_000 {
            let lux = sensor.read();
            if sensor.is_on() {
                assert!((LIGHT_ON_MIN_LUX..=LIGHT_ON_MAX_LUX).contains(&lux));
            } else {
                assert!((0.0..=LIGHT_OFF_MAX_LUX).contains(&lux));
            }
        }
    }

    #[test]
    fn test_light_initial_level() {
        let sensor = LightSensor::new(core(12));
        let expected = if sensor.is_on() { 500.0 } else { 0.0 };
        assert_eq!(sensor.lux_level(), expected);
    }
}
