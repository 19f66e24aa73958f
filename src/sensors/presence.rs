use super::{Sensor, SensorCore, SensorType, DEFAULT_MAX_OCCUPANCY};
use rand::seq::SliceRandom;
use rand::Rng;

pub const MOTION_TOGGLE_PROBABILITY: f64 = 0.1;

// 60% stay, 20% leave, 20% arrive
const OCCUPANCY_STEPS: [i64; 5] = [-1, 0, 0, 0, 1];

#[derive(Debug)]
pub struct MotionSensor {
    core: SensorCore,
    motion_detected: bool,
}

impl MotionSensor {
    pub fn new(core: SensorCore) -> Self {
        Self {
            core,
            motion_detected: false,
        }
    }

    pub fn motion_detected(&self) -> bool {
        self.motion_detected
    }
}

impl Sensor for MotionSensor {
    fn sensor_type(&self) -> SensorType {
        SensorType::Motion
    }

    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn read(&mut self) -> f64 {
        if self.core.rng.gen_bool(MOTION_TOGGLE_PROBABILITY) {
            self.motion_detected = !self.motion_detected;
        }
        if self.motion_detected {
            1.0
        } else {
            0.0
        }
    }
}

/// Head count doing a bounded integer random walk.
#[derive(Debug)]
pub struct OccupancySensor {
    core: SensorCore,
    max_occupancy: u32,
    current_count: u32,
}

impl OccupancySensor {
    pub fn new(core: SensorCore) -> Self {
        Self::with_capacity(core, DEFAULT_MAX_OCCUPANCY)
    }

    pub fn with_capacity(mut core: SensorCore, max_occupancy: u32) -> Self {
        let current_count = core.rng.gen_range(0..=max_occupancy);
        Self {
            core,
            max_occupancy,
            current_count,
        }
    }

    pub fn max_occupancy(&self) -> u32 {
        self.max_occupancy
    }

    pub fn current_count(&self) -> u32 {
        self.current_count
    }
}

impl Sensor for OccupancySensor {
    fn sensor_type(&self) -> SensorType {
        SensorType::Occupancy
    }

    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn read(&mut self) -> f64 {
        let change = OCCUPANCY_STEPS.choose(&mut self.core.rng).copied().unwrap_or(0);
        let next = (i64::from(self.current_count) + change).clamp(0, i64::from(self.max_occupancy));
        self.current_count = next as u32;
        f64::from(self.current_count)
    }
}
