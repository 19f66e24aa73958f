pub mod kitchen;
pub mod lab;
pub mod meeting;
pub mod office;
pub mod technical;

pub use kitchen::{BreakRoom, Kitchen};
pub use lab::LabWorkshop;
pub use meeting::ConferenceRoom;
pub use office::{ExecutiveOffice, OpenOffice};
pub use technical::{ServerRoom, StorageCloset};

use crate::clock::Clock;
use crate::sensors::round_to;
use crate::telemetry::TelemetrySnapshot;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;

/// Nominal publish interval; room timers advance by this much per snapshot.
pub const DEFAULT_LOGICAL_STEP_S: f64 = 0.5;

pub const WORK_HOURS_START: u32 = 9;
pub const WORK_HOURS_END: u32 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Server,
    Conference,
    Storage,
    Office,
    Kitchen,
    Lab,
    Breakroom,
    Executive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomInfo {
    pub room_id: &'static str,
    pub name: &'static str,
    pub floor: u8,
    pub room_type: RoomType,
}

/// Composite generator producing one snapshot of every quantity in a room.
pub trait RoomProfile: Send {
    fn info(&self) -> &RoomInfo;

    fn get_telemetry(&mut self) -> TelemetrySnapshot;

    fn room_id(&self) -> &'static str {
        self.info().room_id
    }
}

/// Random source, clock and logical time owned by one room.
pub struct RoomState {
    rng: StdRng,
    clock: Arc<dyn Clock>,
    step_s: f64,
    time_offset_s: f64,
}

impl RoomState {
    pub fn new(rng: StdRng, clock: Arc<dyn Clock>, step_s: f64) -> Self {
        Self {
            rng,
            clock,
            step_s,
            time_offset_s: 0.0,
        }
    }

    /// Logical seconds added to regime timers on every snapshot.
    pub fn step_s(&self) -> f64 {
        self.step_s
    }

    pub fn time_offset_s(&self) -> f64 {
        self.time_offset_s
    }

    /// Relative perturbation of up to ±`noise_percent`% of `value`.
    pub fn add_noise(&mut self, value: f64, noise_percent: f64) -> f64 {
        let factor: f64 = self.rng.gen_range(-1.0..=1.0);
        value + value * (noise_percent / 100.0) * factor
    }

    /// Sinusoid over logical time. Each call advances the phase by one step.
    pub fn time_based_pattern(&mut self, base: f64, amplitude: f64, period_minutes: f64) -> f64 {
        self.time_offset_s += self.step_s;
        let phase = self.time_offset_s / (period_minutes * 60.0) * 2.0 * PI;
        base + amplitude * phase.sin()
    }

    pub fn is_work_hours(&self) -> bool {
        (WORK_HOURS_START..=WORK_HOURS_END).contains(&self.clock.hour())
    }

    pub fn randint(&mut self, low: u32, high: u32) -> u32 {
        self.rng.gen_range(low..=high)
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability)
    }

    fn snapshot(&self, info: &RoomInfo, conditions: Conditions) -> TelemetrySnapshot {
        TelemetrySnapshot {
            room_id: info.room_id.to_string(),
            timestamp: self.clock.now(),
            temperature: round_to(conditions.temperature, 2),
            humidity: round_to(conditions.humidity, 2),
            co2_ppm: conditions.co2.max(0.0) as u32,
            light_lux: conditions.light_lux,
            occupancy_count: conditions.occupancy,
            motion_detected: conditions.motion,
            energy_kwh: round_to(conditions.energy, 3),
            air_quality_index: conditions.air_quality,
        }
    }
}

impl std::fmt::Debug for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomState")
            .field("step_s", &self.step_s)
            .field("time_offset_s", &self.time_offset_s)
            .finish_non_exhaustive()
    }
}

/// Unrounded values a profile produced for one tick.
#[derive(Debug, Clone, Copy)]
struct Conditions {
    temperature: f64,
    humidity: f64,
    co2: f64,
    light_lux: u32,
    occupancy: u32,
    motion: bool,
    energy: f64,
    air_quality: u8,
}

/// `max(floor, 100 - trunc(co2 / divisor))`, bounded to 0..=100.
pub fn aqi_from_co2(co2: f64, divisor: f64, floor: u8) -> u8 {
    let index = 100 - (co2 / divisor).trunc() as i64;
    index.max(i64::from(floor)).clamp(0, 100) as u8
}

/// The eight fixed profiles, each with its own random stream.
pub fn all_room_profiles(clock: Arc<dyn Clock>, step_s: f64, seed: Option<u64>) -> Vec<Box<dyn RoomProfile>> {
    let state = |stream: u64| {
        let rng = crate::stream_rng(seed, crate::ROOM_STREAM_TAG | stream);
        RoomState::new(rng, Arc::clone(&clock), step_s)
    };

    let mut rooms: Vec<Box<dyn RoomProfile>> = Vec::with_capacity(8);
    rooms.push(Box::new(ServerRoom::new(state(1))));
    rooms.push(Box::new(ConferenceRoom::new(state(2))));
    rooms.push(Box::new(StorageCloset::new(state(3))));
    rooms.push(Box::new(OpenOffice::new(state(4))));
    rooms.push(Box::new(Kitchen::new(state(5))));
    rooms.push(Box::new(LabWorkshop::new(state(6))));
    rooms.push(Box::new(BreakRoom::new(state(7))));
    rooms.push(Box::new(ExecutiveOffice::new(state(8))));
    rooms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use rand::SeedableRng;

    fn state(hour: u32) -> RoomState {
        RoomState::new(StdRng::seed_from_u64(21), Arc::new(FixedClock::at_hour(hour)), DEFAULT_LOGICAL_STEP_S)
    }

    #[test]
    fn test_add_noise_bounds() {
        let mut state = state(12);
        for _ in 0..10_000 {
            let value = state.add_noise(100.0, 5.0);
            assert!((95.0..=105.0).contains(&value));
        }
    }

    #[test]
    fn test_time_based_pattern_advances_logical_time() {
        let mut state = state(12);
        // Quarter period of a 2 minute sinusoid is 30 s = 60 steps
        let mut value = 0.0;
        for _ in 0..60 {
            value = state.time_based_pattern(22.0, 1.5, 2.0);
        }
        assert!((state.time_offset_s() - 30.0).abs() < 1e-9);
        assert!((value - 23.5).abs() < 1e-9);
    }

    #[test]
    fn test_work_hours_boundaries() {
        assert!(!state(8).is_work_hours());
        assert!(state(9).is_work_hours());
        assert!(state(17).is_work_hours());
        assert!(!state(18).is_work_hours());
    }

    #[test]
    fn test_aqi_from_co2() {
        assert_eq!(aqi_from_co2(1200.0, 20.0, 50), 50);
        assert_eq!(aqi_from_co2(500.0, 20.0, 50), 75);
        assert_eq!(aqi_from_co2(519.9, 20.0, 50), 75);
        assert_eq!(aqi_from_co2(0.0, 15.0, 60), 100);
    }

    #[test]
    fn test_all_room_profiles_identity() {
        let rooms = all_room_profiles(Arc::new(FixedClock::at_hour(10)), DEFAULT_LOGICAL_STEP_S, Some(1));
        let ids: Vec<_> = rooms.iter().map(|room| room.room_id()).collect();
        assert_eq!(ids, ["01", "02", "03", "04", "05", "06", "07", "08"]);
    }
}
