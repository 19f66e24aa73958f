use super::{aqi_from_co2, Conditions, RoomInfo, RoomProfile, RoomState, RoomType};
use crate::telemetry::TelemetrySnapshot;

pub const COOKING_START_PROBABILITY: f64 = 0.02;
pub const COOKING_MIN_S: u32 = 300;
pub const COOKING_MAX_S: u32 = 900;

const BREAK_ROOM_USE_PROBABILITY: f64 = 0.25;

/// Kitchen with random cooking episodes that spike heat, steam and load.
#[derive(Debug)]
pub struct Kitchen {
    info: RoomInfo,
    state: RoomState,
    cooking_active: bool,
    cooking_remaining_s: f64,
}

impl Kitchen {
    pub fn new(state: RoomState) -> Self {
        Self {
            info: RoomInfo {
                room_id: "05",
                name: "Kitchen",
                floor: 1,
                room_type: RoomType::Kitchen,
            },
            state,
            cooking_active: false,
            cooking_remaining_s: 0.0,
        }
    }

    pub fn cooking_active(&self) -> bool {
        self.cooking_active
    }

    pub fn cooking_remaining_s(&self) -> f64 {
        self.cooking_remaining_s
    }

    /// Start a cooking episode of `duration_s` logical seconds.
    pub fn start_cooking(&mut self, duration_s: u32) {
        self.cooking_active = true;
        self.cooking_remaining_s = f64::from(duration_s);
    }

    fn advance_cooking(&mut self) {
        if !self.cooking_active && self.state.chance(COOKING_START_PROBABILITY) {
            let duration = self.state.randint(COOKING_MIN_S, COOKING_MAX_S);
            self.start_cooking(duration);
        }

        if self.cooking_active {
            self.cooking_remaining_s -= self.state.step_s();
            if self.cooking_remaining_s <= 0.0 {
                self.cooking_active = false;
                self.cooking_remaining_s = 0.0;
            }
        }
    }
}

impl RoomProfile for Kitchen {
    fn info(&self) -> &RoomInfo {
        &self.info
    }

    fn get_telemetry(&mut self) -> TelemetrySnapshot {
        self.advance_cooking();

        let state = &mut self.state;
        let mut conditions = if self.cooking_active {
            Conditions {
                temperature: state.add_noise(28.0, 10.0),
                humidity: state.add_noise(70.0, 12.0),
                co2: state.add_noise(1000.0, 20.0),
                light_lux: state.randint(300, 500),
                occupancy: state.randint(1, 3),
                motion: true,
                energy: state.add_noise(3.5, 25.0),
                air_quality: 0,
            }
        } else {
            Conditions {
                temperature: state.add_noise(21.0, 3.0),
                humidity: state.add_noise(50.0, 5.0),
                co2: state.add_noise(550.0, 10.0),
                light_lux: state.randint(100, 300),
                occupancy: state.randint(0, 1),
                motion: state.chance(0.3),
                energy: state.add_noise(0.6, 15.0),
                air_quality: 0,
            }
        };
        conditions.air_quality = aqi_from_co2(conditions.co2, 18.0, 40);

        self.state.snapshot(&self.info, conditions)
    }
}

/// Sporadically used break room. Use is sampled fresh on every snapshot.
#[derive(Debug)]
pub struct BreakRoom {
    info: RoomInfo,
    state: RoomState,
}

impl BreakRoom {
    pub fn new(state: RoomState) -> Self {
        Self {
            info: RoomInfo {
                room_id: "07",
                name: "Break Room",
                floor: 2,
                room_type: RoomType::Breakroom,
            },
            state,
        }
    }
}

impl RoomProfile for BreakRoom {
    fn info(&self) -> &RoomInfo {
        &self.info
    }

    fn get_telemetry(&mut self) -> TelemetrySnapshot {
        let state = &mut self.state;
        let in_use = state.chance(BREAK_ROOM_USE_PROBABILITY);

        let conditions = Conditions {
            temperature: state.add_noise(21.5, 2.0),
            humidity: state.add_noise(47.0, 4.0),
            co2: state.add_noise(if in_use { 600.0 } else { 450.0 }, 10.0),
            light_lux: if in_use { state.randint(250, 400) } else { state.randint(0, 100) },
            occupancy: if in_use { state.randint(1, 3) } else { 0 },
            motion: in_use,
            energy: state.add_noise(if in_use { 0.8 } else { 0.3 }, 15.0),
            air_quality: state.randint(75, 90) as u8,
        };

        self.state.snapshot(&self.info, conditions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn kitchen() -> Kitchen {
        Kitchen::new(RoomState::new(StdRng::seed_from_u64(5), Arc::new(FixedClock::at_hour(12)), 0.5))
    }

    #[test]
    fn test_cooking_episode_counts_down_in_logical_time() {
        let mut kitchen = kitchen();
        kitchen.start_cooking(300);

        // 300 s at 0.5 s per snapshot
        for _ in 0..599 {
            kitchen.get_telemetry();
            assert!(kitchen.cooking_active());
        }
        kitchen.get_telemetry();
        assert!(!kitchen.cooking_active());
        assert_eq!(kitchen.cooking_remaining_s(), 0.0);
    }

    #[test]
    fn test_cooking_episode_duration_range() {
        let mut kitchen = kitchen();
        for _ in 0..20_000 {
            let was_active = kitchen.cooking_active();
            kitchen.get_telemetry();
            if !was_active && kitchen.cooking_active() {
                let remaining = kitchen.cooking_remaining_s() + 0.5;
                assert!((f64::from(COOKING_MIN_S)..=f64::from(COOKING_MAX_S)).contains(&remaining));
            }
        }
    }
}
