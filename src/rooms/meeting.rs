use super::{aqi_from_co2, Conditions, RoomInfo, RoomProfile, RoomState, RoomType};
use crate::telemetry::TelemetrySnapshot;

/// Length of one meeting cycle in logical seconds.
pub const MEETING_CYCLE_S: f64 = 3600.0;
/// A meeting occupies the start of every cycle.
pub const MEETING_DURATION_S: f64 = 900.0;

/// Whether the meeting regime is active at logical time `t`.
pub fn meeting_active_at(t: f64) -> bool {
    t.rem_euclid(MEETING_CYCLE_S) < MEETING_DURATION_S
}

/// Bursty room: a 15 minute meeting at the top of every logical hour.
#[derive(Debug)]
pub struct ConferenceRoom {
    info: RoomInfo,
    state: RoomState,
    meeting_timer_s: f64,
    meeting_active: bool,
}

impl ConferenceRoom {
    pub fn new(state: RoomState) -> Self {
        Self {
            info: RoomInfo {
                room_id: "02",
                name: "Conference Room",
                floor: 2,
                room_type: RoomType::Conference,
            },
            state,
            meeting_timer_s: 0.0,
            meeting_active: false,
        }
    }

    pub fn meeting_timer_s(&self) -> f64 {
        self.meeting_timer_s
    }

    pub fn meeting_active(&self) -> bool {
        self.meeting_active
    }

    fn advance_cycle(&mut self) {
        self.meeting_timer_s = (self.meeting_timer_s + self.state.step_s()).rem_euclid(MEETING_CYCLE_S);
        self.meeting_active = meeting_active_at(self.meeting_timer_s);
    }
}

impl RoomProfile for ConferenceRoom {
    fn info(&self) -> &RoomInfo {
        &self.info
    }

    fn get_telemetry(&mut self) -> TelemetrySnapshot {
        self.advance_cycle();

        let state = &mut self.state;
        let mut conditions = if self.meeting_active {
            Conditions {
                temperature: state.add_noise(23.5, 5.0),
                humidity: state.add_noise(55.0, 8.0),
                co2: state.add_noise(1200.0, 15.0),
                light_lux: state.randint(400, 600),
                occupancy: state.randint(6, 12),
                motion: true,
                energy: state.add_noise(1.5, 20.0),
                air_quality: 0,
            }
        } else {
            Conditions {
                temperature: state.add_noise(21.0, 3.0),
                humidity: state.add_noise(45.0, 5.0),
                co2: state.add_noise(500.0, 10.0),
                light_lux: state.randint(0, 100),
                occupancy: 0,
                motion: state.chance(0.1),
                energy: state.add_noise(0.3, 15.0),
                air_quality: 0,
            }
        };
        conditions.air_quality = aqi_from_co2(conditions.co2, 20.0, 50);

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

    fn room() -> ConferenceRoom {
        ConferenceRoom::new(RoomState::new(
            StdRng::seed_from_u64(2),
            Arc::new(FixedClock::at_hour(12)),
            0.5,
        ))
    }

    #[test]
    fn test_meeting_active_at() {
        assert!(meeting_active_at(0.0));
        assert!(meeting_active_at(899.5));
        assert!(!meeting_active_at(900.0));
        assert!(!meeting_active_at(3599.5));
        assert!(meeting_active_at(3600.0));
        assert!(meeting_active_at(7200.0 + 100.0));
    }

    #[test]
    fn test_first_snapshot_is_in_meeting() {
        let mut room = room();
        let snapshot = room.get_telemetry();
        assert!(room.meeting_active());
        assert!(snapshot.motion_detected);
        assert!((6..=12).contains(&snapshot.occupancy_count));
    }

    #[test]
    fn test_timer_wraps_after_cycle() {
        let mut room = room();
        for _ in 0..7_200 {
            room.get_telemetry();
        }
        assert_eq!(room.meeting_timer_s(), 0.0);
        assert!(room.meeting_active());
    }
}
