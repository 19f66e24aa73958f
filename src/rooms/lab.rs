use super::{Conditions, RoomInfo, RoomProfile, RoomState, RoomType};
use crate::telemetry::TelemetrySnapshot;

const POOR_AIR_PROBABILITY: f64 = 0.1;

/// Erratic workshop. Every snapshot is drawn independently with wide variance.
#[derive(Debug)]
pub struct LabWorkshop {
    info: RoomInfo,
    state: RoomState,
}

impl LabWorkshop {
    pub fn new(state: RoomState) -> Self {
        Self {
            info: RoomInfo {
                room_id: "06",
                name: "Lab Workshop",
                floor: 1,
                room_type: RoomType::Lab,
            },
            state,
        }
    }
}

impl RoomProfile for LabWorkshop {
    fn info(&self) -> &RoomInfo {
        &self.info
    }

    fn get_telemetry(&mut self) -> TelemetrySnapshot {
        let state = &mut self.state;
        let temperature = state.add_noise(22.0, 15.0);
        let humidity = state.add_noise(45.0, 20.0);
        let co2 = state.add_noise(900.0, 30.0);
        let light_lux = state.randint(200, 700);
        let occupancy = state.randint(0, 4);
        let motion = state.chance(0.6);
        let energy = state.add_noise(1.8, 40.0);

        let air_quality: u32 = if state.chance(POOR_AIR_PROBABILITY) {
            state.randint(30, 50)
        } else {
            state.randint(55, 75)
        };

        let conditions = Conditions {
            temperature,
            humidity,
            co2,
            light_lux,
            occupancy,
            motion,
            energy,
            air_quality: air_quality as u8,
        };
        self.state.snapshot(&self.info, conditions)
    }
}
