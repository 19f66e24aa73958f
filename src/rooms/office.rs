use super::{aqi_from_co2, Conditions, RoomInfo, RoomProfile, RoomState, RoomType};
use crate::telemetry::TelemetrySnapshot;

const OFFICE_TEMP_PERIOD_MIN: f64 = 120.0;

/// Open-plan office, busy during work hours with a slow temperature swing.
#[derive(Debug)]
pub struct OpenOffice {
    info: RoomInfo,
    state: RoomState,
}

impl OpenOffice {
    pub fn new(state: RoomState) -> Self {
        Self {
            info: RoomInfo {
                room_id: "04",
                name: "Open Office",
                floor: 2,
                room_type: RoomType::Office,
            },
            state,
        }
    }
}

impl RoomProfile for OpenOffice {
    fn info(&self) -> &RoomInfo {
        &self.info
    }

    fn get_telemetry(&mut self) -> TelemetrySnapshot {
        let state = &mut self.state;
        let mut conditions = if state.is_work_hours() {
            Conditions {
                temperature: state.time_based_pattern(22.0, 1.5, OFFICE_TEMP_PERIOD_MIN),
                humidity: state.add_noise(48.0, 5.0),
                co2: state.add_noise(800.0, 12.0),
                light_lux: state.randint(350, 500),
                occupancy: state.randint(5, 8),
                motion: true,
                energy: state.add_noise(1.2, 10.0),
                air_quality: 0,
            }
        } else {
            Conditions {
                temperature: state.add_noise(20.0, 2.0),
                humidity: state.add_noise(45.0, 3.0),
                co2: state.add_noise(450.0, 8.0),
                light_lux: state.randint(0, 50),
                occupancy: 0,
                motion: state.chance(0.05),
                energy: state.add_noise(0.4, 10.0),
                air_quality: 0,
            }
        };
        conditions.air_quality = aqi_from_co2(conditions.co2, 15.0, 60);

        self.state.snapshot(&self.info, conditions)
    }
}

/// Tightly controlled single-occupant office.
#[derive(Debug)]
pub struct ExecutiveOffice {
    info: RoomInfo,
    state: RoomState,
}

impl ExecutiveOffice {
    pub fn new(state: RoomState) -> Self {
        Self {
            info: RoomInfo {
                room_id: "08",
                name: "Executive Office",
                floor: 3,
                room_type: RoomType::Executive,
            },
            state,
        }
    }
}

impl RoomProfile for ExecutiveOffice {
    fn info(&self) -> &RoomInfo {
        &self.info
    }

    fn get_telemetry(&mut self) -> TelemetrySnapshot {
        let state = &mut self.state;
        let occupied = state.is_work_hours();

        let conditions = Conditions {
            temperature: state.add_noise(21.0, 1.0),
            humidity: state.add_noise(45.0, 2.0),
            co2: state.add_noise(if occupied { 650.0 } else { 420.0 }, 5.0),
            light_lux: if occupied { state.randint(400, 450) } else { 0 },
            occupancy: u32::from(occupied),
            motion: occupied,
            energy: state.add_noise(if occupied { 0.7 } else { 0.2 }, 8.0),
            air_quality: state.randint(85, 98) as u8,
        };

        self.state.snapshot(&self.info, conditions)
    }
}
