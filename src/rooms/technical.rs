use super::{Conditions, RoomInfo, RoomProfile, RoomState, RoomType};
use crate::telemetry::TelemetrySnapshot;

/// Cold, dry and dark with a steady high electrical load. Nobody works here.
#[derive(Debug)]
pub struct ServerRoom {
    info: RoomInfo,
    state: RoomState,
}

impl ServerRoom {
    pub fn new(state: RoomState) -> Self {
        Self {
            info: RoomInfo {
                room_id: "01",
                name: "Server Room",
                floor: 1,
                room_type: RoomType::Server,
            },
            state,
        }
    }
}

impl RoomProfile for ServerRoom {
    fn info(&self) -> &RoomInfo {
        &self.info
    }

    fn get_telemetry(&mut self) -> TelemetrySnapshot {
        let conditions = Conditions {
            temperature: self.state.add_noise(19.0, 1.0),
            humidity: self.state.add_noise(35.0, 3.0),
            co2: self.state.add_noise(450.0, 5.0),
            light_lux: 0,
            occupancy: 0,
            motion: false,
            energy: self.state.add_noise(2.3, 8.0),
            air_quality: self.state.randint(90, 100) as u8,
        };
        self.state.snapshot(&self.info, conditions)
    }
}

#[derive(Debug)]
pub struct StorageCloset {
    info: RoomInfo,
    state: RoomState,
}

impl StorageCloset {
    pub fn new(state: RoomState) -> Self {
        Self {
            info: RoomInfo {
                room_id: "03",
                name: "Storage Closet",
                floor: 1,
                room_type: RoomType::Storage,
            },
            state,
        }
    }
}

impl RoomProfile for StorageCloset {
    fn info(&self) -> &RoomInfo {
        &self.info
    }

    fn get_telemetry(&mut self) -> TelemetrySnapshot {
        let conditions = Conditions {
            temperature: self.state.add_noise(20.5, 1.0),
            humidity: self.state.add_noise(50.0, 2.0),
            co2: self.state.add_noise(400.0, 3.0),
            light_lux: 0,
            occupancy: 0,
            motion: false,
            energy: self.state.add_noise(0.05, 10.0),
            air_quality: self.state.randint(85, 95) as u8,
        };
        self.state.snapshot(&self.info, conditions)
    }
}
