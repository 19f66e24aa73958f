use building_sim::clock::FixedClock;
use building_sim::rooms::meeting::{MEETING_CYCLE_S, MEETING_DURATION_S};
use building_sim::rooms::{
    all_room_profiles, BreakRoom, ConferenceRoom, ExecutiveOffice, Kitchen, LabWorkshop, OpenOffice, RoomProfile,
    RoomState, RoomType, ServerRoom, StorageCloset, DEFAULT_LOGICAL_STEP_S,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

fn state(seed: u64, hour: u32) -> RoomState {
    RoomState::new(StdRng::seed_from_u64(seed), Arc::new(FixedClock::at_hour(hour)), DEFAULT_LOGICAL_STEP_S)
}

#[cfg(test)]
mod conference_room_tests {
    use super::*;

    #[test]
    fn test_regime_matches_logical_time_over_two_cycles() {
        let mut room = ConferenceRoom::new(state(1, 12));
        let calls = (2.0 * MEETING_CYCLE_S / DEFAULT_LOGICAL_STEP_S) as usize;

        for call in 1..=calls {
            let snapshot = room.get_telemetry();
            let t = call as f64 * DEFAULT_LOGICAL_STEP_S;
            let expected = t.rem_euclid(MEETING_CYCLE_S) < MEETING_DURATION_S;

            assert_eq!(room.meeting_active(), expected, "t = {t}");
            assert!((room.meeting_timer_s() - t.rem_euclid(MEETING_CYCLE_S)).abs() < 1e-9);
            if expected {
                assert!(snapshot.motion_detected);
                assert!((6..=12).contains(&snapshot.occupancy_count));
                assert!(snapshot.air_quality_index >= 50);
            } else {
                assert_eq!(snapshot.occupancy_count, 0);
                assert!(snapshot.light_lux <= 100);
            }
        }
    }

    #[test]
    fn test_regime_independent_of_wall_clock_hour() {
        let mut night = ConferenceRoom::new(state(2, 2));
        let mut day = ConferenceRoom::new(state(3, 14));
        for _ in 0..3_000 {
            night.get_telemetry();
            day.get_telemetry();
            assert_eq!(night.meeting_active(), day.meeting_active());
        }
    }
}

#[cfg(test)]
mod office_tests {
    use super::*;

    #[test]
    fn test_open_office_work_hours() {
        let mut room = OpenOffice::new(state(4, 10));
        for _ in 0..1_000 {
            let snapshot = room.get_telemetry();
            assert!((5..=8).contains(&snapshot.occupancy_count));
            assert!((350..=500).contains(&snapshot.light_lux));
            assert!(snapshot.motion_detected);
            assert!((20.5..=23.5).contains(&snapshot.temperature));
            assert!(snapshot.air_quality_index >= 60);
        }
    }

    #[test]
    fn test_open_office_after_hours() {
        let mut room = OpenOffice::new(state(5, 22));
        for _ in 0..1_000 {
            let snapshot = room.get_telemetry();
            assert_eq!(snapshot.occupancy_count, 0);
            assert!(snapshot.light_lux <= 50);
            assert!((19.6..=20.4).contains(&snapshot.temperature));
        }
    }

    #[test]
    fn test_executive_office_follows_hour() {
        let mut occupied = ExecutiveOffice::new(state(6, 9));
        let mut vacant = ExecutiveOffice::new(state(7, 18));

        for _ in 0..500 {
            let day = occupied.get_telemetry();
            assert_eq!(day.occupancy_count, 1);
            assert!(day.motion_detected);
            assert!((400..=450).contains(&day.light_lux));
            assert!((617..=683).contains(&day.co2_ppm));

            let night = vacant.get_telemetry();
            assert_eq!(night.occupancy_count, 0);
            assert!(!night.motion_detected);
            assert_eq!(night.light_lux, 0);
            assert!((85..=98).contains(&night.air_quality_index));
        }
    }
}

#[cfg(test)]
mod other_room_tests {
    use super::*;

    #[test]
    fn test_server_room_is_unoccupied_and_dark() {
        let mut room = ServerRoom::new(state(8, 12));
        for _ in 0..1_000 {
            let snapshot = room.get_telemetry();
            assert_eq!(snapshot.light_lux, 0);
            assert_eq!(snapshot.occupancy_count, 0);
            assert!(!snapshot.motion_detected);
            assert!((90..=100).contains(&snapshot.air_quality_index));
            assert!((18.81..=19.19).contains(&snapshot.temperature));
        }
    }

    #[test]
    fn test_storage_closet_is_quiet() {
        let mut room = StorageCloset::new(state(9, 12));
        for _ in 0..1_000 {
            let snapshot = room.get_telemetry();
            assert!((85..=95).contains(&snapshot.air_quality_index));
            assert!((0.045..=0.055).contains(&snapshot.energy_kwh));
        }
    }

    #[test]
    fn test_kitchen_cooking_regime() {
        let mut kitchen = Kitchen::new(state(10, 12));
        kitchen.start_cooking(600);

        let snapshot = kitchen.get_telemetry();
        assert!(kitchen.cooking_active());
        assert!(snapshot.motion_detected);
        assert!((1..=3).contains(&snapshot.occupancy_count));
        assert!((25.2..=30.8).contains(&snapshot.temperature));
        assert!((kitchen.cooking_remaining_s() - 599.5).abs() < 1e-9);
    }

    #[test]
    fn test_kitchen_eventually_cooks() {
        let mut kitchen = Kitchen::new(state(11, 12));
        let cooked = (0..5_000).any(|_| {
            kitchen.get_telemetry();
            kitchen.cooking_active()
        });
        assert!(cooked);
    }

    #[test]
    fn test_break_room_use_is_consistent_within_snapshot() {
        let mut room = BreakRoom::new(state(12, 12));
        let mut in_use = 0;
        for _ in 0..4_000 {
            let snapshot = room.get_telemetry();
            if snapshot.motion_detected {
                in_use += 1;
                assert!((1..=3).contains(&snapshot.occupancy_count));
                assert!((250..=400).contains(&snapshot.light_lux));
            } else {
                assert_eq!(snapshot.occupancy_count, 0);
            }
        }
        // 25% use rate
        assert!((800..=1_200).contains(&in_use), "break room used {in_use} times");
    }

    #[test]
    fn test_lab_air_quality_bands() {
        let mut room = LabWorkshop::new(state(13, 12));
        let mut poor = 0;
        for _ in 0..5_000 {
            let aqi = room.get_telemetry().air_quality_index;
            assert!((30..=50).contains(&aqi) || (55..=75).contains(&aqi));
            if aqi <= 50 {
                poor += 1;
            }
        }
        assert!((300..=700).contains(&poor), "poor air {poor} times");
    }
}

#[cfg(test)]
mod profile_set_tests {
    use super::*;

    #[test]
    fn test_room_metadata() {
        let rooms = all_room_profiles(Arc::new(FixedClock::at_hour(10)), DEFAULT_LOGICAL_STEP_S, Some(1));
        let types: Vec<RoomType> = rooms.iter().map(|room| room.info().room_type).collect();
        assert_eq!(
            types,
            [
                RoomType::Server,
                RoomType::Conference,
                RoomType::Storage,
                RoomType::Office,
                RoomType::Kitchen,
                RoomType::Lab,
                RoomType::Breakroom,
                RoomType::Executive,
            ]
        );
        assert_eq!(rooms[7].info().floor, 3);
        assert_eq!(rooms[2].info().name, "Storage Closet");
    }

    #[test]
    fn test_snapshots_carry_room_id_and_clock_time() {
        let clock = FixedClock::at_hour(10);
        let now = building_sim::Clock::now(&clock);
        let mut rooms = all_room_profiles(Arc::new(clock), DEFAULT_LOGICAL_STEP_S, Some(2));
        for room in rooms.iter_mut() {
            let snapshot = room.get_telemetry();
            assert_eq!(snapshot.room_id, room.room_id());
            assert_eq!(snapshot.timestamp, now);
        }
    }

    #[test]
    fn test_seeded_profiles_are_reproducible() {
        let mut a = all_room_profiles(Arc::new(FixedClock::at_hour(15)), DEFAULT_LOGICAL_STEP_S, Some(77));
        let mut b = all_room_profiles(Arc::new(FixedClock::at_hour(15)), DEFAULT_LOGICAL_STEP_S, Some(77));
        for _ in 0..100 {
            for (x, y) in a.iter_mut().zip(b.iter_mut()) {
                assert_eq!(x.get_telemetry(), y.get_telemetry());
            }
        }
    }
}
