use building_sim::sensors::electrical::LIGHT_TOGGLE_PROBABILITY;
use building_sim::sensors::presence::MOTION_TOGGLE_PROBABILITY;
use building_sim::sensors::{
    create_sensor, create_sensor_from_tag, Co2Sensor, LightSensor, MotionSensor, Sensor, SensorCore, SensorType,
};
use building_sim::ConfigError;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const STATISTICAL_CALLS: usize = 100_000;

fn core(seed: u64) -> SensorCore {
    SensorCore::new("sensor-under-test", "01", StdRng::seed_from_u64(seed))
}

#[cfg(test)]
mod range_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn readings_stay_in_clamp_range(seed in any::<u64>(), type_index in 0usize..8) {
            let sensor_type = SensorType::ALL[type_index];
            let range = sensor_type.range();
            let mut sensor = create_sensor(sensor_type, "prop", "01", StdRng::seed_from_u64(seed));

            for _ in 0..10_000 {
                let value = sensor.get_value();
                prop_assert!(range.contains(&value), "{} produced {}", sensor_type, value);
            }
        }
    }

    #[test]
    fn test_every_type_in_range_for_long_sequence() {
        for (i, sensor_type) in SensorType::ALL.into_iter().enumerate() {
            let range = sensor_type.range();
            let mut sensor = create_sensor(sensor_type, "long", "01", StdRng::seed_from_u64(i as u64));
            for _ in 0..50_000 {
                assert!(range.contains(&sensor.get_value()));
            }
        }
    }
}

#[cfg(test)]
mod behaviour_tests {
    use super::*;

    #[test]
    fn test_energy_is_non_decreasing() {
        let mut sensor = create_sensor(SensorType::Energy, "energy-01", "01", StdRng::seed_from_u64(4));
        let mut previous = sensor.get_value();
        for _ in 0..10_000 {
            let value = sensor.get_value();
            assert!(value >= previous, "energy went from {previous} to {value}");
            previous = value;
        }
    }

    #[test]
    fn test_motion_toggle_frequency() {
        let mut sensor = MotionSensor::new(core(11));
        let mut previous = sensor.motion_detected();
        let mut toggles = 0usize;

        for _ in 0..STATISTICAL_CALLS {
            let value = sensor.read();
            let detected = value == 1.0;
            assert_eq!(detected, sensor.motion_detected());
            if detected != previous {
                toggles += 1;
            }
            previous = detected;
        }

        let frequency = toggles as f64 / STATISTICAL_CALLS as f64;
        assert!(
            (frequency - MOTION_TOGGLE_PROBABILITY).abs() < 0.01,
            "motion toggled with frequency {frequency}"
        );
    }

    #[test]
    fn test_light_toggle_frequency() {
        let mut sensor = LightSensor::new(core(12));
        let mut previous = sensor.is_on();
        let mut toggles = 0usize;

        for _ in 0..STATISTICAL_CALLS {
            sensor.read();
            if sensor.is_on() != previous {
                toggles += 1;
            }
            previous = sensor.is_on();
        }

        let frequency = toggles as f64 / STATISTICAL_CALLS as f64;
        assert!(
            (frequency - LIGHT_TOGGLE_PROBABILITY).abs() < 0.005,
            "light toggled with frequency {frequency}"
        );
    }

    #[test]
    fn test_light_levels_follow_state() {
        let mut sensor = LightSensor::new(core(13));
        for _ in 0..5_000 {
            let lux = sensor.read();
            if sensor.is_on() {
                assert!((300.0..=600.0).contains(&lux));
            } else {
                assert!((0.0..=50.0).contains(&lux));
            }
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = create_sensor(SensorType::Temperature, "a", "01", StdRng::seed_from_u64(99));
        let mut b = create_sensor(SensorType::Temperature, "b", "01", StdRng::seed_from_u64(99));
        for _ in 0..1_000 {
            assert_eq!(a.get_value(), b.get_value());
        }
    }

    #[test]
    fn test_co2_occupancy_hook_is_opt_in() {
        let mut sensor = Co2Sensor::new(core(14));
        assert_eq!(sensor.occupancy_multiplier(), 1.0);

        sensor.set_occupancy(10);
        assert!((sensor.occupancy_multiplier() - 2.0).abs() < 1e-12);
        for _ in 0..500 {
            sensor.read();
        }
        // Target is 900 ppm
        let value = sensor.read();
        assert!(value > 820.0 && value < 980.0, "co2 settled at {value}");
    }

    #[test]
    fn test_get_value_records_last_value() {
        let mut sensor = create_sensor(SensorType::Humidity, "hum-03", "03", StdRng::seed_from_u64(1));
        assert_eq!(sensor.last_value(), None);
        let value = sensor.get_value();
        assert_eq!(sensor.last_value(), Some(value));
        assert_eq!(sensor.sensor_id(), "hum-03");
        assert_eq!(sensor.room_id(), "03");
        assert_eq!(sensor.sensor_type(), SensorType::Humidity);
    }
}

#[cfg(test)]
mod factory_tests {
    use super::*;

    #[test]
    fn test_factory_builds_every_tag() {
        for sensor_type in SensorType::ALL {
            let sensor = create_sensor_from_tag(sensor_type.tag(), "s", "00", StdRng::seed_from_u64(0)).unwrap();
            assert_eq!(sensor.sensor_type(), sensor_type);
        }
    }

    #[test]
    fn test_factory_rejects_unknown_tag() {
        let err = create_sensor_from_tag("barometer", "baro-01", "00", StdRng::seed_from_u64(0)).unwrap_err();
        match err {
            ConfigError::UnknownSensorType { sensor_id, sensor_type } => {
                assert_eq!(sensor_id, "baro-01");
                assert_eq!(sensor_type, "barometer");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
