use crate::clock::Clock;
use crate::config::{ProtocolAddress, SensorBinding, SimulatorConfig};
use crate::error::ConfigError;
use crate::rooms::all_room_profiles;
use crate::scheduler::{run_periodic, Cadence, LoopStats, Shutdown};
use crate::sensors::{create_sensor, Sensor, SensorType};
use crate::stores::{ObjectTable, RegisterTable};
use crate::stream_rng;
use crate::telemetry::{PublisherStats, RoomPublisher, TelemetryMessage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Final counters returned when [`BuildingSimulator::run`] exits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub bacnet: LoopStats,
    pub modbus: LoopStats,
    pub telemetry: LoopStats,
    pub publisher: PublisherStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorSummary {
    pub sensor_id: String,
    pub sensor_type: SensorType,
    pub room_id: String,
    pub address: Option<String>,
}

/// Owns every sensor, both protocol stores and the room publisher.
pub struct BuildingSimulator {
    objects: Arc<ObjectTable>,
    registers: Arc<RegisterTable>,
    publisher: Arc<RoomPublisher>,
    unbound: Vec<Box<dyn Sensor>>,
    inventory: Vec<SensorSummary>,
    protocol_cadence: Cadence,
    telemetry_cadence: Cadence,
}

impl BuildingSimulator {
    /// Build sensors, stores and rooms. Any binding problem fails here, before
    /// a single loop is started.
    pub fn from_config(config: &SimulatorConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        let settings = &config.simulator;
        let bindings = config.bindings()?;

        let mut bacnet = Vec::new();
        let mut modbus = Vec::new();
        let mut unbound = Vec::new();
        let mut inventory = Vec::with_capacity(bindings.len());

        for (index, binding) in bindings.iter().enumerate() {
            let sensor = build_sensor(binding, stream_rng(settings.seed, index as u64));
            inventory.push(SensorSummary {
                sensor_id: binding.sensor_id.clone(),
                sensor_type: binding.sensor_type,
                room_id: binding.room_id.clone(),
                address: binding.address.map(|address| match address {
                    ProtocolAddress::Bacnet { object_id } => format!("bacnet:{object_id}"),
                    ProtocolAddress::Modbus { register } => format!("modbus:{register}"),
                }),
            });

            match binding.address {
                Some(ProtocolAddress::Bacnet { object_id }) => bacnet.push((object_id, sensor)),
                Some(ProtocolAddress::Modbus { register }) => modbus.push((register, sensor)),
                None => unbound.push(sensor),
            }
        }

        let objects = ObjectTable::new(bacnet)?;
        let registers = RegisterTable::new(modbus)?;
        let rooms = all_room_profiles(clock, config.logical_step_s(), settings.seed);
        let publisher = RoomPublisher::new(rooms, &settings.topic_prefix);

        let backoff = Duration::from_millis(settings.error_backoff_ms);
        Ok(Self {
            objects: Arc::new(objects),
            registers: Arc::new(registers),
            publisher: Arc::new(publisher),
            unbound,
            inventory,
            protocol_cadence: Cadence::new(Duration::from_millis(settings.protocol_refresh_ms), backoff),
            telemetry_cadence: Cadence::new(Duration::from_millis(settings.publish_interval_ms), backoff),
        })
    }

    pub fn objects(&self) -> &Arc<ObjectTable> {
        &self.objects
    }

    pub fn registers(&self) -> &Arc<RegisterTable> {
        &self.registers
    }

    pub fn publisher(&self) -> &Arc<RoomPublisher> {
        &self.publisher
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TelemetryMessage> {
        self.publisher.subscribe()
    }

    pub fn inventory(&self) -> &[SensorSummary] {
        &self.inventory
    }

    /// Sensors constructed from config but bound to neither store.
    pub fn unbound_sensors(&self) -> impl Iterator<Item = &dyn Sensor> + '_ {
        self.unbound.iter().map(|sensor| sensor.as_ref())
    }

    pub fn log_inventory(&self) {
        for room in self.publisher.rooms() {
            info!(room_id = room.room_id, name = room.name, floor = room.floor, "room profile ready");
        }
        for sensor in &self.inventory {
            info!(
                sensor_id = %sensor.sensor_id,
                sensor_type = %sensor.sensor_type,
                room_id = %sensor.room_id,
                address = sensor.address.as_deref().unwrap_or("unbound"),
                "sensor ready"
            );
        }
        let device = self.objects.device();
        info!(
            device_instance = device.instance,
            objects = self.objects.len(),
            registers = self.registers.len(),
            unbound = self.unbound.len(),
            "protocol stores ready"
        );
    }

    /// Run the BACnet refresh, Modbus refresh and telemetry loops until
    /// `shutdown` fires, then return the statistics of all three.
    pub async fn run(&self, shutdown: Shutdown) -> SimulationStats {
        self.log_inventory();

        let bacnet = tokio::spawn(run_periodic(
            Arc::clone(&self.objects),
            self.protocol_cadence,
            shutdown.clone(),
        ));
        let modbus = tokio::spawn(run_periodic(
            Arc::clone(&self.registers),
            self.protocol_cadence,
            shutdown.clone(),
        ));
        let telemetry = tokio::spawn(run_periodic(
            Arc::clone(&self.publisher),
            self.telemetry_cadence,
            shutdown,
        ));

        let (bacnet, modbus, telemetry) = tokio::join!(bacnet, modbus, telemetry);
        let stats = SimulationStats {
            bacnet: join_stats("bacnet", bacnet),
            modbus: join_stats("modbus", modbus),
            telemetry: join_stats("telemetry", telemetry),
            publisher: self.publisher.stats(),
        };

        info!(
            total_messages = stats.publisher.total_messages,
            dropped = stats.publisher.dropped_messages,
            elapsed_s = stats.publisher.elapsed_s,
            average_rate = stats.publisher.average_rate,
            "telemetry statistics"
        );
        stats
    }
}

fn build_sensor(binding: &SensorBinding, rng: rand::rngs::StdRng) -> Box<dyn Sensor> {
    create_sensor(binding.sensor_type, &binding.sensor_id, &binding.room_id, rng)
}

fn join_stats(task: &str, result: Result<LoopStats, tokio::task::JoinError>) -> LoopStats {
    result.unwrap_or_else(|e| {
        error!(task, error = %e, "refresh loop terminated abnormally");
        LoopStats::default()
    })
}

impl std::fmt::Debug for BuildingSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildingSimulator")
            .field("objects", &self.objects)
            .field("registers", &self.registers)
            .field("publisher", &self.publisher)
            .field("unbound", &self.unbound.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::scheduler::shutdown_channel;

    fn simulator(config: &SimulatorConfig) -> BuildingSimulator {
        BuildingSimulator::from_config(config, Arc::new(FixedClock::at_hour(11))).unwrap()
    }

    #[test]
    fn test_reference_layout() {
        let mut config = SimulatorConfig::default();
        config.simulator.seed = Some(5);
        let simulator = simulator(&config);

        assert_eq!(simulator.objects().object_ids(), (1..=8).collect::<Vec<u32>>());
        assert_eq!(simulator.registers().registers(), (0..8).collect::<Vec<u16>>());
        assert_eq!(simulator.publisher().rooms().len(), 8);
        assert_eq!(simulator.inventory().len(), 16);
        assert_eq!(simulator.unbound_sensors().count(), 0);
    }

    #[test]
    fn test_sensor_without_protocol_is_unbound() {
        let config = SimulatorConfig::from_toml_str(
            r#"
            [[sensors]]
            id = "spare-light"
            type = "light"
            "#,
        )
        .unwrap();
        let simulator = simulator(&config);
        assert!(simulator.objects().is_empty());
        assert!(simulator.registers().is_empty());

        let unbound: Vec<_> = simulator.unbound_sensors().map(|s| s.sensor_id().to_string()).collect();
        assert_eq!(unbound, ["spare-light"]);
        assert_eq!(simulator.inventory()[0].room_id, "00");
    }

    #[test]
    fn test_duplicate_register_fails_startup() {
        let config = SimulatorConfig::from_toml_str(
            r#"
            [[sensors]]
            id = "a"
            type = "light"
            protocol = "modbus"
            register = 4

            [[sensors]]
            id = "b"
            type = "energy"
            protocol = "modbus"
            register = 4
            "#,
        )
        .unwrap();
        let err = BuildingSimulator::from_config(&config, Arc::new(FixedClock::at_hour(11))).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRegister { register: 4, .. }));
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let mut config = SimulatorConfig::default();
        config.simulator.seed = Some(9);
        config.simulator.protocol_refresh_ms = 10;
        config.simulator.publish_interval_ms = 20;
        let simulator = simulator(&config);
        let mut rx = simulator.subscribe();

        let (trigger, shutdown) = shutdown_channel();
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            trigger.trigger();
        });

        let stats = simulator.run(shutdown).await;
        stopper.await.unwrap();

        assert!(stats.bacnet.passes >= 2);
        assert!(stats.modbus.passes >= 2);
        assert!(stats.telemetry.passes >= 1);
        assert_eq!(stats.bacnet.failed_entries, 0);
        assert!(stats.publisher.total_messages >= 8);
        assert!(rx.try_recv().is_ok());
    }
}
