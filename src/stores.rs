//! Protocol-facing value stores.
//!
//! Both tables are built once from the sensor bindings and never change shape
//! afterwards, so the address map itself is read without locking. Each entry
//! carries its own sensor lock and its own cached sample: a refresh pass locks
//! one entry at a time and readers only ever wait on the entry they asked for.

use crate::error::{ConfigError, UpdateError};
use crate::scheduler::{PassReport, PeriodicTask};
use crate::sensors::Sensor;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use tracing::{debug, error};

pub const BACNET_DEVICE_INSTANCE: u32 = 47808;
pub const BACNET_VENDOR_ID: u16 = 999;
pub const BACNET_DEVICE_NAME: &str = "SensorSimulator";
pub const BACNET_UNITS: &str = "noUnits";

/// Size of the holding register block; valid addresses are `0..HOLDING_REGISTER_COUNT`.
pub const HOLDING_REGISTER_COUNT: u16 = 1000;
pub const REGISTER_SCALE: f64 = 100.0;

/// Fixed-point register encoding: `round(value × 100)`.
pub fn encode_register(value: f64) -> i32 {
    (value * REGISTER_SCALE).round() as i32
}

pub fn decode_register(raw: i32) -> f64 {
    f64::from(raw) / REGISTER_SCALE
}

/// One cached value together with the pass that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample<V> {
    pub value: V,
    /// Latest refresh pass that wrote this entry; 0 means construction time.
    pub tick: u64,
    pub updated_at: DateTime<Utc>,
    /// Set while the most recent refresh of this entry failed.
    pub fault: bool,
}

struct Entry<V> {
    sensor_id: String,
    sensor: Mutex<Box<dyn Sensor>>,
    cached: RwLock<Sample<V>>,
}

impl<V: Copy> Entry<V> {
    fn new(sensor: Box<dyn Sensor>, initial: V) -> Self {
        Self {
            sensor_id: sensor.sensor_id().to_string(),
            sensor: Mutex::new(sensor),
            cached: RwLock::new(Sample {
                value: initial,
                tick: 0,
                updated_at: Utc::now(),
                fault: false,
            }),
        }
    }

    fn sample(&self) -> Sample<V> {
        *self.cached.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh(&self, tick: u64, encode: impl Fn(f64) -> V) -> Result<(), UpdateError> {
        // The sensor guard is held until the cache is written, so overlapping
        // passes publish readings in the order they were taken.
        let mut sensor = self.sensor.lock().unwrap_or_else(PoisonError::into_inner);
        let reading = panic::catch_unwind(AssertUnwindSafe(|| sensor.get_value()));

        let mut cached = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        match reading {
            Ok(value) => {
                *cached = Sample {
                    value: encode(value),
                    tick: tick.max(cached.tick),
                    updated_at: Utc::now(),
                    fault: false,
                };
                Ok(())
            }
            Err(payload) => {
                // Keep the last good value, only flag the fault
                cached.fault = true;
                Err(UpdateError::SensorPanicked {
                    sensor_id: self.sensor_id.clone(),
                    message: panic_message(payload.as_ref()),
                })
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Address-indexed entries shared by both protocol tables.
struct BoundTable<K, V> {
    protocol: &'static str,
    entries: HashMap<K, Entry<V>>,
    ticks: AtomicU64,
}

impl<K, V> BoundTable<K, V>
where
    K: Copy + Eq + Hash + Ord + Display,
    V: Copy,
{
    fn new(protocol: &'static str) -> Self {
        Self {
            protocol,
            entries: HashMap::new(),
            ticks: AtomicU64::new(0),
        }
    }

    fn get(&self, address: K) -> Option<Sample<V>> {
        self.entries.get(&address).map(Entry::sample)
    }

    fn addresses(&self) -> Vec<K> {
        let mut addresses: Vec<K> = self.entries.keys().copied().collect();
        addresses.sort_unstable();
        addresses
    }

    fn sensor_id(&self, address: K) -> Option<&str> {
        self.entries.get(&address).map(|entry| entry.sensor_id.as_str())
    }

    fn refresh_with(&self, encode: impl Fn(f64) -> V + Copy) -> PassReport {
        let tick = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;
        let mut report = PassReport::default();

        for (address, entry) in &self.entries {
            match entry.refresh(tick, encode) {
                Ok(()) => report.refreshed += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(
                        protocol = self.protocol,
                        address = %address,
                        sensor_id = %entry.sensor_id,
                        error = %e,
                        "entry refresh failed, keeping last value"
                    );
                }
            }
        }

        debug!(protocol = self.protocol, tick, refreshed = report.refreshed, failed = report.failed, "refresh pass complete");
        report
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusFlags {
    pub in_alarm: bool,
    pub fault: bool,
    pub overridden: bool,
    pub out_of_service: bool,
}

/// Full view of a BACnet-style analog value object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalogValueObject {
    pub object_id: u32,
    pub object_name: String,
    pub present_value: f64,
    pub units: &'static str,
    pub status_flags: StatusFlags,
    pub out_of_service: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub instance: u32,
    pub name: &'static str,
    pub vendor_id: u16,
    pub object_count: usize,
}

/// BACnet-style object table keyed by analog value object id.
pub struct ObjectTable {
    table: BoundTable<u32, f64>,
}

impl ObjectTable {
    /// Build the table and prime every object with one reading. An object
    /// whose priming read panics starts at 0.0 with its fault flag set.
    pub fn new(bindings: impl IntoIterator<Item = (u32, Box<dyn Sensor>)>) -> Result<Self, ConfigError> {
        let mut table = BoundTable::new("bacnet");
        for (object_id, sensor) in bindings {
            if table.entries.contains_key(&object_id) {
                return Err(ConfigError::DuplicateObjectId {
                    sensor_id: sensor.sensor_id().to_string(),
                    object_id,
                });
            }
            let entry = Entry::new(sensor, 0.0);
            if let Err(e) = entry.refresh(0, |value| value) {
                error!(protocol = "bacnet", address = object_id, error = %e, "priming read failed");
            }
            table.entries.insert(object_id, entry);
        }
        Ok(Self { table })
    }

    /// Present value of `object_id`, `None` when nothing is bound there.
    pub fn read(&self, object_id: u32) -> Option<f64> {
        self.table.get(object_id).map(|sample| sample.value)
    }

    pub fn read_sample(&self, object_id: u32) -> Option<Sample<f64>> {
        self.table.get(object_id)
    }

    pub fn read_object(&self, object_id: u32) -> Option<AnalogValueObject> {
        let sample = self.table.get(object_id)?;
        Some(AnalogValueObject {
            object_id,
            object_name: format!("sensor_{object_id}"),
            present_value: sample.value,
            units: BACNET_UNITS,
            status_flags: StatusFlags {
                fault: sample.fault,
                ..StatusFlags::default()
            },
            out_of_service: false,
            updated_at: sample.updated_at,
        })
    }

    /// Read every bound sensor once and store the new present values.
    pub fn refresh(&self) -> PassReport {
        self.table.refresh_with(|value| value)
    }

    pub fn device(&self) -> DeviceInfo {
        DeviceInfo {
            instance: BACNET_DEVICE_INSTANCE,
            name: BACNET_DEVICE_NAME,
            vendor_id: BACNET_VENDOR_ID,
            object_count: self.len(),
        }
    }

    pub fn object_ids(&self) -> Vec<u32> {
        self.table.addresses()
    }

    pub fn sensor_id(&self, object_id: u32) -> Option<&str> {
        self.table.sensor_id(object_id)
    }

    pub fn len(&self) -> usize {
        self.table.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.entries.is_empty()
    }
}

impl PeriodicTask for ObjectTable {
    fn name(&self) -> &'static str {
        "bacnet"
    }

    fn run_pass(&self) -> PassReport {
        self.refresh()
    }
}

impl std::fmt::Debug for ObjectTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectTable")
            .field("objects", &self.object_ids())
            .finish()
    }
}

/// Modbus-style holding register table keyed by register address.
pub struct RegisterTable {
    table: BoundTable<u16, i32>,
}

impl RegisterTable {
    /// Build the table. Registers hold 0 until the first refresh.
    pub fn new(bindings: impl IntoIterator<Item = (u16, Box<dyn Sensor>)>) -> Result<Self, ConfigError> {
        let mut table = BoundTable::new("modbus");
        for (register, sensor) in bindings {
            if register >= HOLDING_REGISTER_COUNT {
                return Err(ConfigError::RegisterOutOfRange {
                    sensor_id: sensor.sensor_id().to_string(),
                    register,
                    limit: HOLDING_REGISTER_COUNT,
                });
            }
            if table.entries.contains_key(&register) {
                return Err(ConfigError::DuplicateRegister {
                    sensor_id: sensor.sensor_id().to_string(),
                    register,
                });
            }
            table.entries.insert(register, Entry::new(sensor, 0));
        }
        Ok(Self { table })
    }

    /// Scaled register contents, `None` when nothing is bound there.
    pub fn read(&self, register: u16) -> Option<i32> {
        self.table.get(register).map(|sample| sample.value)
    }

    pub fn read_sample(&self, register: u16) -> Option<Sample<i32>> {
        self.table.get(register)
    }

    /// Register contents decoded back to engineering units.
    pub fn read_value(&self, register: u16) -> Option<f64> {
        self.read(register).map(decode_register)
    }

    /// Read every bound sensor once and store the scaled values.
    pub fn refresh(&self) -> PassReport {
        self.table.refresh_with(encode_register)
    }

    pub fn registers(&self) -> Vec<u16> {
        self.table.addresses()
    }

    pub fn sensor_id(&self, register: u16) -> Option<&str> {
        self.table.sensor_id(register)
    }

    pub fn len(&self) -> usize {
        self.table.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.entries.is_empty()
    }
}

impl PeriodicTask for RegisterTable {
    fn name(&self) -> &'static str {
        "modbus"
    }

    fn run_pass(&self) -> PassReport {
        self.refresh()
    }
}

impl std::fmt::Debug for RegisterTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterTable")
            .field("registers", &self.registers())
            .finish()
    }
}
