//! # Building Sensor Simulator
//!
//! Synthetic sensor data for a small smart building, exposed the way real
//! building equipment would expose it.
//!
//! ## Features
//!
//! - **Sensor models**: Temperature, humidity, CO2, air quality, light, energy, motion, occupancy
//! - **Room profiles**: Eight rooms with coupled, scenario-driven telemetry
//! - **Protocol stores**: BACnet-style object table and Modbus-style holding registers
//! - **Telemetry publishing**: Per-room JSON snapshots on `{prefix}/{room_id}` topics
//! - **Independent cadences**: 10 Hz protocol refresh, 2 Hz room telemetry
//!
//! ## Quick Start
//!
//! ```rust
//! use building_sim::{BuildingSimulator, SimulatorConfig, SystemClock};
//! use std::sync::Arc;
//!
//! let simulator = BuildingSimulator::from_config(&SimulatorConfig::default(), Arc::new(SystemClock)).unwrap();
//!
//! // Temperature sensor bound to BACnet object 1 in the reference layout
//! let temperature = simulator.objects().read(1).unwrap();
//! assert!((18.0..=28.0).contains(&temperature));
//! ```
//!
//! ## Architecture
//!
//! - [`sensors`] - Single-quantity stateful generators
//! - [`rooms`] - Per-room composite profiles
//! - [`stores`] - Protocol value tables
//! - [`telemetry`] - Snapshot publishing
//! - [`scheduler`] - Periodic refresh loops and cancellation
//! - [`simulator`] - Wiring and lifecycle

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod clock;
pub mod config;
pub mod error;
pub mod rooms;
pub mod scheduler;
pub mod sensors;
pub mod simulator;
pub mod stores;
pub mod telemetry;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::SimulatorConfig;
pub use error::{ConfigError, PublishError, UpdateError};
pub use scheduler::{shutdown_channel, Shutdown, ShutdownTrigger};
pub use simulator::{BuildingSimulator, SimulationStats};
pub use stores::{ObjectTable, RegisterTable};
pub use telemetry::{RoomPublisher, TelemetryMessage, TelemetrySnapshot};

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Set on room stream numbers so they never meet a sensor binding index.
pub const ROOM_STREAM_TAG: u64 = 1 << 63;

/// Independent random stream `stream` derived from an optional base seed.
///
/// With a seed every stream is reproducible; without one each stream is
/// seeded from OS entropy.
pub fn stream_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        None => StdRng::from_entropy(),
    }
}
