use crate::error::PublishError;
use crate::rooms::{RoomInfo, RoomProfile};
use crate::scheduler::{PassReport, PeriodicTask};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

pub const DEFAULT_TOPIC_PREFIX: &str = "telemetry";
pub const TELEMETRY_CHANNEL_CAPACITY: usize = 256;
const LOG_EVERY_N_MESSAGES: u64 = 100;

/// Flat per-room record sent once per room per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub room_id: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub co2_ppm: u32,
    pub light_lux: u32,
    pub occupancy_count: u32,
    pub motion_detected: bool,
    pub energy_kwh: f64,
    pub air_quality_index: u8,
}

/// Serialized snapshot ready for a pub/sub transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryMessage {
    pub topic: String,
    pub payload: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PublisherStats {
    pub total_messages: u64,
    pub dropped_messages: u64,
    pub failed_messages: u64,
    pub elapsed_s: f64,
    pub average_rate: f64,
}

/// Generates every room's snapshot each tick and hands it to subscribers.
pub struct RoomPublisher {
    rooms: Mutex<Vec<Box<dyn RoomProfile>>>,
    room_info: Vec<RoomInfo>,
    topic_prefix: String,
    sender: broadcast::Sender<TelemetryMessage>,
    message_count: AtomicU64,
    dropped_count: AtomicU64,
    failed_count: AtomicU64,
    started_at: Instant,
}

impl RoomPublisher {
    pub fn new(rooms: Vec<Box<dyn RoomProfile>>, topic_prefix: &str) -> Self {
        let (sender, _) = broadcast::channel(TELEMETRY_CHANNEL_CAPACITY);
        let room_info = rooms.iter().map(|room| room.info().clone()).collect();
        Self {
            rooms: Mutex::new(rooms),
            room_info,
            topic_prefix: topic_prefix.trim_end_matches('/').to_string(),
            sender,
            message_count: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            failed_count: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TelemetryMessage> {
        self.sender.subscribe()
    }

    pub fn rooms(&self) -> &[RoomInfo] {
        &self.room_info
    }

    pub fn topic_for(&self, room_id: &str) -> String {
        format!("{}/{}", self.topic_prefix, room_id)
    }

    pub fn encode(&self, snapshot: &TelemetrySnapshot) -> Result<TelemetryMessage, PublishError> {
        Ok(TelemetryMessage {
            topic: self.topic_for(&snapshot.room_id),
            payload: serde_json::to_string(snapshot)?,
        })
    }

    fn publish(&self, snapshot: &TelemetrySnapshot) -> Result<(), PublishError> {
        let message = self.encode(snapshot)?;
        let topic = message.topic.clone();
        self.sender
            .send(message)
            .map_err(|_| PublishError::NoSubscribers(topic))?;

        let count = self.message_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count % LOG_EVERY_N_MESSAGES == 0 {
            info!(messages = count, latest = %snapshot.room_id, "telemetry published");
        }
        Ok(())
    }

    /// Snapshot and publish every room once. One room failing does not stop the rest.
    pub fn publish_all(&self) -> PassReport {
        let mut rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
        let mut report = PassReport::default();

        for room in rooms.iter_mut() {
            let room_id = room.room_id();
            let snapshot = match panic::catch_unwind(AssertUnwindSafe(|| room.get_telemetry())) {
                Ok(snapshot) => snapshot,
                Err(_) => {
                    report.failed += 1;
                    self.failed_count.fetch_add(1, Ordering::Relaxed);
                    error!(room_id, "room profile panicked while generating telemetry");
                    continue;
                }
            };

            match self.publish(&snapshot) {
                Ok(()) => report.refreshed += 1,
                Err(PublishError::NoSubscribers(topic)) => {
                    // Nobody listening is not a fault of this room
                    report.refreshed += 1;
                    self.dropped_count.fetch_add(1, Ordering::Relaxed);
                    debug!(%topic, "no telemetry subscribers, message dropped");
                }
                Err(e) => {
                    report.failed += 1;
                    self.failed_count.fetch_add(1, Ordering::Relaxed);
                    error!(room_id, error = %e, "failed to publish telemetry");
                }
            }
        }

        report
    }

    pub fn stats(&self) -> PublisherStats {
        let total_messages = self.message_count.load(Ordering::Relaxed);
        let elapsed_s = self.started_at.elapsed().as_secs_f64();
        PublisherStats {
            total_messages,
            dropped_messages: self.dropped_count.load(Ordering::Relaxed),
            failed_messages: self.failed_count.load(Ordering::Relaxed),
            elapsed_s,
            average_rate: if elapsed_s > 0.0 {
                total_messages as f64 / elapsed_s
            } else {
                0.0
            },
        }
    }
}

impl PeriodicTask for RoomPublisher {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    fn run_pass(&self) -> PassReport {
        self.publish_all()
    }
}

impl std::fmt::Debug for RoomPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomPublisher")
            .field("rooms", &self.room_info.len())
            .field("topic_prefix", &self.topic_prefix)
            .finish_non_exhaustive()
    }
}
