//! Registry Store: the fixed-capacity table of monitored endpoints.
//!
//! One `tokio::sync::Mutex` guards the whole table and every operation,
//! read or write, goes through it with a bounded wait. Slots are kept in
//! insertion order; a name → slot index sits alongside for lookups and is
//! rebuilt whenever removal shifts later slots down.
//!
//! Status only moves to online/offline through `update_status`. The one
//! other writer is `begin_wake`, which marks an endpoint as waking.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

use lanwake_core::config::{DeviceConfig, MonitorConfig};
use lanwake_core::message::{DeviceEntry, DeviceSummary};
use lanwake_core::{DeviceStatus, EngineError, MacAddr};

use crate::observer::StatusObserver;
use crate::prober::ProbeOutcome;

/// Longest accepted endpoint name, in bytes.
pub const MAX_NAME_LEN: usize = 31;

// ── Schedule ──────────────────────────────────────────────────────────────────

/// Per-endpoint probe schedule. Zero means "not set".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub interval_ms: u32,
    #[serde(default)]
    pub timeout_ms: u32,
    #[serde(default)]
    pub probe_count: u32,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            timeout_ms: 3000,
            probe_count: 1,
        }
    }
}

impl Schedule {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.interval_ms))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }

    /// Replace every zero field with the corresponding field of `fallback`.
    fn or(self, fallback: &Schedule) -> Schedule {
        let pick = |value: u32, other: u32| if value == 0 { other } else { value };
        Schedule {
            interval_ms: pick(self.interval_ms, fallback.interval_ms),
            timeout_ms: pick(self.timeout_ms, fallback.timeout_ms),
            probe_count: pick(self.probe_count, fallback.probe_count),
        }
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub capacity: usize,
    /// Bound on every lock acquisition.
    pub lock_timeout: Duration,
    /// Fills zero schedule fields on insert.
    pub defaults: Schedule,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            lock_timeout: Duration::from_secs(1),
            defaults: Schedule::default(),
        }
    }
}

impl RegistryConfig {
    pub fn from_monitor(monitor: &MonitorConfig) -> Self {
        let defaults = Schedule {
            interval_ms: monitor.default_interval_ms,
            timeout_ms: monitor.default_timeout_ms,
            probe_count: monitor.default_probe_count,
        }
        .or(&Schedule::default());
        Self {
            capacity: monitor.capacity,
            lock_timeout: monitor.lock_timeout(),
            defaults,
        }
    }
}

// ── Inputs and outputs ────────────────────────────────────────────────────────

/// Arguments to `Registry::add`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewEndpoint {
    pub name: String,
    pub ip: String,
    #[serde(default)]
    pub mac: Option<MacAddr>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl NewEndpoint {
    pub fn new(name: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
            mac: None,
            description: None,
            schedule: None,
            enabled: true,
        }
    }

    pub fn with_mac(mut self, mac: MacAddr) -> Self {
        self.mac = Some(mac);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl From<&DeviceConfig> for NewEndpoint {
    fn from(device: &DeviceConfig) -> Self {
        Self {
            name: device.name.clone(),
            ip: device.ip.clone(),
            mac: device.mac,
            description: device.description.clone(),
            schedule: Some(Schedule {
                interval_ms: device.interval_ms,
                timeout_ms: device.timeout_ms,
                probe_count: device.probe_count,
            }),
            enabled: device.enabled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddOutcome {
    Added,
    /// The name already existed; its entry was updated in place.
    Updated,
}

/// Result of applying one probe outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub previous: DeviceStatus,
    pub current: DeviceStatus,
}

impl StatusUpdate {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// What the scheduler needs to probe one endpoint, copied out of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub name: String,
    pub ip: String,
    pub timeout: Duration,
    pub probe_count: u32,
}

/// Read-only snapshot of one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointView {
    pub name: String,
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<MacAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schedule: Schedule,
    pub enabled: bool,
    pub status: DeviceStatus,
    pub success_count: u64,
    pub fail_count: u64,
    pub last_response_ms: u32,
    /// Uptime second of the last probe.
    pub last_probe_secs: Option<u64>,
    pub last_success_secs: Option<u64>,
    #[serde(skip)]
    pub last_probe_time: Option<Instant>,
}

impl EndpointView {
    pub fn entry(&self) -> DeviceEntry {
        DeviceEntry {
            name: self.name.clone(),
            ip: self.ip.clone(),
            status: self.status,
            enabled: self.enabled,
        }
    }

    /// Percentage of probe attempts that succeeded, if any were made.
    pub fn success_rate(&self) -> Option<f64> {
        let total = self.success_count + self.fail_count;
        (total > 0).then(|| self.success_count as f64 * 100.0 / total as f64)
    }
}

// ── Table ─────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Endpoint {
    name: String,
    ip: String,
    mac: Option<MacAddr>,
    description: Option<String>,
    schedule: Schedule,
    enabled: bool,
    status: DeviceStatus,
    last_probe_time: Option<Instant>,
    last_success_time: Option<Instant>,
    success_count: u64,
    fail_count: u64,
    last_response_ms: u32,
}

impl Endpoint {
    fn view(&self, started: Instant) -> EndpointView {
        let secs = |t: Option<Instant>| t.map(|t| t.duration_since(started).as_secs());
        EndpointView {
            name: self.name.clone(),
            ip: self.ip.clone(),
            mac: self.mac,
            description: self.description.clone(),
            schedule: self.schedule,
            enabled: self.enabled,
            status: self.status,
            success_count: self.success_count,
            fail_count: self.fail_count,
            last_response_ms: self.last_response_ms,
            last_probe_secs: secs(self.last_probe_time),
            last_success_secs: secs(self.last_success_time),
            last_probe_time: self.last_probe_time,
        }
    }

    fn is_due(&self, now: Instant) -> bool {
        if !self.enabled || self.ip.is_empty() {
            return false;
        }
        match self.last_probe_time {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.schedule.interval(),
        }
    }
}

struct Table {
    slots: Vec<Endpoint>,
    index: HashMap<String, usize>,
}

impl Table {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    fn get(&self, name: &str) -> Option<&Endpoint> {
        self.index.get(name).map(|&i| &self.slots[i])
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Endpoint> {
        let i = *self.index.get(name)?;
        self.slots.get_mut(i)
    }

    fn remove(&mut self, name: &str) -> bool {
        let Some(i) = self.index.remove(name) else {
            return false;
        };
        self.slots.remove(i);
        for (slot, endpoint) in self.slots.iter().enumerate().skip(i) {
            self.index.insert(endpoint.name.clone(), slot);
        }
        true
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// The engine context: endpoint table, its lock and the status observer.
pub struct Registry {
    table: Mutex<Table>,
    config: RegistryConfig,
    observer: Arc<dyn StatusObserver>,
    started: Instant,
}

impl Registry {
    pub fn new(config: RegistryConfig, observer: Arc<dyn StatusObserver>) -> Self {
        Self {
            table: Mutex::new(Table::with_capacity(config.capacity)),
            config,
            observer,
            started: Instant::now(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn defaults(&self) -> Schedule {
        self.config.defaults
    }

    /// Whole seconds since the registry was created.
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    async fn lock(&self) -> Result<MutexGuard<'_, Table>, EngineError> {
        tokio::time::timeout(self.config.lock_timeout, self.table.lock())
            .await
            .map_err(|_| {
                tracing::warn!(timeout = ?self.config.lock_timeout, "registry lock not acquired");
                EngineError::Busy(self.config.lock_timeout)
            })
    }

    /// Insert a new endpoint, or update address, MAC and description of an
    /// existing one in place.
    pub async fn add(&self, endpoint: NewEndpoint) -> Result<AddOutcome, EngineError> {
        let name = validate_name(&endpoint.name)?;
        let ip = validate_ip(&endpoint.ip)?;

        let mut table = self.lock().await?;

        if let Some(existing) = table.get_mut(name) {
            existing.ip = ip;
            if let Some(mac) = endpoint.mac {
                existing.mac = Some(mac);
            }
            if let Some(description) = endpoint.description {
                existing.description = Some(description);
            }
            if let Some(schedule) = endpoint.schedule {
                existing.schedule = schedule.or(&existing.schedule);
            }
            tracing::info!(device = %name, ip = %existing.ip, "device updated");
            return Ok(AddOutcome::Updated);
        }

        if table.slots.len() >= self.config.capacity {
            tracing::warn!(device = %name, capacity = self.config.capacity, "registry full");
            return Err(EngineError::CapacityExceeded {
                capacity: self.config.capacity,
            });
        }

        let schedule = endpoint
            .schedule
            .unwrap_or(self.config.defaults)
            .or(&self.config.defaults);

        tracing::info!(
            device = %name,
            ip = %ip,
            interval_ms = schedule.interval_ms,
            enabled = endpoint.enabled,
            "device added"
        );

        let slot = table.slots.len();
        table.slots.push(Endpoint {
            name: name.to_string(),
            ip,
            mac: endpoint.mac,
            description: endpoint.description,
            schedule,
            enabled: endpoint.enabled,
            status: DeviceStatus::Unknown,
            last_probe_time: None,
            last_success_time: None,
            success_count: 0,
            fail_count: 0,
            last_response_ms: 0,
        });
        table.index.insert(name.to_string(), slot);

        Ok(AddOutcome::Added)
    }

    pub async fn remove(&self, name: &str) -> Result<(), EngineError> {
        let mut table = self.lock().await?;
        if !table.remove(name) {
            return Err(EngineError::NotFound(name.to_string()));
        }
        tracing::info!(device = %name, remaining = table.slots.len(), "device removed");
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Result<EndpointView, EngineError> {
        let table = self.lock().await?;
        table
            .get(name)
            .map(|e| e.view(self.started))
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }

    pub async fn is_enabled(&self, name: &str) -> Result<bool, EngineError> {
        let table = self.lock().await?;
        table
            .get(name)
            .map(|e| e.enabled)
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }

    /// Snapshot of every endpoint in insertion order.
    pub async fn list(&self) -> Result<Vec<EndpointView>, EngineError> {
        let table = self.lock().await?;
        Ok(table.slots.iter().map(|e| e.view(self.started)).collect())
    }

    pub async fn len(&self) -> Result<usize, EngineError> {
        Ok(self.lock().await?.slots.len())
    }

    pub async fn summary(&self) -> Result<DeviceSummary, EngineError> {
        let devices: Vec<DeviceEntry> = self.list().await?.iter().map(EndpointView::entry).collect();
        Ok(DeviceSummary {
            total: devices.len(),
            devices,
            timestamp: self.uptime_secs(),
        })
    }

    /// Enable or disable probing. Re-enabling a disabled endpoint makes it
    /// due on the next tick.
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), EngineError> {
        let mut table = self.lock().await?;
        let endpoint = table
            .get_mut(name)
            .ok_or_else(|| EngineError::NotFound(name.to_string()))?;

        if enabled && !endpoint.enabled {
            endpoint.last_probe_time = None;
        }
        endpoint.enabled = enabled;
        tracing::info!(device = %name, enabled, "device enabled state changed");
        Ok(())
    }

    /// Change the probe schedule. Zero fields keep their current value.
    pub async fn update_schedule(&self, name: &str, schedule: Schedule) -> Result<Schedule, EngineError> {
        let mut table = self.lock().await?;
        let endpoint = table
            .get_mut(name)
            .ok_or_else(|| EngineError::NotFound(name.to_string()))?;
        endpoint.schedule = schedule.or(&endpoint.schedule);
        tracing::info!(
            device = %name,
            interval_ms = endpoint.schedule.interval_ms,
            timeout_ms = endpoint.schedule.timeout_ms,
            probe_count = endpoint.schedule.probe_count,
            "schedule updated"
        );
        Ok(endpoint.schedule)
    }

    /// Apply one probe outcome. The observer hears every result, and hears
    /// about a transition only when the status actually changed.
    ///
    /// A disabled endpoint is left untouched and reported as `Disabled`.
    pub async fn update_status(&self, name: &str, outcome: ProbeOutcome) -> Result<StatusUpdate, EngineError> {
        let (view, update) = {
            let mut table = self.lock().await?;
            let endpoint = table
                .get_mut(name)
                .ok_or_else(|| EngineError::NotFound(name.to_string()))?;
            if !endpoint.enabled {
                return Err(EngineError::Disabled(name.to_string()));
            }

            let now = Instant::now();
            endpoint.last_probe_time = Some(now);
            endpoint.last_response_ms = outcome.response_time_ms;
            if outcome.reachable {
                endpoint.success_count += 1;
                endpoint.last_success_time = Some(now);
            } else {
                endpoint.fail_count += 1;
            }

            let previous = endpoint.status;
            endpoint.status = DeviceStatus::from_reachable(outcome.reachable);
            let update = StatusUpdate {
                previous,
                current: endpoint.status,
            };
            (endpoint.view(self.started), update)
        };

        tracing::debug!(
            device = %name,
            reachable = outcome.reachable,
            response_time_ms = outcome.response_time_ms,
            "probe result"
        );
        self.observer.on_probe_result(&view, &outcome);

        if update.changed() {
            tracing::info!(
                device = %name,
                from = %update.previous,
                to = %update.current,
                "status changed"
            );
            self.observer
                .on_status_change(&view, outcome.reachable, outcome.response_time_ms);
        }

        Ok(update)
    }

    /// Validate an endpoint for waking and mark it as waking.
    pub async fn begin_wake(&self, name: &str) -> Result<MacAddr, EngineError> {
        let mut table = self.lock().await?;
        let endpoint = table
            .get_mut(name)
            .ok_or_else(|| EngineError::NotFound(name.to_string()))?;
        if !endpoint.enabled {
            return Err(EngineError::Disabled(name.to_string()));
        }
        let mac = endpoint
            .mac
            .ok_or_else(|| EngineError::InvalidArgument(format!("{name} has no MAC address")))?;
        endpoint.status = DeviceStatus::Waking;
        Ok(mac)
    }

    /// Endpoints due for a probe at `now`, in insertion order.
    pub async fn due(&self, now: Instant) -> Result<Vec<ProbeTarget>, EngineError> {
        let table = self.lock().await?;
        Ok(table
            .slots
            .iter()
            .filter(|e| e.is_due(now))
            .map(|e| ProbeTarget {
                name: e.name.clone(),
                ip: e.ip.clone(),
                timeout: e.schedule.timeout(),
                probe_count: e.schedule.probe_count,
            })
            .collect())
    }
}

/// Characters that would break a topic level or a `/devices/{name}` path.
const RESERVED_NAME_CHARS: [char; 6] = ['/', '#', '+', '?', '%', '\\'];

fn validate_name(name: &str) -> Result<&str, EngineError> {
    if name.is_empty() {
        return Err(EngineError::InvalidArgument("device name is empty".into()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(EngineError::InvalidArgument(format!(
            "device name longer than {MAX_NAME_LEN} bytes"
        )));
    }
    if name.contains(RESERVED_NAME_CHARS) || name.chars().any(char::is_whitespace) {
        return Err(EngineError::InvalidArgument(format!(
            "device name {name:?} contains a reserved character"
        )));
    }
    Ok(name)
}

fn validate_ip(ip: &str) -> Result<String, EngineError> {
    let ip = ip.trim();
    ip.parse::<IpAddr>()
        .map(|_| ip.to_string())
        .map_err(|_| EngineError::InvalidArgument(format!("{ip:?} is not an IP address")))
}
