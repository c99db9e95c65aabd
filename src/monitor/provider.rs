use std::{collections::HashMap, path::Path};

use sysinfo::{CpuExt, DiskExt, NetworkExt, NetworksExt, System, SystemExt};
use thiserror::Error;

use crate::{
    anomaly::MetricType,
    config::{ServerEntry, ServerKind},
};

/// One collection of resource usage for a server. cpu, memory and disk are
/// percentages; network is KiB moved since the previous collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub network: f64,
}

impl Metrics {
    pub fn value(&self, metric: MetricType) -> f64 {
        match metric {
            MetricType::Cpu => self.cpu,
            MetricType::Memory => self.memory,
            MetricType::Disk => self.disk,
            MetricType::Network => self.network,
        }
    }
}

#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct MonitorError {
    message: String,
}

impl MonitorError {
    #[cfg(test)]
    pub(crate) fn mock_metrics_exhausted() -> Self {
        Self {
            message: "mock metrics exhausted".to_string(),
        }
    }
}

pub trait MetricsProvider {
    /// `Ok(None)` when this provider has no way to reach the server's metrics.
    async fn collect_metrics(
        &mut self,
        server: &ServerEntry,
    ) -> Result<Option<Metrics>, MonitorError>;
}

pub enum ActiveMetricsProvider {
    Real(Box<RealMetricsProvider>),
    Simulated(SimulatedMetricsProvider),
}

impl ActiveMetricsProvider {
    pub fn new(simulation_enabled: bool) -> Self {
        if simulation_enabled {
            Self::Simulated(SimulatedMetricsProvider::new())
        } else {
            Self::Real(Box::new(RealMetricsProvider::new()))
        }
    }
}

impl MetricsProvider for ActiveMetricsProvider {
    async fn collect_metrics(
        &mut self,
        server: &ServerEntry,
    ) -> Result<Option<Metrics>, MonitorError> {
        match self {
            ActiveMetricsProvider::Real(provider) => provider.collect_metrics(server).await,
            ActiveMetricsProvider::Simulated(provider) => provider.collect_metrics(server).await,
        }
    }
}

/// Host metrics via sysinfo; only answers for `kind = "local"` servers.
pub struct RealMetricsProvider {
    system: System,
}

impl RealMetricsProvider {
    pub fn new() -> Self {
        Self {
            system: System::new_all(),
        }
    }
}

impl MetricsProvider for RealMetricsProvider {
    async fn collect_metrics(
        &mut self,
        server: &ServerEntry,
    ) -> Result<Option<Metrics>, MonitorError> {
        if server.kind != ServerKind::Local {
            return Ok(None);
        }

        self.system.refresh_cpu();
        self.system.refresh_memory();
        self.system.refresh_disks_list();
        self.system.refresh_disks();
        self.system.refresh_networks_list();
        self.system.refresh_networks();

        let cpu = self.system.global_cpu_info().cpu_usage() as f64;

        let total_memory = self.system.total_memory() as f64;
        let used_memory = self.system.used_memory() as f64;
        let memory = if total_memory > 0.0 {
            (used_memory / total_memory) * 100.0
        } else {
            0.0
        };

        let disk = self
            .system
            .disks()
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"))
            .or_else(|| self.system.disks().first())
            .map(|disk| {
                let total_space = disk.total_space() as f64;
                let used_space = disk.total_space().saturating_sub(disk.available_space()) as f64;
                if total_space > 0.0 {
                    (used_space / total_space) * 100.0
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0);

        let network_bytes = self
            .system
            .networks()
            .iter()
            .map(|(_, data)| data.received().saturating_add(data.transmitted()))
            .fold(0_u64, u64::saturating_add);

        Ok(Some(Metrics {
            cpu,
            memory,
            disk,
            network: network_bytes as f64 / 1024.0,
        }))
    }
}

/// Deterministic wave with periodic spikes, phase-shifted per server so a
/// simulated fleet does not move in lockstep.
pub struct SimulatedMetricsProvider {
    ticks: HashMap<String, u64>,
}

impl SimulatedMetricsProvider {
    pub fn new() -> Self {
        Self {
            ticks: HashMap::new(),
        }
    }
}

impl MetricsProvider for SimulatedMetricsProvider {
    async fn collect_metrics(
        &mut self,
        server: &ServerEntry,
    ) -> Result<Option<Metrics>, MonitorError> {
        let tick = self.ticks.entry(server.id.clone()).or_insert(0);
        *tick = tick.saturating_add(1);
        let tick = *tick;

        let offset = server
            .id
            .bytes()
            .fold(0_u64, |acc, byte| acc.wrapping_mul(31).wrapping_add(byte as u64))
            % 64;
        let phase = (tick + offset) as f64 / 8.0;

        let mut cpu = 45.0 + (phase.sin() * 20.0);
        let mut memory = 55.0 + ((phase * 0.7).sin() * 12.0);
        let mut disk = 60.0 + ((phase * 0.2).sin() * 5.0);
        let mut network = 400.0 + ((phase * 1.3).sin() * 120.0);

        if tick.is_multiple_of(30) {
            cpu = 95.0;
        }

        if tick.is_multiple_of(47) {
            memory = 93.0;
        }

        if tick.is_multiple_of(83) {
            disk = 91.0;
        }

        if tick.is_multiple_of(61) {
            network = 4_000.0;
        }

        Ok(Some(Metrics {
            cpu: cpu.clamp(0.0, 100.0),
            memory: memory.clamp(0.0, 100.0),
            disk: disk.clamp(0.0, 100.0),
            network: network.max(0.0),
        }))
    }
}

#[cfg(test)]
pub(crate) struct MockMetricsProvider {
    sequence: Vec<Metrics>,
}

#[cfg(test)]
impl MockMetricsProvider {
    pub(crate) fn new(sequence: Vec<Metrics>) -> Self {
        Self { sequence }
    }
}

#[cfg(test)]
impl MetricsProvider for MockMetricsProvider {
    async fn collect_metrics(
        &mut self,
        _server: &ServerEntry,
    ) -> Result<Option<Metrics>, MonitorError> {
        if self.sequence.is_empty() {
            return Err(MonitorError::mock_metrics_exhausted());
        }

        Ok(Some(self.sequence.remove(0)))
    }
}
