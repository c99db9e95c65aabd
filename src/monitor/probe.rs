use chrono::{DateTime, Utc};
use tokio::{
    net::TcpStream,
    task::JoinSet,
    time::{Duration, timeout},
};

use crate::config::{ServerEntry, ServerKind};

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub server_id: String,
    pub success: bool,
    pub at: DateTime<Utc>,
    pub error: Option<String>,
}

impl ProbeOutcome {
    fn reachable(server_id: &str) -> Self {
        Self {
            server_id: server_id.to_string(),
            success: true,
            at: Utc::now(),
            error: None,
        }
    }

    fn unreachable(server_id: &str, error: impl ToString) -> Self {
        Self {
            server_id: server_id.to_string(),
            success: false,
            at: Utc::now(),
            error: Some(error.to_string()),
        }
    }
}

/// Reachability checks for the configured fleet. Suspended servers are
/// never probed.
pub enum Prober {
    Tcp { timeout: Duration },
    Simulated { tick: u64 },
}

impl Prober {
    pub fn new(simulation_enabled: bool, timeout_secs: u64) -> Self {
        if simulation_enabled {
            Self::Simulated { tick: 0 }
        } else {
            Self::Tcp {
                timeout: Duration::from_secs(timeout_secs.max(1)),
            }
        }
    }

    pub async fn probe_all(&mut self, servers: &[ServerEntry]) -> Vec<ProbeOutcome> {
        let active = servers
            .iter()
            .filter(|server| !server.monitoring_suspended)
            .cloned()
            .collect::<Vec<_>>();

        let mut outcomes = match self {
            Prober::Tcp { timeout } => probe_tcp(active, *timeout).await,
            Prober::Simulated { tick } => {
                *tick = tick.saturating_add(1);
                active
                    .iter()
                    .enumerate()
                    .map(|(idx, server)| simulated_outcome(server, *tick, idx as u64))
                    .collect()
            }
        };
        outcomes.sort_by(|left, right| left.server_id.cmp(&right.server_id));
        outcomes
    }
}

async fn probe_tcp(servers: Vec<ServerEntry>, limit: Duration) -> Vec<ProbeOutcome> {
    let mut probes = JoinSet::new();
    for server in servers {
        probes.spawn(async move { probe_one(&server, limit).await });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = probes.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(error) => log::error!("heartbeat_probe_task_failed error={}", error),
        }
    }
    outcomes
}

async fn probe_one(server: &ServerEntry, limit: Duration) -> ProbeOutcome {
    if server.kind == ServerKind::Local {
        return ProbeOutcome::reachable(&server.id);
    }

    match timeout(limit, TcpStream::connect((server.host.as_str(), server.port))).await {
        Ok(Ok(_stream)) => ProbeOutcome::reachable(&server.id),
        Ok(Err(error)) => ProbeOutcome::unreachable(&server.id, error),
        Err(_) => ProbeOutcome::unreachable(
            &server.id,
            format!("connect timed out after {}s", limit.as_secs()),
        ),
    }
}

/// Every server drops out for three ticks out of twenty, staggered by its
/// position in the fleet.
fn simulated_outcome(server: &ServerEntry, tick: u64, position: u64) -> ProbeOutcome {
    if server.kind == ServerKind::Local {
        return ProbeOutcome::reachable(&server.id);
    }

    let slot = (tick + position * 7) % 20;
    if (15..18).contains(&slot) {
        ProbeOutcome::unreachable(&server.id, "simulated outage")
    } else {
        ProbeOutcome::reachable(&server.id)
    }
}
