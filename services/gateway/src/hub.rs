//! Live push hub for the analytics websocket.
//!
//! One task owns the client registry. Handles talk to it only through a command channel,
//! so there is no shared lock. Each client has a bounded queue drained by its own writer
//! task; a client whose queue is full is dropped instead of slowing the hub down.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use comply_domain::scope::TenantScope;

/// Messages buffered per client before it counts as too slow.
pub const CLIENT_QUEUE_CAPACITY: usize = 256;

/// How often connected clients receive a stats snapshot.
pub const STATS_INTERVAL: Duration = Duration::from_secs(5);

const COMMAND_CAPACITY: usize = 1024;

pub type ClientId = Uuid;

/// Connection counts visible from one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub clients: usize,
    pub tenants: usize,
}

#[derive(Serialize)]
struct StatsMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    timestamp: i64,
    data: HubStats,
}

enum Command {
    Register {
        id: ClientId,
        scope: TenantScope,
        tx: mpsc::Sender<String>,
    },
    Unregister {
        id: ClientId,
    },
    Broadcast {
        target: TenantScope,
        payload: String,
    },
    Stats {
        scope: TenantScope,
        reply: oneshot::Sender<HubStats>,
    },
}

struct Client {
    scope: TenantScope,
    tx: mpsc::Sender<String>,
}

/// Whether a client in `client` scope receives a message addressed to `target`.
/// Global clients see every tenant's traffic.
fn delivers(client: &TenantScope, target: &TenantScope) -> bool {
    client.is_global() || target.is_global() || client == target
}

struct Hub {
    clients: HashMap<ClientId, Client>,
    commands: mpsc::Receiver<Command>,
}

impl Hub {
    async fn run(mut self, stats_interval: Duration) {
        let mut ticker = tokio::time::interval(stats_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = ticker.tick() => self.push_stats(),
            }
        }
        tracing::debug!(clients = self.clients.len(), "hub stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Register { id, scope, tx } => {
                self.clients.insert(id, Client { scope, tx });
                tracing::info!(client_id = %id, tenant_id = ?scope.tenant_id(), "hub client registered");
            }
            Command::Unregister { id } => {
                if self.clients.remove(&id).is_some() {
                    tracing::info!(client_id = %id, "hub client unregistered");
                }
            }
            Command::Broadcast { target, payload } => self.broadcast(&target, &payload),
            Command::Stats { scope, reply } => {
                let _ = reply.send(self.stats(&scope));
            }
        }
    }

    fn broadcast(&mut self, target: &TenantScope, payload: &str) {
        self.send_where(payload, |scope| delivers(scope, target));
    }

    /// Never waits on a client. A full or closed queue removes the client, which drops
    /// its sender and lets the writer task wind down.
    fn send_where(&mut self, payload: &str, selected: impl Fn(&TenantScope) -> bool) {
        self.clients.retain(|id, client| {
            if !selected(&client.scope) {
                return true;
            }
            match client.tx.try_send(payload.to_owned()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(client_id = %id, "hub client too slow, dropping");
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }

    fn stats(&self, scope: &TenantScope) -> HubStats {
        let visible: Vec<&Client> = self
            .clients
            .values()
            .filter(|c| scope.is_global() || c.scope == *scope)
            .collect();
        let tenants: HashSet<_> = visible.iter().filter_map(|c| c.scope.tenant_id()).collect();
        HubStats {
            clients: visible.len(),
            tenants: tenants.len(),
        }
    }

    fn push_stats(&mut self) {
        if self.clients.is_empty() {
            return;
        }
        let scopes: HashSet<TenantScope> = self.clients.values().map(|c| c.scope).collect();
        let timestamp = Utc::now().timestamp();
        for scope in scopes {
            let message = StatsMessage {
                kind: "hub_stats",
                timestamp,
                data: self.stats(&scope),
            };
            match serde_json::to_string(&message) {
                Ok(payload) => self.send_where(&payload, |s| *s == scope),
                Err(e) => tracing::error!(error = %e, "failed to serialize hub stats"),
            }
        }
    }
}

/// A registered client: its id and the queue its writer drains.
pub struct Subscription {
    pub id: ClientId,
    pub rx: mpsc::Receiver<String>,
}

/// Cheap, cloneable handle to the hub task.
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<Command>,
}

impl HubHandle {
    pub fn spawn() -> Self {
        Self::spawn_with_interval(STATS_INTERVAL)
    }

    /// The hub task exits once every handle is dropped.
    pub fn spawn_with_interval(stats_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let hub = Hub {
            clients: HashMap::new(),
            commands: rx,
        };
        tokio::spawn(hub.run(stats_interval));
        Self { commands: tx }
    }

    /// `None` if the hub has stopped.
    pub async fn register(&self, scope: TenantScope) -> Option<Subscription> {
        let (tx, rx) = mpsc::channel(CLIENT_QUEUE_CAPACITY);
        let id = Uuid::new_v4();
        self.commands
            .send(Command::Register { id, scope, tx })
            .await
            .ok()?;
        Some(Subscription { id, rx })
    }

    pub async fn unregister(&self, id: ClientId) {
        let _ = self.commands.send(Command::Unregister { id }).await;
    }

    /// Queue `payload` for every client in `target`, plus global clients.
    /// A global `target` reaches everyone.
    pub async fn broadcast(&self, target: TenantScope, payload: String) {
        if self
            .commands
            .send(Command::Broadcast { target, payload })
            .await
            .is_err()
        {
            tracing::warn!("hub stopped, broadcast discarded");
        }
    }

    /// Counts visible from `scope`.
    pub async fn stats(&self, scope: TenantScope) -> Option<HubStats> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Stats { scope, reply })
            .await
            .ok()?;
        rx.await.ok()
    }
}
