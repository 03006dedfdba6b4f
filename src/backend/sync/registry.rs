/**
 * Connection Registry
 *
 * Per-project rooms of live connections. Gateways join and leave; the
 * broker listener snapshots a room and delivers into each connection's
 * bounded outbound queue.
 *
 * # Locking
 *
 * One `std::sync::Mutex` guards every room. It is only ever held for map
 * operations and is never held across an `.await` or a network write:
 * `broadcast` copies the room out first and delivers with `try_send`, so a
 * slow socket cannot stall joins, leaves, or delivery to anyone else.
 *
 * # Eviction
 *
 * A connection whose queue is closed (its gateway is gone) or full (its
 * client is not keeping up) is removed from the room during delivery.
 * Dropping the registry's handle closes the queue, which the gateway sees
 * as the signal to close the socket.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::shared::{ProjectId, UserId};

/// Identifies one live connection
pub type ConnectionId = Uuid;

/// A serialized change record, shared by every connection it is sent to
pub type Outbound = Arc<str>;

/// Registry-side handle of one live connection
#[derive(Debug, Clone)]
pub struct LiveConnection {
    id: ConnectionId,
    user: UserId,
    outbound: mpsc::Sender<Outbound>,
}

impl LiveConnection {
    /// Create a handle with an outbound queue of `buffer` records
    ///
    /// The receiver goes to whoever writes to the transport.
    pub fn new(user: impl Into<UserId>, buffer: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (outbound, receiver) = mpsc::channel(buffer.max(1));
        let connection = Self {
            id: Uuid::new_v4(),
            user: user.into(),
            outbound,
        };
        (connection, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}

/// Outcome of one room broadcast
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections the record was queued for
    pub delivered: usize,
    /// Connections removed because their queue was closed or full
    pub evicted: usize,
}

type Room = HashMap<ConnectionId, LiveConnection>;

#[derive(Default)]
pub struct ConnectionRegistry {
    rooms: Mutex<HashMap<ProjectId, Room>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<ProjectId, Room>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connection to a project's room, creating the room if needed
    ///
    /// Returns the room size after joining.
    pub fn join(&self, project_id: ProjectId, connection: LiveConnection) -> usize {
        let mut rooms = self.rooms();
        let room = rooms.entry(project_id).or_default();
        tracing::info!(
            "[Sync] {} joined project {} (connection {})",
            connection.user,
            project_id,
            connection.id
        );
        room.insert(connection.id, connection);
        room.len()
    }

    /// Remove a connection from a room
    ///
    /// Returns whether it was present. Removing an absent connection is a
    /// no-op: the gateway and the broadcaster may both try.
    pub fn leave(&self, project_id: ProjectId, connection_id: ConnectionId) -> bool {
        let mut rooms = self.rooms();
        let Some(room) = rooms.get_mut(&project_id) else {
            return false;
        };
        let removed = room.remove(&connection_id);
        if room.is_empty() {
            rooms.remove(&project_id);
        }

        match removed {
            Some(connection) => {
                tracing::info!(
                    "[Sync] {} left project {} (connection {})",
                    connection.user,
                    project_id,
                    connection_id
                );
                true
            }
            None => false,
        }
    }

    /// Point-in-time copy of a room
    pub fn snapshot(&self, project_id: ProjectId) -> Vec<LiveConnection> {
        self.rooms()
            .get(&project_id)
            .map(|room| room.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, project_id: ProjectId, connection_id: ConnectionId) -> bool {
        self.rooms()
            .get(&project_id)
            .is_some_and(|room| room.contains_key(&connection_id))
    }

    pub fn room_size(&self, project_id: ProjectId) -> usize {
        self.rooms().get(&project_id).map_or(0, Room::len)
    }

    /// Number of projects with at least one live connection
    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }

    /// Distinct users connected to a project, sorted
    pub fn online_users(&self, project_id: ProjectId) -> Vec<UserId> {
        let mut users: Vec<UserId> = self
            .snapshot(project_id)
            .into_iter()
            .map(|connection| connection.user)
            .collect();
        users.sort();
        users.dedup();
        users
    }

    /// Queue `payload` for every connection in the project's room
    pub fn broadcast(&self, project_id: ProjectId, payload: Outbound) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for connection in self.snapshot(project_id) {
            match connection.outbound.try_send(payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        "[Sync] Evicting lagging connection {} ({}) from project {}",
                        connection.id,
                        connection.user,
                        project_id
                    );
                    self.leave(project_id, connection.id);
                    report.evicted += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(
                        "[Sync] Dropping closed connection {} from project {}",
                        connection.id,
                        project_id
                    );
                    self.leave(project_id, connection.id);
                    report.evicted += 1;
                }
            }
        }

        report
    }
}
