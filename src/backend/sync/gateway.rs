/**
 * Sync Gateway
 *
 * WebSocket endpoint `GET /ws/projects/{project_id}?token=...`. One gateway
 * session per socket.
 *
 * # Lifecycle
 *
 * ```text
 * Connecting ──auth + membership ok──> Authenticated ──join──> Joined ──close──> Closed
 *      └──────────────── rejected (1008) ───────────────────────────────────────┘
 * ```
 *
 * Admission is decided before the socket is used for anything: a rejected
 * client receives a policy-violation close frame and is never registered.
 * Once joined, the gateway only forwards queued change records and watches
 * the inbound side for closure; clients send no application messages.
 *
 * The session leaves the room exactly once however the socket ends:
 * client close, transport error, eviction, or the task being dropped.
 */

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::backend::auth::sessions::SessionManager;
use crate::backend::error::BackendError;
use crate::backend::projects::membership::MembershipGuard;
use crate::backend::server::state::AppState;
use crate::backend::sync::registry::{ConnectionId, ConnectionRegistry, LiveConnection, Outbound};
use crate::shared::{ProjectId, UserId};

/// How long a rejected client gets to acknowledge the close frame
const REJECT_LINGER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    Connecting,
    Authenticated,
    Joined,
    Closed,
}

/// Per-socket state machine
pub struct GatewaySession {
    project_id: ProjectId,
    state: GatewayState,
    user: Option<UserId>,
    connection_id: Option<ConnectionId>,
    registry: Arc<ConnectionRegistry>,
}

impl GatewaySession {
    pub fn new(project_id: ProjectId, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            project_id,
            state: GatewayState::Connecting,
            user: None,
            connection_id: None,
            registry,
        }
    }

    pub fn state(&self) -> GatewayState {
        self.state
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Resolve the token and check project membership
    ///
    /// Any failure moves the session straight to `Closed`.
    pub async fn authenticate(
        &mut self,
        sessions: &SessionManager,
        membership: &MembershipGuard,
        token: Option<&str>,
    ) -> Result<(), BackendError> {
        if self.state != GatewayState::Connecting {
            return Err(BackendError::internal("gateway session already past admission"));
        }

        let admitted = match sessions.require_user(token).await {
            Ok(user) => membership
                .require_member(self.project_id, &user)
                .await
                .map(|_| user),
            Err(e) => Err(e),
        };

        match admitted {
            Ok(user) => {
                self.user = Some(user);
                self.state = GatewayState::Authenticated;
                Ok(())
            }
            Err(e) => {
                self.state = GatewayState::Closed;
                Err(e)
            }
        }
    }

    /// Register in the project's room
    ///
    /// Returns the outbound queue, or `None` if the session is not
    /// authenticated.
    pub fn join(&mut self, buffer: usize) -> Option<mpsc::Receiver<Outbound>> {
        if self.state != GatewayState::Authenticated {
            return None;
        }
        let user = self.user.clone()?;

        let (connection, outbound) = LiveConnection::new(user, buffer);
        self.connection_id = Some(connection.id());
        self.registry.join(self.project_id, connection);
        self.state = GatewayState::Joined;
        Some(outbound)
    }

    /// Move to `Closed`, leaving the room if joined
    pub fn close(&mut self) {
        if self.state == GatewayState::Joined {
            if let Some(connection_id) = self.connection_id.take() {
                self.registry.leave(self.project_id, connection_id);
            }
        }
        self.state = GatewayState::Closed;
    }
}

impl Drop for GatewaySession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Query parameters of the socket endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SocketParams {
    pub token: Option<String>,
}

/// WebSocket handler for `GET /ws/projects/{project_id}`
pub async fn handle_project_socket(
    ws: WebSocketUpgrade,
    Path(project_id): Path<ProjectId>,
    Query(params): Query<SocketParams>,
    State(state): State<AppState>,
) -> Response {
    let mut session = GatewaySession::new(project_id, state.registry.clone());

    let admission = session
        .authenticate(&state.sessions, &state.membership, params.token.as_deref())
        .await;

    match admission {
        Ok(()) => {
            let buffer = state.config.connection_buffer;
            ws.on_upgrade(move |socket| run_session(socket, session, buffer))
        }
        Err(e) => {
            tracing::warn!("[Sync] Rejected socket for project {}: {}", project_id, e);
            let reason = e.message();
            ws.on_upgrade(move |socket| reject(socket, reason))
        }
    }
}

async fn reject(mut socket: WebSocket, reason: String) {
    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: reason.into(),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        tracing::debug!("[Sync] Failed to send rejection frame: {}", e);
        return;
    }

    // wait for the client's close acknowledgement
    let _ = tokio::time::timeout(REJECT_LINGER, async {
        while let Some(Ok(_)) = socket.recv().await {}
    })
    .await;
}

async fn run_session(socket: WebSocket, mut session: GatewaySession, buffer: usize) {
    let Some(mut outbound) = session.join(buffer) else {
        return;
    };
    let project_id = session.project_id();
    let user = session.user().unwrap_or_default().to_string();

    let (mut sender, mut receiver) = socket.split();

    let evicted = loop {
        tokio::select! {
            queued = outbound.recv() => match queued {
                Some(payload) => {
                    if let Err(e) = sender.send(Message::Text(payload.to_string().into())).await {
                        tracing::debug!("[Sync] Send to {} failed: {}", user, e);
                        break false;
                    }
                }
                // the registry dropped us
                None => break true,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break false,
                Some(Err(e)) => {
                    tracing::debug!("[Sync] Socket error for {}: {}", user, e);
                    break false;
                }
                Some(Ok(_)) => {}
            },
        }
    };

    session.close();

    if evicted {
        let frame = CloseFrame {
            code: close_code::AGAIN,
            reason: "connection fell behind; reconnect and refetch".into(),
        };
        let _ = sender.send(Message::Close(Some(frame))).await;
    }

    tracing::info!("[Sync] Socket for {} on project {} closed", user, project_id);
}
