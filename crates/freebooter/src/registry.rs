//! The bridge between the network I/O thread and the main thread.
//!
//! ```text
//!   I/O thread                          main thread
//!  ────────────                        ─────────────────────────────────
//!  NetworkEvent::Connected ──┐
//!  NetworkEvent::Lost ───────┼─→ CallbackQueue ─→ process_network_events()
//!                            │                       1. run callbacks (FIFO)
//!  inbound frames ───────────┼─→ Connection ─────→   2. decode frames
//!                            │                          → AuthenticationSession
//!  outbound frames ←─────────┴── Outbox ←──────────     → MessageListener (World)
//! ```
//!
//! The I/O thread never sees game state. It only packs what happened into
//! a closure over owned values and pushes it onto the queue; the main
//! thread runs those closures at the start of its tick.

use std::collections::HashMap;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use freebooter_dispatch::CallbackQueue;
use freebooter_protocol::{Codec, ConnectionId, JsonCodec, MessageListener, Outbox};
use freebooter_session::{AuthenticationSession, CredentialStore, SessionBus};
use freebooter_transport::{Connection, NetworkEvent, NetworkService, TransportError};

/// A live connection and the session that authenticates it.
#[derive(Debug)]
struct ConnectionBundle {
    connection: Connection,
    session: AuthenticationSession,
}

/// Main-thread connection table. The context network callbacks run on.
pub struct Connections {
    bundles: HashMap<ConnectionId, ConnectionBundle>,
    store: Arc<dyn CredentialStore>,
    session_bus: SessionBus,
}

impl Connections {
    fn accept(&mut self, connection: Connection) {
        let id = connection.id();
        if !connection.is_open() {
            tracing::debug!(%id, "connection closed before it was accepted");
            return;
        }

        let session = AuthenticationSession::new(
            Outbox::new(connection.sender()),
            Arc::clone(&self.store),
            self.session_bus.clone(),
        );
        self.bundles
            .insert(id, ConnectionBundle { connection, session });
        tracing::debug!(%id, connections = self.bundles.len(), "session opened");
    }

    fn lose(&mut self, id: ConnectionId) {
        let Some(mut bundle) = self.bundles.remove(&id) else {
            tracing::debug!(%id, "lost connection had no session");
            return;
        };
        bundle.session.close();
        tracing::debug!(%id, connections = self.bundles.len(), "session closed");
    }
}

impl std::fmt::Debug for Connections {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connections")
            .field("bundles", &self.bundles.len())
            .finish_non_exhaustive()
    }
}

/// Callback queue network events are marshalled through.
pub type NetworkQueue = Arc<CallbackQueue<Connections>>;

/// Turns I/O-thread events into queued callbacks.
fn network_event_sink(queue: NetworkQueue) -> impl Fn(NetworkEvent) + Send + Sync + 'static {
    move |event| match event {
        NetworkEvent::Connected(connection) => {
            queue.push(move |connections: &mut Connections| connections.accept(connection));
        }
        NetworkEvent::Lost(id) => {
            queue.push(move |connections: &mut Connections| connections.lose(id));
        }
    }
}

/// Owns the network service and every connection's session.
pub struct ConnectionRegistry {
    queue: NetworkQueue,
    connections: Connections,
    network: NetworkService,
    codec: JsonCodec,
}

impl ConnectionRegistry {
    /// Creates a registry whose sessions check credentials against
    /// `store` and announce logins on `session_bus`.
    pub fn new(store: Arc<dyn CredentialStore>, session_bus: SessionBus) -> Self {
        let queue: NetworkQueue = Arc::new(CallbackQueue::new());
        let network = NetworkService::new(network_event_sink(Arc::clone(&queue)));
        Self {
            queue,
            connections: Connections {
                bundles: HashMap::new(),
                store,
                session_bus,
            },
            network,
            codec: JsonCodec,
        }
    }

    /// Binds the listening socket. Setup-only.
    pub fn listen(&mut self, addr: impl ToSocketAddrs) -> Result<SocketAddr, TransportError> {
        self.network.listen(addr)
    }

    /// Starts the I/O thread. Setup-only.
    pub fn start(&mut self) -> Result<(), TransportError> {
        self.network.start()
    }

    /// Stops the I/O thread. Connections already handed to the main
    /// thread stay in the table until the next call drops them.
    pub fn shutdown(&mut self) {
        self.network.shutdown();
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.network.local_addr()
    }

    /// A handle that feeds network events into this registry exactly the
    /// way the I/O thread does. Lets tools and tests attach in-memory
    /// connections.
    pub fn event_sink(&self) -> impl Fn(NetworkEvent) + Send + Sync + 'static {
        network_event_sink(Arc::clone(&self.queue))
    }

    /// Number of connections with a live session.
    pub fn connection_count(&self) -> usize {
        self.connections.bundles.len()
    }

    pub fn session(&self, id: ConnectionId) -> Option<&AuthenticationSession> {
        self.connections.bundles.get(&id).map(|bundle| &bundle.session)
    }

    /// Runs one main-thread pass over the network.
    ///
    /// First every queued accept/lost callback runs in arrival order. Then
    /// each connection's waiting frames are decoded and handed to its
    /// session, then to `listener`. Returns how many messages were routed.
    pub fn process_network_events(&mut self, listener: &mut impl MessageListener) -> usize {
        let callbacks = self.queue.process(&mut self.connections);
        if callbacks > 0 {
            tracing::trace!(callbacks, "network callbacks processed");
        }

        let mut routed = 0;
        for (&id, bundle) in &mut self.connections.bundles {
            while let Some(frame) = bundle.connection.try_recv() {
                let message = match self.codec.decode_message(&frame) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::warn!(%id, error = %e, len = frame.len(), "undecodable frame dropped");
                        continue;
                    }
                };
                tracing::trace!(%id, ?message, "message received");
                bundle.session.handle(&message);
                listener.on_message(id, &message);
                routed += 1;
            }
        }
        routed
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections.bundles.len())
            .field("pending_callbacks", &self.queue.len())
            .field("local_addr", &self.network.local_addr())
            .finish()
    }
}
