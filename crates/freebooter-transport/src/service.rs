//! The network I/O thread.
//!
//! [`NetworkService`] is set up in two steps, both on the main thread:
//! `listen()` binds the socket (so the caller learns the real port right
//! away, even for `:0`), and `start()` hands the socket to a dedicated
//! thread running a current-thread Tokio runtime. Everything after that
//! happens on the I/O thread and is reported back through the event
//! callback.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Something that happened on the I/O thread.
#[derive(Debug)]
pub enum NetworkEvent {
    /// A client finished the WebSocket upgrade. The [`Connection`] is
    /// ready to be owned by the main thread.
    Connected(Connection),

    /// A client went away. Always reported after `Connected` for the same
    /// id, and at most once.
    Lost(ConnectionId),
}

type EventHandler = Arc<dyn Fn(NetworkEvent) + Send + Sync>;

struct Worker {
    thread: JoinHandle<()>,
    shutdown: oneshot::Sender<()>,
}

/// Owns the listening socket and the I/O thread.
pub struct NetworkService {
    on_event: EventHandler,
    listener: Option<std::net::TcpListener>,
    local_addr: Option<SocketAddr>,
    worker: Option<Worker>,
}

impl NetworkService {
    /// Creates a service that reports events through `on_event`.
    ///
    /// The callback runs on the I/O thread, so it must not touch game
    /// state. In practice it only pushes onto a callback queue.
    pub fn new(on_event: impl Fn(NetworkEvent) + Send + Sync + 'static) -> Self {
        Self {
            on_event: Arc::new(on_event),
            listener: None,
            local_addr: None,
            worker: None,
        }
    }

    /// Binds the listening socket. Setup-only.
    ///
    /// Returns the bound address.
    pub fn listen(
        &mut self,
        addr: impl ToSocketAddrs,
    ) -> Result<SocketAddr, TransportError> {
        let listener =
            std::net::TcpListener::bind(addr).map_err(TransportError::BindFailed)?;
        listener
            .set_nonblocking(true)
            .map_err(TransportError::BindFailed)?;
        let local_addr = listener.local_addr().map_err(TransportError::BindFailed)?;

        tracing::info!(%local_addr, "network service listening");
        self.listener = Some(listener);
        self.local_addr = Some(local_addr);
        Ok(local_addr)
    }

    /// The address passed to the last successful `listen()`.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Spawns the I/O thread. Setup-only.
    pub fn start(&mut self) -> Result<(), TransportError> {
        if self.worker.is_some() {
            return Err(TransportError::AlreadyStarted);
        }
        let listener = self.listener.take().ok_or(TransportError::NotListening)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportError::StartFailed)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let on_event = Arc::clone(&self.on_event);

        let thread = std::thread::Builder::new()
            .name("freebooter-net".into())
            .spawn(move || {
                runtime.block_on(accept_loop(listener, on_event, shutdown_rx));
            })
            .map_err(TransportError::StartFailed)?;

        self.worker = Some(Worker {
            thread,
            shutdown: shutdown_tx,
        });
        tracing::debug!("network thread started");
        Ok(())
    }

    /// Whether the I/O thread is running.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Stops the I/O thread and waits for it to exit.
    ///
    /// Open connections are dropped without further `Lost` events.
    pub fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = worker.shutdown.send(());
        if worker.thread.join().is_err() {
            tracing::error!("network thread panicked");
        } else {
            tracing::info!("network thread stopped");
        }
    }
}

impl Drop for NetworkService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn accept_loop(
    listener: std::net::TcpListener,
    on_event: EventHandler,
    mut shutdown: oneshot::Receiver<()>,
) {
    let listener = match TcpListener::from_std(listener) {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "could not register listener with the runtime");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    tokio::spawn(serve_connection(stream, addr, Arc::clone(&on_event)));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            },
        }
    }
}

/// Runs one connection from WebSocket upgrade to close.
///
/// `Connected` is reported before the first frame is read and `Lost`
/// after the last one, so the main thread always sees them in that order.
async fn serve_connection(stream: TcpStream, addr: SocketAddr, on_event: EventHandler) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::debug!(%addr, error = %e, "websocket upgrade failed");
            return;
        }
    };

    let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
    let (connection, inbound_tx, mut outbound_rx, open) = Connection::new(id);
    tracing::info!(%id, %addr, "connection accepted");
    on_event(NetworkEvent::Connected(connection));

    let (mut sink, mut frames) = ws.split();

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if let Err(e) = sink.send(Message::Binary(frame.into())).await {
                tracing::debug!(%id, error = %e, "send failed");
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = frames.next().await {
        let data = match frame {
            Ok(Message::Binary(data)) => data.into(),
            Ok(Message::Text(text)) => text.as_bytes().to_vec(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue, // ping/pong/raw frame
            Err(e) => {
                tracing::debug!(%id, error = %e, "receive failed");
                break;
            }
        };
        if inbound_tx.send(data).is_err() {
            // Main thread already dropped the connection.
            break;
        }
    }

    open.store(false, Ordering::Release);
    writer.abort();
    tracing::info!(%id, %addr, "connection lost");
    on_event(NetworkEvent::Lost(id));
}
