//! `Server` builder and main loop.
//!
//! This is the entry point for running a Freebooter server. It wires the
//! layers together:
//!
//! ```text
//! NetworkService ─→ ConnectionRegistry ─→ AuthenticationSession
//!                          │                      │ SessionBus
//!                          └──── messages ───→ World ←── EngineBus ── simulation
//! ```
//!
//! Everything except the network I/O runs on the thread that calls
//! [`Server::tick`] or [`Server::run`].

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use freebooter_session::{CredentialStore, MemoryStore, SessionBus};
use freebooter_tick::{TickConfig, TickScheduler};
use freebooter_world::{CreatorRegistry, EngineBus, Notifier, ObjectFactory, World, WorldConfig};

use crate::{ConnectionRegistry, FreebooterError};

/// Builder for configuring a Freebooter server.
///
/// # Example
///
/// ```rust,ignore
/// let server = Server::builder()
///     .bind("0.0.0.0:9000")
///     .object_factory(my_factory)
///     .build()?;
/// server.run().await
/// ```
pub struct ServerBuilder {
    bind_addr: String,
    tick: TickConfig,
    store: Option<Arc<dyn CredentialStore>>,
    factory: Option<Arc<dyn ObjectFactory>>,
    notifier: Option<Notifier>,
    world: WorldConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:9000".to_string(),
            tick: TickConfig::default(),
            store: None,
            factory: None,
            notifier: None,
            world: WorldConfig::default(),
        }
    }

    /// Sets the address to listen on. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the main loop rate in ticks per second.
    pub fn tick_rate(mut self, rate_hz: u32) -> Self {
        self.tick.rate_hz = rate_hz;
        self
    }

    pub fn tick_config(mut self, config: TickConfig) -> Self {
        self.tick = config;
        self
    }

    /// Sets where credentials live. Defaults to an empty [`MemoryStore`].
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the object factory. Defaults to a [`CreatorRegistry`] that
    /// only knows the player object type.
    pub fn object_factory(mut self, factory: Arc<dyn ObjectFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Sets where login notifications go. Defaults to stdout.
    pub fn notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn world_config(mut self, config: WorldConfig) -> Self {
        self.world = config;
        self
    }

    /// Binds the listener and wires buses, registry and world.
    ///
    /// The I/O thread is not started yet; see [`Server::start`].
    pub fn build(self) -> Result<Server, FreebooterError> {
        let session_bus = SessionBus::new();
        let engine_bus = EngineBus::new();

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let factory = self.factory.unwrap_or_else(|| {
            let mut registry = CreatorRegistry::new();
            registry.register_type(self.world.player_object_type.clone());
            Arc::new(registry)
        });
        let notifier = self.notifier.unwrap_or_else(Notifier::stdout);

        let mut registry = ConnectionRegistry::new(store, session_bus.clone());
        let local_addr = registry.listen(self.bind_addr.as_str())?;

        let world = World::new(&session_bus, &engine_bus, factory, notifier, self.world);

        Ok(Server {
            registry,
            world,
            session_bus,
            engine_bus,
            tick: self.tick,
            local_addr,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A Freebooter server.
pub struct Server {
    registry: ConnectionRegistry,
    world: World,
    session_bus: SessionBus,
    engine_bus: EngineBus,
    tick: TickConfig,
    local_addr: SocketAddr,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Publisher for simulation code: object creation, deletion, kills.
    pub fn engine_bus(&self) -> &EngineBus {
        &self.engine_bus
    }

    pub fn session_bus(&self) -> &SessionBus {
        &self.session_bus
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access for setup, e.g. registering more commands.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Starts the network I/O thread.
    pub fn start(&mut self) -> Result<(), FreebooterError> {
        self.registry.start()?;
        tracing::info!(local_addr = %self.local_addr, "freebooter server started");
        Ok(())
    }

    /// One main loop iteration: network events, then world events and
    /// the table changes they scheduled.
    pub fn tick(&mut self) {
        self.registry.process_network_events(&mut self.world);
        self.world.tick();
    }

    /// Starts the I/O thread and ticks until Ctrl-C.
    ///
    /// Fails with [`FreebooterError::Runtime`] if the interrupt handler
    /// cannot be installed.
    pub async fn run(self) -> Result<(), FreebooterError> {
        self.serve(async {
            let signal = tokio::signal::ctrl_c().await;
            if signal.is_ok() {
                tracing::info!("interrupt received, shutting down");
            }
            signal
        })
        .await
    }

    /// Starts the I/O thread and ticks until `shutdown` resolves, then
    /// stops the I/O thread.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), FreebooterError> {
        self.serve(async {
            shutdown.await;
            Ok(())
        })
        .await
    }

    async fn serve(
        mut self,
        shutdown: impl Future<Output = std::io::Result<()>>,
    ) -> Result<(), FreebooterError> {
        self.start()?;
        let mut scheduler = TickScheduler::new(self.tick.clone());
        tokio::pin!(shutdown);

        let stopped = loop {
            tokio::select! {
                result = &mut shutdown => break result,
                _ = scheduler.wait_for_tick() => {
                    self.tick();
                    scheduler.record_tick_end();
                }
            }
        };

        self.registry.shutdown();
        if let Err(e) = &stopped {
            tracing::error!(error = %e, "shutdown signal failed");
        }
        tracing::info!(ticks = scheduler.tick_count(), "freebooter server stopped");
        Ok(stopped?)
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.local_addr)
            .field("registry", &self.registry)
            .field("world", &self.world)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn server() -> Server {
        Server::builder()
            .bind("127.0.0.1:0")
            .tick_rate(100)
            .notifier(Notifier::sink())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_until_shutdown_resolves_ok() {
        let result = server()
            .run_until(tokio::time::sleep(Duration::from_millis(30)))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_serve_signal_failure_returns_runtime_error() {
        let result = server()
            .serve(async { Err(std::io::Error::other("no signal handler")) })
            .await;
        match result {
            Err(FreebooterError::Runtime(e)) => assert_eq!(e.to_string(), "no signal handler"),
            other => panic!("expected a runtime error, got {other:?}"),
        }
    }
}
