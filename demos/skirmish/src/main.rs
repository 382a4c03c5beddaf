use std::sync::Arc;

use freebooter::prelude::*;
use freebooter::world::EngineBus;
use tracing_subscriber::EnvFilter;

/// Listen address when `FREEBOOTER_BIND` is not set.
const DEFAULT_BIND: &str = "0.0.0.0:9000";

// ---------------------------------------------------------------------------
// Ship types
// ---------------------------------------------------------------------------

fn ship_types() -> CreatorRegistry {
    let mut factory = CreatorRegistry::new();
    factory
        .register_type("ship")
        .register_type("giant")
        .register_type("scout")
        .register_creator("freighter", || Object::new("freighter"));
    factory
}

/// `/selfdestruct`: kills the caller's ship through the engine bus, the
/// same way the simulation reports a kill.
fn selfdestruct(
    engine: EngineBus,
) -> impl Fn(&Command, &mut Player) -> CommandOutcome + Send + Sync + 'static {
    move |_, player| match player.object_id() {
        Some(object_id) => {
            engine.publish(EngineEvent::PlayerKilled(object_id));
            CommandOutcome::ok()
        }
        None => CommandOutcome::failed("You have no ship to destroy."),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind = std::env::var("FREEBOOTER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());

    let mut server = Server::builder()
        .bind(&bind)
        .tick_rate(30)
        .object_factory(Arc::new(ship_types()))
        .notifier(Notifier::stdout())
        .build()?;

    let engine = server.engine_bus().clone();
    server
        .world_mut()
        .commands_mut()
        .register_handler("selfdestruct", selfdestruct(engine));

    tracing::info!(local_addr = %server.local_addr(), "skirmish server ready");
    server.run().await?;
    Ok(())
}
