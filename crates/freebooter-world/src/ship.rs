//! The `ship` command.
//!
//! ```text
//! /ship list                    → "Registered object types: ..."
//! /ship request <object type>   → swap your ship for a new one
//! ```

use std::sync::Arc;

use freebooter_protocol::{Command, Message};

use crate::player::SERVER_SENDER;
use crate::{CommandOutcome, Deferred, ObjectFactory, Player};

/// Name the command is registered under.
pub const SHIP_COMMAND: &str = "ship";

/// Sent to every player right after login.
pub const HELP_TEXT: &str = "Available commands:\n\
    /ship list - lists the registered object types\n\
    /ship request <object type> - replaces your ship with a new one of the given type";

/// Builds the `ship` command handler.
pub fn ship_handler(
    factory: Arc<dyn ObjectFactory>,
    deferred: Deferred,
) -> impl Fn(&Command, &mut Player) -> CommandOutcome + Send + Sync + 'static {
    move |command, player| match command.parameter(0) {
        Some("list") => {
            let types = factory.type_names().join(", ");
            player.send(&Message::chat(
                format!("Registered object types: {types}"),
                SERVER_SENDER,
            ));
            CommandOutcome::ok()
        }
        Some("request") => {
            let Some(kind) = command.parameter(1) else {
                return CommandOutcome::failed("Please define ship type.");
            };
            let Some(object) = factory.create_a(kind) else {
                return CommandOutcome::failed(format!("Unknown ship type: {kind}"));
            };
            tracing::info!(username = player.name(), %kind, "ship requested");
            deferred.replace_object(player, object);
            CommandOutcome::ok()
        }
        _ => CommandOutcome::failed("Invalid ship command."),
    }
}
