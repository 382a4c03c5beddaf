//! Deferred mutation of the live tables.
//!
//! Nothing enters or leaves the object table directly. Handlers describe
//! the change as a callback on [`Deferred`], and the world applies every
//! pending change at one fixed point in the tick. Iteration over the
//! table elsewhere in the tick never sees it change underneath.

use std::sync::Arc;

use freebooter_dispatch::CallbackQueue;
use freebooter_protocol::{Message, ObjectId};

use crate::player::{Player, Players, broadcast};
use crate::{Object, ObjectTable};

/// The state deferred callbacks operate on.
#[derive(Debug, Default)]
pub struct WorldState {
    pub players: Players,
    pub objects: ObjectTable,
}

/// Shared handle to the world's callback queue.
#[derive(Debug, Clone, Default)]
pub struct Deferred {
    queue: Arc<CallbackQueue<WorldState>>,
}

impl Deferred {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `object` to join the live table.
    pub fn add_object(&self, object: Object) {
        tracing::trace!(object_id = %object.id(), kind = object.kind(), "object add scheduled");
        self.queue.push(move |state: &mut WorldState| {
            tracing::debug!(object_id = %object.id(), kind = object.kind(), "object added");
            state.objects.add_object(object);
        });
    }

    /// Schedules `id` to leave the live table.
    ///
    /// Clients are told with a `delete_object` broadcast when the callback
    /// runs, not now.
    pub fn delete_object(&self, id: ObjectId) {
        tracing::trace!(object_id = %id, "object delete scheduled");
        self.queue.push(move |state: &mut WorldState| {
            broadcast(&state.players, &Message::DeleteObject { object_id: id });
            if state.objects.delete_object(id).is_some() {
                tracing::debug!(object_id = %id, "object deleted");
            } else {
                tracing::debug!(object_id = %id, "delete for object not in table");
            }
        });
    }

    /// Gives `player` a new object and retires the old one.
    ///
    /// The assignment is immediate so input from the client is routed to
    /// the new object right away; the table changes are deferred.
    pub fn replace_object(&self, player: &mut Player, object: Object) {
        let old = player.object_id();
        player.assign_object(object.id());
        self.add_object(object);
        if let Some(old) = old {
            self.delete_object(old);
        }
    }

    /// Applies every pending change. Returns how many ran.
    pub fn process(&self, state: &mut WorldState) -> usize {
        self.queue.process(state)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freebooter_protocol::{Codec, ConnectionId, JsonCodec, Outbox};
    use freebooter_transport::loopback;

    #[test]
    fn test_add_object_waits_for_process() {
        let deferred = Deferred::new();
        let mut state = WorldState::default();
        let object = Object::new("ship");
        let id = object.id();

        deferred.add_object(object);
        assert!(!state.objects.has_object(id));
        assert_eq!(deferred.pending(), 1);

        deferred.process(&mut state);
        assert!(state.objects.has_object(id));
    }

    #[test]
    fn test_delete_object_broadcasts_at_removal() {
        let deferred = Deferred::new();
        let mut state = WorldState::default();
        let (conn, mut peer) = loopback(ConnectionId::new(1));
        state
            .players
            .insert(conn.id(), Player::new("Kilgore", Outbox::new(conn.sender())));
        let object = Object::new("ship");
        let id = object.id();
        state.objects.add_object(object);

        deferred.delete_object(id);
        assert!(peer.drain().is_empty(), "nothing sent at schedule time");
        assert!(state.objects.has_object(id));

        deferred.process(&mut state);
        assert!(!state.objects.has_object(id));
        let sent: Vec<_> = peer
            .drain()
            .iter()
            .map(|frame| JsonCodec.decode_message(frame).unwrap())
            .collect();
        assert_eq!(sent, vec![Message::DeleteObject { object_id: id }]);
    }

    #[test]
    fn test_replace_object_assigns_now_and_swaps_later() {
        let deferred = Deferred::new();
        let mut state = WorldState::default();
        let (conn, _peer) = loopback(ConnectionId::new(1));
        let mut player = Player::new("Kilgore", Outbox::new(conn.sender()));

        let first = Object::new("ship");
        let first_id = first.id();
        deferred.replace_object(&mut player, first);
        deferred.process(&mut state);

        let second = Object::new("ship");
        let second_id = second.id();
        deferred.replace_object(&mut player, second);

        assert_eq!(player.object_id(), Some(second_id));
        assert!(state.objects.has_object(first_id));
        assert!(!state.objects.has_object(second_id));

        deferred.process(&mut state);
        assert!(!state.objects.has_object(first_id));
        assert!(state.objects.has_object(second_id));
    }
}
