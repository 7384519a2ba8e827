//! EditorClient: one editing session against a sequencing authority
//!
//! Glues the [`EditorAdapter`], the revision [`Client`] and [`Presence`]
//! together. Inbound messages go through [`EditorClient::handle_message`];
//! everything to send back is returned, never written anywhere, so the
//! host owns the transport.

use super::client::Client;
use crate::binding::remote::validate_color;
use crate::binding::{EditorAdapter, RawChange, Surface, ToggleOutcome};
use crate::config::EditorConfig;
use crate::error::{OtError, Result};
use crate::ot::{Operation, Range, Selection, Style};
use crate::presence::{Presence, PresenceChange, PresenceUpdate};
use crate::protocol::{decode_operation, encode_operation, ClientMessage, ServerMessage};

pub struct EditorClient<S: Surface> {
    adapter: EditorAdapter<S>,
    client: Client,
    presence: Presence,
    color: String,
    /// Set while waiting for a full document after a failure
    resyncing: bool,
}

impl<S: Surface> EditorClient<S> {
    /// Start a session on a surface already holding the document at
    /// `revision`
    pub fn new(
        surface: S,
        config: EditorConfig,
        revision: u64,
        client_id: impl Into<String>,
        color: &str,
    ) -> Result<Self> {
        validate_color(color)?;
        Ok(Self {
            adapter: EditorAdapter::new(surface, config),
            client: Client::new(revision),
            presence: Presence::new(client_id),
            color: color.to_string(),
            resyncing: false,
        })
    }

    pub fn adapter(&self) -> &EditorAdapter<S> {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut EditorAdapter<S> {
        &mut self.adapter
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn revision(&self) -> u64 {
        self.client.revision()
    }

    pub fn is_resyncing(&self) -> bool {
        self.resyncing
    }

    /// Report a change batch the surface already applied
    pub fn on_local_changes(&mut self, changes: &[RawChange]) -> Result<Option<ClientMessage>> {
        let (operation, _) = self.adapter.produce_local_operation(changes)?;
        self.send_local(operation)
    }

    pub fn undo(&mut self) -> Result<Option<ClientMessage>> {
        match self.adapter.undo()? {
            Some(operation) => self.send_local(operation),
            None => Ok(None),
        }
    }

    pub fn redo(&mut self) -> Result<Option<ClientMessage>> {
        match self.adapter.redo()? {
            Some(operation) => self.send_local(operation),
            None => Ok(None),
        }
    }

    /// Toggle a style; the outcome is returned along with the delta to
    /// send, if anything was re-tagged
    pub fn toggle_meta(&mut self, range: Range, style: Style) -> Result<(ToggleOutcome, Option<ClientMessage>)> {
        let outcome = self.adapter.toggle_meta(range, style)?;
        let message = if outcome.toggled > 0 {
            self.send_local(outcome.delta.clone())?
        } else {
            None
        };
        Ok((outcome, message))
    }

    /// Presence update announcing the local selection
    pub fn local_presence(&mut self) -> ClientMessage {
        let selection = self.adapter.selection();
        ClientMessage::Presence(self.presence.local_update(selection, &self.color))
    }

    /// Presence update announcing that this client leaves
    pub fn leave(&mut self) -> ClientMessage {
        ClientMessage::Presence(self.presence.leave_update())
    }

    fn send_local(&mut self, operation: Operation) -> Result<Option<ClientMessage>> {
        if operation.is_noop() {
            return Ok(None);
        }
        let moved = self.presence.transform(&operation);
        let outbound = if self.resyncing {
            // the document is about to be replaced anyway
            None
        } else {
            self.client.apply_client(operation)?
        };
        self.redraw_peers(&moved);
        Ok(outbound.map(|outbound| ClientMessage::Delta {
            revision: outbound.revision,
            ops: encode_operation(&outbound.operation),
        }))
    }

    /// Process one message from the authority. Returns what to send back.
    pub fn handle_message(&mut self, message: ServerMessage) -> Result<Vec<ClientMessage>> {
        match message {
            ServerMessage::Document { revision, ops } => {
                let document = decode_operation(&ops)?;
                self.adapter.load(&document)?;
                self.client.reset(revision);
                self.presence.clear();
                self.resyncing = false;
                log::info!("loaded document at revision {}", revision);
                Ok(Vec::new())
            }
            _ if self.resyncing => {
                log::debug!("waiting for document, dropping {:?}", message);
                Ok(Vec::new())
            }
            ServerMessage::Delta { revision, user_id, ops } => {
                let operation = decode_operation(&ops)?;
                let local = self.client.apply_server(revision, &operation)?;
                log::debug!("applying revision {} from user {}", revision, user_id);
                self.adapter.apply_remote_operation(&local)?;
                let moved = self.presence.transform(&local);
                self.redraw_peers(&moved);
                Ok(Vec::new())
            }
            ServerMessage::Ack { revision } => {
                let next = self.client.server_ack(revision)?;
                Ok(next
                    .map(|outbound| ClientMessage::Delta {
                        revision: outbound.revision,
                        ops: encode_operation(&outbound.operation),
                    })
                    .into_iter()
                    .collect())
            }
            ServerMessage::DeltaDropped { revision } => {
                log::warn!("delta dropped at revision {}, resyncing", revision);
                Ok(vec![self.begin_resync()])
            }
            ServerMessage::Presence(update) => {
                self.apply_presence(update)?;
                Ok(Vec::new())
            }
        }
    }

    /// Parse and process a JSON message.
    ///
    /// Malformed messages are logged and dropped. Failures that leave the
    /// local document out of step with the authority start a resync.
    pub fn handle_raw_message(&mut self, json: &str) -> Result<Vec<ClientMessage>> {
        let result = ServerMessage::from_json(json).and_then(|message| self.handle_message(message));
        match result {
            Ok(replies) => Ok(replies),
            Err(OtError::Protocol(reason)) => {
                log::warn!("dropping malformed message: {}", reason);
                Ok(Vec::new())
            }
            Err(err) if err.requires_resync() => {
                log::error!("session out of sync: {}", err);
                Ok(vec![self.begin_resync()])
            }
            Err(err) => Err(err),
        }
    }

    /// Drop pending state and ask for the current document
    pub fn begin_resync(&mut self) -> ClientMessage {
        self.resyncing = true;
        ClientMessage::RevisionRequest {
            revision: self.client.revision(),
        }
    }

    fn apply_presence(&mut self, mut update: PresenceUpdate) -> Result<()> {
        if let Some(presence) = update.presence.as_mut() {
            if let Err(err) = validate_color(&presence.color) {
                log::warn!("dropping presence from {}: {}", update.client_id, err);
                return Ok(());
            }
            presence.selection = self.client.transform_selection(&presence.selection);
        }
        match self.presence.apply_update(update) {
            PresenceChange::Updated(state) => self.adapter.set_remote_selection(
                &state.client_id,
                &state.presence.selection,
                &state.presence.color,
            ),
            PresenceChange::Left(client_id) => {
                self.adapter.clear_remote_selection(&client_id);
                Ok(())
            }
            PresenceChange::Ignored => Ok(()),
        }
    }

    /// Redraw the given peers; a peer that cannot be drawn is logged
    /// and left as it was
    fn redraw_peers(&mut self, client_ids: &[String]) {
        for client_id in client_ids {
            let Some(state) = self.presence.peer(client_id) else {
                continue;
            };
            let selection = state.presence.selection.clone();
            let color = state.presence.color.clone();
            if let Err(err) = self.adapter.set_remote_selection(client_id, &selection, &color) {
                log::warn!("cannot redraw selection of {}: {}", client_id, err);
            }
        }
    }

    /// Forget peers silent for longer than `timeout` and erase their
    /// selections. Returns the removed client ids.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn remove_stale_peers(&mut self, timeout: std::time::Duration) -> Vec<String> {
        let removed = self.presence.remove_stale_peers(timeout);
        for client_id in &removed {
            self.adapter.clear_remote_selection(client_id);
        }
        removed
    }
}

#[cfg(all(test, feature = "memory-surface"))]
mod tests {
    use super::*;
    use crate::binding::MemorySurface;
    use crate::ot::Meta;
    use crate::presence::PeerPresence;
    use crate::protocol::wire::WireOp;
    use crate::session::ClientState;

    fn session(text: &str, user_id: u32) -> EditorClient<MemorySurface> {
        EditorClient::new(
            MemorySurface::new(text),
            EditorConfig::for_user(user_id),
            0,
            format!("client-{user_id}"),
            "#336699",
        )
        .unwrap()
    }

    fn type_text(session: &mut EditorClient<MemorySurface>, at: usize, text: &str) -> Option<ClientMessage> {
        let change = session.adapter_mut().surface_mut().edit(at, at, text, Some("+input"));
        session.on_local_changes(&[change]).unwrap()
    }

    fn delta_ops(message: Option<ClientMessage>) -> (u64, Vec<WireOp>) {
        match message {
            Some(ClientMessage::Delta { revision, ops }) => (revision, ops),
            other => panic!("expected delta, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_color_rejected() {
        let result = EditorClient::new(MemorySurface::new(""), EditorConfig::default(), 0, "c", "red");
        assert!(matches!(result, Err(OtError::InvalidColor(_))));
    }

    #[test]
    fn test_local_edit_sent_once_acked() {
        let mut alice = session("", 1);
        let (revision, ops) = delta_ops(type_text(&mut alice, 0, "a"));
        assert_eq!(revision, 0);
        assert_eq!(
            decode_operation(&ops).unwrap().ops(),
            &[crate::ot::Op::insert("a", Meta::authored(1))]
        );

        // buffered until the first one is acknowledged
        assert!(type_text(&mut alice, 1, "b").is_none());
        let replies = alice.handle_message(ServerMessage::Ack { revision: 1 }).unwrap();
        let (revision, ops) = delta_ops(replies.into_iter().next());
        assert_eq!(revision, 1);
        assert_eq!(decode_operation(&ops).unwrap().apply("a").unwrap(), "ab");
    }

    #[test]
    fn test_two_sessions_converge() {
        let mut alice = session("xy", 1);
        let mut bob = session("xy", 2);

        let (_, alice_ops) = delta_ops(type_text(&mut alice, 1, "A"));
        let (_, bob_ops) = delta_ops(type_text(&mut bob, 1, "B"));

        // the authority sequences alice first, then bob rebased over her
        let alice_op = decode_operation(&alice_ops).unwrap();
        let bob_op = decode_operation(&bob_ops).unwrap();
        let (bob_rebased, _) = Operation::transform(&bob_op, &alice_op).unwrap();

        alice.handle_message(ServerMessage::Ack { revision: 1 }).unwrap();
        alice
            .handle_message(ServerMessage::Delta {
                revision: 2,
                user_id: 2,
                ops: encode_operation(&bob_rebased),
            })
            .unwrap();

        bob.handle_message(ServerMessage::Delta {
            revision: 1,
            user_id: 1,
            ops: alice_ops,
        })
        .unwrap();
        bob.handle_message(ServerMessage::Ack { revision: 2 }).unwrap();

        assert_eq!(alice.adapter().value(), bob.adapter().value());
        assert_eq!(alice.adapter().snapshot(), bob.adapter().snapshot());
        assert_eq!(alice.revision(), 2);
        assert_eq!(bob.revision(), 2);
    }

    #[test]
    fn test_out_of_order_delta_triggers_resync() {
        let mut alice = session("abc", 1);
        let json = r#"{"type":"delta","revision":5,"ops":[{"op":"retain","retain":{"len":3}}]}"#;
        let replies = alice.handle_raw_message(json).unwrap();
        assert_eq!(replies, vec![ClientMessage::RevisionRequest { revision: 0 }]);
        assert!(alice.is_resyncing());

        // deltas are ignored until the document arrives
        let ack = r#"{"type":"ack","revision":1}"#;
        assert!(alice.handle_raw_message(ack).unwrap().is_empty());

        let document = r#"{"type":"document","revision":7,"ops":[{"op":"insert","insert":{"text":"fresh"}}]}"#;
        alice.handle_raw_message(document).unwrap();
        assert!(!alice.is_resyncing());
        assert_eq!(alice.revision(), 7);
        assert_eq!(alice.adapter().value(), "fresh");
    }

    #[test]
    fn test_malformed_message_dropped() {
        let mut alice = session("abc", 1);
        assert!(alice.handle_raw_message("{not json").unwrap().is_empty());
        assert!(!alice.is_resyncing());
    }

    #[test]
    fn test_delta_dropped_requests_document() {
        let mut alice = session("", 1);
        type_text(&mut alice, 0, "x");
        let replies = alice
            .handle_message(ServerMessage::DeltaDropped { revision: 1 })
            .unwrap();
        assert_eq!(replies, vec![ClientMessage::RevisionRequest { revision: 0 }]);
    }

    #[test]
    fn test_peer_cursor_follows_edits() {
        let mut alice = session("hello", 1);
        alice
            .handle_message(ServerMessage::Presence(PresenceUpdate {
                client_id: "client-2".to_string(),
                presence: Some(PeerPresence {
                    color: "#ff0000".to_string(),
                    selection: Selection::cursor(3),
                }),
                clock: 1,
            }))
            .unwrap();
        assert_eq!(alice.adapter().surface().markers().len(), 1);

        type_text(&mut alice, 0, ">>");
        let peer = alice.presence().peer("client-2").unwrap();
        assert_eq!(peer.presence.selection, Selection::cursor(5));
        let markers = alice.adapter().surface().markers();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].from, 5);

        alice
            .handle_message(ServerMessage::Presence(PresenceUpdate {
                client_id: "client-2".to_string(),
                presence: None,
                clock: 2,
            }))
            .unwrap();
        assert!(alice.adapter().surface().markers().is_empty());
    }

    fn peer_presence(client_id: &str, pos: usize, color: &str, clock: u64) -> ServerMessage {
        ServerMessage::Presence(PresenceUpdate {
            client_id: client_id.to_string(),
            presence: Some(PeerPresence {
                color: color.to_string(),
                selection: Selection::cursor(pos),
            }),
            clock,
        })
    }

    #[test]
    fn test_bad_presence_color_dropped() {
        let mut alice = session("ab", 1);
        let json = r#"{"type":"presence","clientId":"client-2","presence":{"color":"red","selection":{"ranges":[{"anchor":1,"head":1}]}},"clock":1}"#;
        assert!(alice.handle_raw_message(json).unwrap().is_empty());
        assert!(alice.presence().peer("client-2").is_none());
        assert!(alice.adapter().surface().markers().is_empty());

        // later edits still reach the authority
        let (revision, ops) = delta_ops(type_text(&mut alice, 0, "X"));
        assert_eq!(revision, 0);
        assert_eq!(decode_operation(&ops).unwrap().apply("ab").unwrap(), "Xab");
        assert!(matches!(alice.client().state(), ClientState::AwaitingConfirm { .. }));
    }

    #[test]
    fn test_unmoved_peer_not_redrawn() {
        let mut alice = session("hello", 1);
        alice.handle_message(peer_presence("client-2", 1, "#00ff00", 1)).unwrap();
        let marker = alice.adapter().surface().markers()[0].id;

        type_text(&mut alice, 4, "!");
        let markers = alice.adapter().surface().markers();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].id, marker);
        assert_eq!(markers[0].from, 1);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_remove_stale_peers_clears_markers() {
        let mut alice = session("hello", 1);
        alice.handle_message(peer_presence("client-2", 1, "#00ff00", 1)).unwrap();
        assert!(alice.remove_stale_peers(crate::presence::DEFAULT_TIMEOUT).is_empty());
        assert_eq!(alice.adapter().surface().markers().len(), 1);

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(
            alice.remove_stale_peers(std::time::Duration::from_millis(1)),
            vec!["client-2".to_string()]
        );
        assert!(alice.adapter().surface().markers().is_empty());
        assert_eq!(alice.presence().peer_count(), 0);
    }

    #[test]
    fn test_local_presence() {
        let mut alice = session("hello", 1);
        alice.adapter_mut().set_selection(&Selection::cursor(2));
        let ClientMessage::Presence(update) = alice.local_presence() else {
            panic!("expected presence");
        };
        assert_eq!(update.client_id, "client-1");
        let presence = update.presence.unwrap();
        assert_eq!(presence.selection, Selection::cursor(2));
        assert_eq!(presence.color, "#336699");

        let ClientMessage::Presence(update) = alice.leave() else {
            panic!("expected presence");
        };
        assert!(update.presence.is_none());
    }

    #[test]
    fn test_undo_is_sent() {
        let mut alice = session("", 1);
        type_text(&mut alice, 0, "hi");
        alice.handle_message(ServerMessage::Ack { revision: 1 }).unwrap();
        let (revision, ops) = delta_ops(alice.undo().unwrap());
        assert_eq!(revision, 1);
        assert_eq!(decode_operation(&ops).unwrap().apply("hi").unwrap(), "");
    }

    #[test]
    fn test_toggle_sends_delta() {
        let mut alice = session("", 1);
        type_text(&mut alice, 0, "abc");
        alice.handle_message(ServerMessage::Ack { revision: 1 }).unwrap();
        let (outcome, message) = alice.toggle_meta(Range::new(0, 3), Style::Bold).unwrap();
        assert!(outcome.allowed);
        let (_, ops) = delta_ops(message);
        assert_eq!(decode_operation(&ops).unwrap(), outcome.delta);
    }
}
