//! Revision tracking and the pending-rebase buffer
//!
//! At most one local operation is in flight at a time. Edits made while
//! waiting for its acknowledgement are composed into a buffer, and every
//! operation the authority sends in the meantime is transformed against
//! both, in the order received.

use crate::error::{OtError, Result};
use crate::ot::{Operation, Selection};

/// Where the client stands with respect to the authority
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClientState {
    /// Nothing in flight
    #[default]
    Synchronized,
    /// One operation sent, not yet acknowledged
    AwaitingConfirm { outstanding: Operation },
    /// One operation in flight plus local edits made since
    AwaitingWithBuffer {
        outstanding: Operation,
        buffer: Operation,
    },
}

/// An operation to send, based on `revision`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub revision: u64,
    pub operation: Operation,
}

#[derive(Debug, Clone, Default)]
pub struct Client {
    revision: u64,
    state: ClientState,
}

impl Client {
    pub fn new(revision: u64) -> Self {
        Self {
            revision,
            state: ClientState::Synchronized,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Record a local operation; returns it when it should be sent now
    pub fn apply_client(&mut self, operation: Operation) -> Result<Option<Outbound>> {
        let (state, outbound) = match &self.state {
            ClientState::Synchronized => (
                ClientState::AwaitingConfirm {
                    outstanding: operation.clone(),
                },
                Some(Outbound {
                    revision: self.revision,
                    operation,
                }),
            ),
            ClientState::AwaitingConfirm { outstanding } => (
                ClientState::AwaitingWithBuffer {
                    outstanding: outstanding.clone(),
                    buffer: operation,
                },
                None,
            ),
            ClientState::AwaitingWithBuffer { outstanding, buffer } => (
                ClientState::AwaitingWithBuffer {
                    outstanding: outstanding.clone(),
                    buffer: buffer.compose(&operation)?,
                },
                None,
            ),
        };
        self.state = state;
        Ok(outbound)
    }

    /// Take in an operation committed by someone else as `revision`.
    ///
    /// Returns the operation to apply to the local document, rebased over
    /// everything not yet acknowledged. Local operations win insert ties,
    /// matching the authority, which transforms the incoming client
    /// operation first.
    pub fn apply_server(&mut self, revision: u64, operation: &Operation) -> Result<Operation> {
        self.expect_revision(revision)?;
        let (state, local) = match &self.state {
            ClientState::Synchronized => (ClientState::Synchronized, operation.clone()),
            ClientState::AwaitingConfirm { outstanding } => {
                let (outstanding, local) = Operation::transform(outstanding, operation)?;
                (ClientState::AwaitingConfirm { outstanding }, local)
            }
            ClientState::AwaitingWithBuffer { outstanding, buffer } => {
                let (outstanding, rebased) = Operation::transform(outstanding, operation)?;
                let (buffer, local) = Operation::transform(buffer, &rebased)?;
                (ClientState::AwaitingWithBuffer { outstanding, buffer }, local)
            }
        };
        self.state = state;
        self.revision = revision;
        Ok(local)
    }

    /// The outstanding operation was committed as `revision`. Returns the
    /// buffer when it should be sent next.
    pub fn server_ack(&mut self, revision: u64) -> Result<Option<Outbound>> {
        if self.state == ClientState::Synchronized {
            return Err(OtError::UnexpectedAck);
        }
        self.expect_revision(revision)?;
        self.revision = revision;

        let state = std::mem::take(&mut self.state);
        Ok(match state {
            ClientState::AwaitingWithBuffer { buffer, .. } => {
                self.state = ClientState::AwaitingConfirm {
                    outstanding: buffer.clone(),
                };
                Some(Outbound {
                    revision: self.revision,
                    operation: buffer,
                })
            }
            _ => None,
        })
    }

    /// Move a remote peer's selection, expressed against the authority's
    /// document, into local coordinates
    pub fn transform_selection(&self, selection: &Selection) -> Selection {
        match &self.state {
            ClientState::Synchronized => selection.clone(),
            ClientState::AwaitingConfirm { outstanding } => selection.transform(outstanding),
            ClientState::AwaitingWithBuffer { outstanding, buffer } => {
                selection.transform(outstanding).transform(buffer)
            }
        }
    }

    /// Drop everything pending and restart at `revision`
    pub fn reset(&mut self, revision: u64) {
        self.revision = revision;
        self.state = ClientState::Synchronized;
    }

    fn expect_revision(&self, revision: u64) -> Result<()> {
        let expected = self.revision + 1;
        if revision != expected {
            return Err(OtError::RevisionMismatch {
                expected,
                actual: revision,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ot::Range;

    fn insert_at(at: usize, text: &str, doc_len: usize) -> Operation {
        let mut op = Operation::new();
        op.retain(at).insert(text).retain(doc_len - at);
        op
    }

    #[test]
    fn test_send_and_ack() {
        let mut client = Client::new(3);
        let outbound = client.apply_client(insert_at(0, "a", 0)).unwrap().unwrap();
        assert_eq!(outbound.revision, 3);
        assert!(matches!(client.state(), ClientState::AwaitingConfirm { .. }));

        assert_eq!(client.server_ack(4).unwrap(), None);
        assert_eq!(client.revision(), 4);
        assert_eq!(client.state(), &ClientState::Synchronized);
    }

    #[test]
    fn test_buffer_sent_after_ack() {
        let mut client = Client::new(0);
        client.apply_client(insert_at(0, "a", 0)).unwrap();
        assert!(client.apply_client(insert_at(1, "b", 1)).unwrap().is_none());
        assert!(client.apply_client(insert_at(2, "c", 2)).unwrap().is_none());

        let next = client.server_ack(1).unwrap().unwrap();
        assert_eq!(next.revision, 1);
        assert_eq!(next.operation.apply("a").unwrap(), "abc");
    }

    #[test]
    fn test_unexpected_ack() {
        let mut client = Client::new(0);
        assert_eq!(client.server_ack(1), Err(OtError::UnexpectedAck));
    }

    #[test]
    fn test_revision_mismatch() {
        let mut client = Client::new(5);
        let err = client.apply_server(7, &Operation::new()).unwrap_err();
        assert_eq!(err, OtError::RevisionMismatch { expected: 6, actual: 7 });
        assert!(err.requires_resync());
    }

    #[test]
    fn test_rebase_converges() {
        // both sides start from "xy"
        let doc = "xy";
        let mut client = Client::new(0);
        let local = insert_at(1, "L", 2);
        let local_doc = local.apply(doc).unwrap();
        client.apply_client(local.clone()).unwrap();
        let buffered = insert_at(3, "B", 0);
        let local_doc = buffered.apply(&local_doc).unwrap();
        client.apply_client(buffered).unwrap();

        // the authority committed someone else's edit first
        let remote = insert_at(1, "R", 1);
        let to_apply = client.apply_server(1, &remote).unwrap();
        let local_doc = to_apply.apply(&local_doc).unwrap();

        // the authority then transforms our outstanding op over the remote one
        let (outstanding_on_server, _) = Operation::transform(&local, &remote).unwrap();
        let server_doc = outstanding_on_server
            .apply(&remote.apply(doc).unwrap())
            .unwrap();

        let next = client.server_ack(2).unwrap().unwrap();
        let server_doc = next.operation.apply(&server_doc).unwrap();
        assert_eq!(server_doc, local_doc);
        assert_eq!(local_doc, "xLRyB");
    }

    #[test]
    fn test_transform_selection() {
        let mut client = Client::new(0);
        client.apply_client(insert_at(0, "abc", 4)).unwrap();
        let selection = Selection::new(vec![Range::new(1, 2)]);
        assert_eq!(
            client.transform_selection(&selection),
            Selection::new(vec![Range::new(4, 5)])
        );
    }

    #[test]
    fn test_reset() {
        let mut client = Client::new(0);
        client.apply_client(insert_at(0, "a", 0)).unwrap();
        client.reset(10);
        assert_eq!(client.revision(), 10);
        assert_eq!(client.state(), &ClientState::Synchronized);
    }
}
