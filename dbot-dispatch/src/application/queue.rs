use tokio::sync::mpsc;

use crate::error::{DispatchError, Result};
use crate::event::Event;

/// Items on the update queue. `Stop` is enqueued by `Application::stop` so that every event
/// queued before it is still dispatched.
#[derive(Debug)]
pub(crate) enum Envelope {
    Event(Event),
    Stop,
}

/// Producer side of the application's update queue; update sources and callbacks push
/// events through this.
#[derive(Clone, Debug)]
pub struct UpdateSender {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl UpdateSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { tx }
    }

    /// Enqueues an update, raw string or custom value. Never blocks.
    pub fn send(&self, event: impl Into<Event>) -> Result<()> {
        self.tx
            .send(Envelope::Event(event.into()))
            .map_err(|_| DispatchError::QueueClosed)
    }

    pub(crate) fn send_stop(&self) -> Result<()> {
        self.tx.send(Envelope::Stop).map_err(|_| DispatchError::QueueClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok, block_on};

    #[test]
    fn test_stop_marker_follows_queued_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sender = UpdateSender::new(tx);

        assert_ok!(sender.send("first"));
        assert_ok!(sender.send_stop());

        assert!(matches!(block_on(rx.recv()), Some(Envelope::Event(Event::Text(_)))));
        assert!(matches!(block_on(rx.recv()), Some(Envelope::Stop)));
    }

    #[test]
    fn test_send_after_receiver_dropped_fails() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sender = UpdateSender::new(tx);
        drop(rx);

        assert!(sender.is_closed());
        assert_err!(sender.send("late"));
    }
}
