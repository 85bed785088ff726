//! Recording message sink.

use dac_messages::{DispatchError, MessageHandler, MessageKind, OutboundAction};
use dac_types::DacId;
use std::sync::Mutex;

/// Keeps every message it receives, in delivery order.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    received: Mutex<Vec<(DacId, OutboundAction)>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<(DacId, OutboundAction)> {
        self.received.lock().unwrap().clone()
    }

    pub fn count(&self, kind: MessageKind) -> usize {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, action)| action.kind() == kind)
            .count()
    }
}

impl MessageHandler for RecordingHandler {
    fn handle(&self, dac_id: &DacId, action: &OutboundAction) -> Result<(), DispatchError> {
        self.received.lock().unwrap().push((*dac_id, action.clone()));
        Ok(())
    }
}
