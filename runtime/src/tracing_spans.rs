//! Pre-built [`tracing::Span`] constructors for runtime operations.
//!
//! Consistent span names and fields make it easy to correlate the engine
//! logs emitted while one action runs.

use dac_types::DacId;
use tracing::{info_span, Span};

/// Span covering one action from load to dispatch.
pub fn action_span(dac_id: &DacId, action: &str) -> Span {
    info_span!("action", dac = %dac_id, action = %action)
}

/// Span covering an inline follow-up run inside the triggering action.
pub fn inline_span(dac_id: &DacId, inline: &str) -> Span {
    info_span!("inline", dac = %dac_id, inline = %inline)
}

/// Span covering delivery of one committed batch of messages.
pub fn dispatch_span(dac_id: &DacId, message_count: usize) -> Span {
    info_span!("dispatch", dac = %dac_id, messages = message_count)
}

/// Span covering tenant initialisation.
pub fn init_span(dac_id: &DacId) -> Span {
    info_span!("init_tenant", dac = %dac_id)
}
