//! Typed handler registry for outbound messages.

use crate::error::DispatchError;
use crate::outbound::{MessageKind, OutboundAction};
use dac_types::DacId;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Consumer of committed outbound messages.
pub trait MessageHandler: Send + Sync {
    fn handle(&self, dac_id: &DacId, action: &OutboundAction) -> Result<(), DispatchError>;
}

/// Outcome of dispatching one batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub unhandled: usize,
    pub failed: usize,
}

/// Routes messages to every handler registered for their kind.
///
/// Delivery happens after commit, so a failing handler cannot undo the
/// action; failures are logged and counted.
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: BTreeMap<MessageKind, Vec<Arc<dyn MessageHandler>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: MessageKind, handler: Arc<dyn MessageHandler>) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    pub fn handler_count(&self, kind: MessageKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    pub fn dispatch(&self, dac_id: &DacId, messages: &[OutboundAction]) -> DispatchReport {
        let mut report = DispatchReport::default();
        for message in messages {
            let kind = message.kind();
            let Some(handlers) = self.handlers.get(&kind).filter(|h| !h.is_empty()) else {
                tracing::debug!(dac = %dac_id, %kind, "no handler registered, message dropped");
                report.unhandled += 1;
                continue;
            };
            for handler in handlers {
                match handler.handle(dac_id, message) {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        tracing::error!(dac = %dac_id, %kind, error = %e, "message handler failed");
                        report.failed += 1;
                    }
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<MessageKind>>);

    impl MessageHandler for Recorder {
        fn handle(&self, _dac_id: &DacId, action: &OutboundAction) -> Result<(), DispatchError> {
            self.0.lock().unwrap().push(action.kind());
            Ok(())
        }
    }

    struct Failing;

    impl MessageHandler for Failing {
        fn handle(&self, _dac_id: &DacId, action: &OutboundAction) -> Result<(), DispatchError> {
            Err(DispatchError::Rejected {
                kind: action.kind().to_string(),
                reason: "nope".into(),
            })
        }
    }

    fn dac() -> DacId {
        "testdac".parse().unwrap()
    }

    #[test]
    fn routes_by_kind() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(MessageKind::GovernanceChanged, recorder.clone());

        let report = dispatcher.dispatch(
            &dac(),
            &[
                OutboundAction::GovernanceChanged {
                    dac_id: dac(),
                    new_custodians: 5,
                },
                OutboundAction::AssertUnlock {
                    activation_account: "act".parse().unwrap(),
                    dac_id: dac(),
                },
            ],
        );
        assert_eq!(report.delivered, 1);
        assert_eq!(report.unhandled, 1);
        assert_eq!(*recorder.0.lock().unwrap(), vec![MessageKind::GovernanceChanged]);
    }

    #[test]
    fn failures_are_counted() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(MessageKind::AssertUnlock, Arc::new(Failing));
        let report = dispatcher.dispatch(
            &dac(),
            &[OutboundAction::AssertUnlock {
                activation_account: "act".parse().unwrap(),
                dac_id: dac(),
            }],
        );
        assert_eq!(report.failed, 1);
        assert_eq!(report.delivered, 0);
    }
}
