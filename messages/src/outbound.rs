//! Outbound messages and the per-action outbox.

use dac_types::{AccountName, DacId, ExtendedAsset, PermissionName};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// One signer entry of a permission: `actor@permission` carrying `weight`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionLevelWeight {
    pub actor: AccountName,
    pub permission: PermissionName,
    pub weight: u16,
}

/// A one-way message to an external collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundAction {
    /// Move tokens between accounts.
    Transfer {
        from: AccountName,
        to: AccountName,
        quantity: ExtendedAsset,
        memo: String,
    },
    /// Replace a permission on `account` with a weighted signer set.
    UpdatePermission {
        account: AccountName,
        permission: PermissionName,
        parent: PermissionName,
        threshold: u32,
        weights: Vec<PermissionLevelWeight>,
    },
    /// The serving custodian set changed substantially.
    GovernanceChanged { dac_id: DacId, new_custodians: u32 },
    /// Ask the activation account to confirm the tenant may unlock.
    AssertUnlock {
        activation_account: AccountName,
        dac_id: DacId,
    },
}

/// Routing key for [`OutboundAction`] handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MessageKind {
    Transfer,
    UpdatePermission,
    GovernanceChanged,
    AssertUnlock,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl OutboundAction {
    pub fn kind(&self) -> MessageKind {
        match self {
            OutboundAction::Transfer { .. } => MessageKind::Transfer,
            OutboundAction::UpdatePermission { .. } => MessageKind::UpdatePermission,
            OutboundAction::GovernanceChanged { .. } => MessageKind::GovernanceChanged,
            OutboundAction::AssertUnlock { .. } => MessageKind::AssertUnlock,
        }
    }
}

/// A follow-up call into the engine that runs inside the same transaction,
/// with the engine's own authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineAction {
    /// Second half of `newperiod`, after the activation check.
    RunNewPeriod { message: String },
    /// Drop an account from the arbiter whitelist unless it arbitrates a live proposal.
    SafeRemoveArbiter { arbiter: AccountName },
}

/// Messages queued by one action.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    messages: Vec<OutboundAction>,
    inline: VecDeque<InlineAction>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: OutboundAction) {
        self.messages.push(action);
    }

    pub fn transfer(
        &mut self,
        from: AccountName,
        to: AccountName,
        quantity: ExtendedAsset,
        memo: impl Into<String>,
    ) {
        self.push(OutboundAction::Transfer {
            from,
            to,
            quantity,
            memo: memo.into(),
        });
    }

    pub fn schedule(&mut self, action: InlineAction) {
        self.inline.push_back(action);
    }

    pub fn next_inline(&mut self) -> Option<InlineAction> {
        self.inline.pop_front()
    }

    pub fn messages(&self) -> &[OutboundAction] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.inline.is_empty()
    }

    /// Take every queued outbound message, leaving the outbox empty.
    pub fn drain(&mut self) -> Vec<OutboundAction> {
        std::mem::take(&mut self.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dac_types::{Asset, Symbol};

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    #[test]
    fn drain_preserves_order() {
        let mut outbox = Outbox::new();
        let qty = ExtendedAsset::new(Asset::new(5, Symbol::new("TLM", 4).unwrap()), name("token"));
        outbox.transfer(name("a"), name("b"), qty, "first");
        outbox.push(OutboundAction::GovernanceChanged {
            dac_id: name("dac"),
            new_custodians: 3,
        });
        let drained = outbox.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind(), MessageKind::Transfer);
        assert_eq!(drained[1].kind(), MessageKind::GovernanceChanged);
        assert!(outbox.messages().is_empty());
    }

    #[test]
    fn inline_is_fifo() {
        let mut outbox = Outbox::new();
        outbox.schedule(InlineAction::RunNewPeriod { message: "a".into() });
        outbox.schedule(InlineAction::SafeRemoveArbiter { arbiter: name("arb") });
        assert!(matches!(outbox.next_inline(), Some(InlineAction::RunNewPeriod { .. })));
        assert!(matches!(outbox.next_inline(), Some(InlineAction::SafeRemoveArbiter { .. })));
        assert!(outbox.next_inline().is_none());
    }
}
