//! One-stop bundle of read-only collaborators.

use crate::{NullBudgetSource, NullDirectory, NullTokenLedger};
use dac_messages::{ActionContext, Collaborators, Outbox};
use dac_types::{Authorization, Tenant, Timestamp};

#[derive(Debug, Default)]
pub struct NullWorld {
    pub directory: NullDirectory,
    pub tokens: NullTokenLedger,
    pub budget: NullBudgetSource,
}

impl NullWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            directory: &self.directory,
            tokens: &self.tokens,
            budget: &self.budget,
        }
    }

    /// Build a context for one action against `tenant`.
    pub fn context<'a>(
        &'a self,
        tenant: &'a Tenant,
        now: Timestamp,
        auth: &'a Authorization,
        outbox: &'a mut Outbox,
    ) -> ActionContext<'a> {
        ActionContext {
            tenant,
            now,
            auth,
            collaborators: self.collaborators(),
            outbox,
        }
    }
}
