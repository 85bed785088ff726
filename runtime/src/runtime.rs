//! Transactional execution of actions against per-tenant state.
//!
//! Each action loads the tenant blob, applies the operation, runs any
//! inline follow-ups it scheduled, and only then writes the blob back and
//! hands the queued messages to the dispatcher. A failure anywhere before
//! the write leaves the stored state untouched and sends nothing.

use crate::action::Action;
use crate::config::RuntimeConfig;
use crate::state::TenantState;
use crate::tracing_spans::{action_span, dispatch_span, inline_span, init_span};
use crate::RuntimeError;
use dac_custodian::{
    BudgetPlan, CandidateRegistry, ElectionConfig, ElectionEngine, InboundObserver, Maintenance,
};
use dac_escrow::{EscrowService, FundingLeg};
use dac_messages::{
    ActionContext, Collaborators, DispatchReport, Dispatcher, InlineAction, MessageHandler, MessageKind, Outbox,
    OutboundAction,
};
use dac_proposals::{ProposalConfig, ProposalEngine, ProposalStatus};
use dac_store::{BudgetSource, Clock, Directory, StateStore, TokenLedger};
use dac_types::{AccountType, Authorization, DacId};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What an operation returned, beyond success.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    Done,
    Status { status: ProposalStatus },
    Count { count: usize },
    Budget { plan: BudgetPlan },
    Funded { leg: FundingLeg },
}

/// Result of one committed action.
#[derive(Clone, Debug)]
pub struct ExecutionReport {
    pub action: &'static str,
    pub outcome: ActionOutcome,
    /// Messages committed by the action, in emission order.
    pub messages: Vec<OutboundAction>,
    pub dispatch: DispatchReport,
}

/// Hosts any number of tenants over shared collaborators.
pub struct DacRuntime {
    store: Arc<dyn StateStore + Send + Sync>,
    directory: Arc<dyn Directory + Send + Sync>,
    tokens: Arc<dyn TokenLedger + Send + Sync>,
    budget: Arc<dyn BudgetSource + Send + Sync>,
    clock: Arc<dyn Clock + Send + Sync>,
    dispatcher: Dispatcher,
}

impl DacRuntime {
    pub fn new(
        store: Arc<dyn StateStore + Send + Sync>,
        directory: Arc<dyn Directory + Send + Sync>,
        tokens: Arc<dyn TokenLedger + Send + Sync>,
        budget: Arc<dyn BudgetSource + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            store,
            directory,
            tokens,
            budget,
            clock,
            dispatcher: Dispatcher::new(),
        }
    }

    /// Route committed messages of `kind` to `handler`.
    pub fn register_handler(&mut self, kind: MessageKind, handler: Arc<dyn MessageHandler>) {
        self.dispatcher.register(kind, handler);
    }

    fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            directory: &*self.directory,
            tokens: &*self.tokens,
            budget: &*self.budget,
        }
    }

    /// Create empty state for a tenant listed in the directory.
    pub fn init_tenant(
        &self,
        dac_id: &DacId,
        election: ElectionConfig,
        proposals: ProposalConfig,
    ) -> Result<(), RuntimeError> {
        let _span = init_span(dac_id).entered();
        let tenant = self.directory.resolve_tenant(dac_id)?;
        election.validate(&tenant)?;
        proposals.validate()?;
        if self.store.load(dac_id)?.is_some() {
            return Err(RuntimeError::TenantExists(*dac_id));
        }
        let state = TenantState::new(election, proposals);
        self.store.save(dac_id, &state.encode()?)?;
        info!(dac = %dac_id, "tenant initialised");
        Ok(())
    }

    /// Initialise every configured tenant that has no state yet. Returns how
    /// many were created.
    pub fn init_from_config(&self, config: &RuntimeConfig) -> Result<usize, RuntimeError> {
        let mut created = 0;
        for tenant in &config.tenants {
            let dac_id = tenant.tenant.dac_id;
            if self.store.load(&dac_id)?.is_some() {
                debug!(dac = %dac_id, "tenant already initialised");
                continue;
            }
            self.init_tenant(&dac_id, tenant.election.clone(), tenant.proposals.clone())?;
            created += 1;
        }
        Ok(created)
    }

    /// Current committed state of a tenant.
    pub fn state(&self, dac_id: &DacId) -> Result<TenantState, RuntimeError> {
        let bytes = self
            .store
            .load(dac_id)?
            .ok_or(RuntimeError::UnknownTenant(*dac_id))?;
        TenantState::decode(&bytes)
    }

    /// Tenants with stored state.
    pub fn tenants(&self) -> Result<Vec<DacId>, RuntimeError> {
        Ok(self.store.scopes()?)
    }

    /// Run one action as a single transaction.
    pub fn execute(
        &self,
        dac_id: &DacId,
        auth: &Authorization,
        action: Action,
    ) -> Result<ExecutionReport, RuntimeError> {
        let name = action.name();
        let _span = action_span(dac_id, name).entered();
        match self.try_execute(dac_id, auth, action) {
            Ok(report) => {
                info!(
                    messages = report.messages.len(),
                    delivered = report.dispatch.delivered,
                    failed = report.dispatch.failed,
                    "action committed"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, kind = %e.kind(), "action rejected");
                Err(e)
            }
        }
    }

    fn try_execute(
        &self,
        dac_id: &DacId,
        auth: &Authorization,
        action: Action,
    ) -> Result<ExecutionReport, RuntimeError> {
        let name = action.name();
        let tenant = self.directory.resolve_tenant(dac_id)?;
        let mut state = self.state(dac_id)?;
        let mut outbox = Outbox::new();
        let outcome = {
            let mut ctx = ActionContext {
                tenant: &tenant,
                now: self.clock.now(),
                auth,
                collaborators: self.collaborators(),
                outbox: &mut outbox,
            };
            let outcome = apply(&mut state, &mut ctx, action)?;
            run_inline(&mut state, &mut ctx)?;
            outcome
        };

        self.store.save(dac_id, &state.encode()?)?;

        let messages = outbox.drain();
        let dispatch = {
            let _span = dispatch_span(dac_id, messages.len()).entered();
            self.dispatcher.dispatch(dac_id, &messages)
        };
        Ok(ExecutionReport {
            action: name,
            outcome,
            messages,
            dispatch,
        })
    }
}

/// Drain the inline queue; each follow-up runs with the engine's authority.
fn run_inline(state: &mut TenantState, ctx: &mut ActionContext<'_>) -> Result<(), RuntimeError> {
    while let Some(inline) = ctx.outbox.next_inline() {
        match inline {
            InlineAction::RunNewPeriod { message } => {
                let _span = inline_span(&ctx.dac_id(), "runnewperiod").entered();
                ctx.with_contract_authority(|ctx| {
                    ElectionEngine.run_new_period(&mut state.custodian, ctx, &message)
                })?;
            }
            InlineAction::SafeRemoveArbiter { arbiter } => {
                let _span = inline_span(&ctx.dac_id(), "safermvarbwl").entered();
                ctx.with_contract_authority(|ctx| {
                    ProposalEngine.safe_remove_arbiter(&mut state.proposals, ctx, arbiter)
                })?;
            }
        }
    }
    Ok(())
}

fn apply(
    state: &mut TenantState,
    ctx: &mut ActionContext<'_>,
    action: Action,
) -> Result<ActionOutcome, RuntimeError> {
    use ActionOutcome::{Count, Done, Funded, Status};

    let TenantState {
        custodian,
        escrow,
        proposals,
    } = state;

    let outcome = match action {
        // ── Candidates ──
        Action::Nominate { cand, requestedpay } => {
            CandidateRegistry.nominate(custodian, ctx, cand, requestedpay)?;
            Done
        }
        Action::NominateUnpaid { cand } => {
            CandidateRegistry.nominate_unpaid(custodian, ctx, cand)?;
            Done
        }
        Action::Withdraw { cand } => {
            CandidateRegistry.withdraw(custodian, ctx, cand)?;
            Done
        }
        Action::RemoveCandidate { cand } => {
            CandidateRegistry.remove(custodian, ctx, cand)?;
            Done
        }
        Action::Resign { cust } => {
            CandidateRegistry.resign_custodian(custodian, ctx, cust)?;
            Done
        }
        Action::UpdateRequestedPay { cand, requestedpay } => {
            CandidateRegistry.update_requested_pay(custodian, ctx, cand, requestedpay)?;
            Done
        }
        Action::SetProfile { cand, profile } => {
            CandidateRegistry.set_profile(custodian, ctx, cand, profile)?;
            Done
        }
        Action::UpdateBio { cand, bio } => {
            CandidateRegistry.update_bio(custodian, ctx, cand, bio)?;
            Done
        }
        Action::SetPermission { cand, permission } => {
            CandidateRegistry.set_permission(custodian, ctx, cand, permission)?;
            Done
        }
        Action::AppointCustodians { custs } => {
            CandidateRegistry.appoint_custodians(custodian, ctx, custs)?;
            Done
        }
        Action::AddWhitelist { cand, rating } => {
            CandidateRegistry.add_whitelist(custodian, ctx, cand, rating)?;
            Done
        }
        Action::UpdateWhitelist { cand, rating } => {
            CandidateRegistry.update_whitelist(custodian, ctx, cand, rating)?;
            Done
        }
        Action::RemoveWhitelist { cand } => {
            CandidateRegistry.remove_whitelist(custodian, ctx, cand)?;
            Done
        }
        Action::SetRequireWhitelist { required } => {
            CandidateRegistry.set_require_whitelist(custodian, ctx, required)?;
            Done
        }

        // ── Votes and proxies ──
        Action::VoteCustodians { voter, candidates } => {
            CandidateRegistry.vote_custodians(custodian, ctx, voter, candidates)?;
            Done
        }
        Action::VoteProxy { voter, proxy } => {
            CandidateRegistry.vote_proxy(custodian, ctx, voter, proxy)?;
            Done
        }
        Action::RemoveVote { voter } => {
            CandidateRegistry.remove_vote(custodian, ctx, voter)?;
            Done
        }
        Action::RegisterProxy { proxy } => {
            CandidateRegistry.register_proxy(custodian, ctx, proxy)?;
            Done
        }
        Action::UnregisterProxy { proxy } => {
            CandidateRegistry.unregister_proxy(custodian, ctx, proxy)?;
            Done
        }

        // ── Inbound notifications ──
        Action::WeightObserve { deltas } => {
            InboundObserver.weight_observe(custodian, ctx, &deltas)?;
            Done
        }
        Action::BalanceObserve { deltas } => {
            InboundObserver.balance_observe(custodian, ctx, &deltas)?;
            Done
        }
        Action::StakeObserve { deltas } => {
            InboundObserver.stake_observe(custodian, ctx, &deltas)?;
            Done
        }
        Action::Transfer {
            from,
            to,
            quantity,
            memo,
        } => {
            if ctx.account_for_type(AccountType::Escrow) == Some(to) {
                Funded {
                    leg: EscrowService.fund(escrow, ctx, from, quantity, &memo)?,
                }
            } else if ctx.account_for_type(AccountType::Proposals) == Some(to) {
                ProposalEngine.receive_deposit(proposals, ctx, from, quantity)?;
                Done
            } else {
                return Err(RuntimeError::UnroutedTransfer(to));
            }
        }

        // ── Periods, pay and budget ──
        Action::NewPeriod { message } => {
            ElectionEngine.new_period(ctx, message)?;
            Done
        }
        Action::RunNewPeriod { message } => {
            ElectionEngine.run_new_period(custodian, ctx, &message)?;
            Done
        }
        Action::ClaimPay { payid } => {
            ElectionEngine.claim_pay(custodian, ctx, payid)?;
            Done
        }
        Action::RejectPay { payid } => {
            ElectionEngine.reject_pay(custodian, ctx, payid)?;
            Done
        }
        Action::RemovePay { payid } => {
            ElectionEngine.remove_pay(custodian, ctx, payid)?;
            Done
        }
        Action::ClaimBudget => ActionOutcome::Budget {
            plan: ElectionEngine.claim_budget(custodian, ctx)?,
        },
        Action::Budget { update } => {
            ElectionEngine.update_budget(custodian, ctx, update)?;
            Done
        }
        Action::ElectionConfig { update } => {
            ElectionEngine.update_config(custodian, ctx, update)?;
            Done
        }

        // ── Maintenance ──
        Action::Maintenance { enabled } => {
            Maintenance.set_mode(custodian, ctx, enabled)?;
            Done
        }
        Action::ResetVotes { voter } => {
            Maintenance.reset_votes(custodian, ctx, voter)?;
            Done
        }
        Action::CollectVotes { from, to } => Count {
            count: Maintenance.collect_votes(custodian, ctx, from, to)?,
        },
        Action::ResetCandidates => {
            Maintenance.reset_candidates(custodian, ctx)?;
            Done
        }
        Action::ResetState => {
            Maintenance.reset_state(custodian, ctx)?;
            Done
        }
        Action::ClearCandidates => {
            Maintenance.clear_candidates(custodian, ctx)?;
            Done
        }
        Action::ClearCustodians => {
            Maintenance.clear_custodians(custodian, ctx)?;
            Done
        }
        Action::ClearProxyVotes => Count {
            count: Maintenance.clear_proxy_votes(custodian, ctx)?,
        },
        Action::ClearProxies => Count {
            count: Maintenance.clear_proxies(custodian, ctx)?,
        },
        Action::CleanOrphans { from, to } => Count {
            count: Maintenance.clean_orphans(custodian, ctx, from, to)?,
        },
        Action::ClearRank => {
            Maintenance.clear_ranks(custodian, ctx)?;
            Done
        }
        Action::MigrateRank => {
            Maintenance.recompute_ranks(custodian, ctx)?;
            Done
        }

        // ── Escrow ──
        Action::EscrowInit {
            sender,
            receiver,
            arb,
            expires,
            memo,
            ext_reference,
        } => {
            EscrowService.init(escrow, ctx, sender, receiver, arb, expires, memo, ext_reference)?;
            Done
        }
        Action::EscrowApprove { key, approver } => {
            EscrowService.approve(escrow, ctx, key, approver)?;
            Done
        }
        Action::EscrowDisapprove { key, disapprover } => {
            EscrowService.disapprove(escrow, ctx, key, disapprover)?;
            Done
        }
        Action::EscrowRefund { key } => {
            EscrowService.refund(escrow, ctx, key)?;
            Done
        }
        Action::EscrowDispute { key } => {
            EscrowService.dispute(escrow, ctx, key)?;
            Done
        }
        Action::EscrowCancel { key } => {
            EscrowService.cancel(escrow, ctx, key)?;
            Done
        }

        // ── Proposals ──
        Action::CreateProposal(args) => {
            ProposalEngine.create_proposal(proposals, ctx, args)?;
            Done
        }
        Action::ArbiterAgree { arbiter, id } => {
            ProposalEngine.arbiter_agree(proposals, ctx, arbiter, id)?;
            Done
        }
        Action::StartWork { id } => Status {
            status: ProposalEngine.start_work(proposals, escrow, &*custodian, ctx, id)?,
        },
        Action::CompleteWork { id } => {
            ProposalEngine.complete_work(proposals, ctx, id)?;
            Done
        }
        Action::Finalize { id } => {
            ProposalEngine.finalize(proposals, escrow, &*custodian, ctx, id)?;
            Done
        }
        Action::ProposalDispute { id } => {
            ProposalEngine.dispute(proposals, escrow, ctx, id)?;
            Done
        }
        Action::ArbiterApprove { arbiter, id } => {
            ProposalEngine.arbiter_approve(proposals, escrow, ctx, arbiter, id)?;
            Done
        }
        Action::ArbiterDeny { arbiter, id } => {
            ProposalEngine.arbiter_deny(proposals, escrow, ctx, arbiter, id)?;
            Done
        }
        Action::CancelProposal { id } => {
            ProposalEngine.cancel_proposal(proposals, escrow, ctx, id)?;
            Done
        }
        Action::CancelWorkInProgress { id } => {
            ProposalEngine.cancel_work_in_progress(proposals, escrow, ctx, id)?;
            Done
        }
        Action::ClearExpired { id } => {
            ProposalEngine.clear_expired(proposals, ctx, id)?;
            Done
        }
        Action::RemoveCompleted { id } => {
            ProposalEngine.remove_completed(proposals, ctx, id)?;
            Done
        }
        Action::Comment {
            commenter,
            id,
            comment,
            comment_category,
        } => {
            ProposalEngine.comment(proposals, &*custodian, ctx, commenter, id, &comment, &comment_category)?;
            Done
        }
        Action::VoteProposal { custodian: voter, id, vote } => Status {
            status: ProposalEngine.vote_proposal(proposals, &*custodian, ctx, voter, id, vote)?,
        },
        Action::VoteProposalFinalize { custodian: voter, id, vote } => Status {
            status: ProposalEngine.vote_proposal_finalize(proposals, &*custodian, ctx, voter, id, vote)?,
        },
        Action::DelegateVote {
            custodian: voter,
            id,
            delegatee,
        } => Status {
            status: ProposalEngine.delegate_vote(proposals, &*custodian, ctx, voter, id, delegatee)?,
        },
        Action::DelegateCategory {
            custodian: voter,
            category,
            delegatee,
        } => {
            ProposalEngine.delegate_category(proposals, &*custodian, ctx, voter, category, delegatee)?;
            Done
        }
        Action::UndelegateCategory {
            custodian: voter,
            category,
        } => {
            ProposalEngine.undelegate_category(proposals, &*custodian, ctx, voter, category)?;
            Done
        }
        Action::UpdateProposalVotes { id } => Status {
            status: ProposalEngine.update_votes(proposals, &*custodian, ctx, id)?,
        },
        Action::RefundDeposit { account } => {
            ProposalEngine.refund_deposit(proposals, ctx, account)?;
            Done
        }
        Action::ProposalConfig { config } => {
            ProposalEngine.update_config(proposals, ctx, config)?;
            Done
        }
        Action::SetProposalFee { fee } => {
            ProposalEngine.set_proposal_fee(proposals, ctx, fee)?;
            Done
        }
        Action::MinDuration { seconds } => {
            ProposalEngine.set_min_duration(proposals, ctx, seconds)?;
            Done
        }
        Action::AddProposalWhitelist { list, account, rating } => {
            ProposalEngine.add_whitelist(proposals, ctx, list, account, rating)?;
            Done
        }
        Action::UpdateProposalWhitelist { list, account, rating } => {
            ProposalEngine.update_whitelist(proposals, ctx, list, account, rating)?;
            Done
        }
        Action::RemoveProposalWhitelist { list, account } => {
            ProposalEngine.remove_whitelist(proposals, ctx, list, account)?;
            Done
        }
        Action::SafeRemoveArbiter { arbiter } => {
            ProposalEngine.safe_remove_arbiter(proposals, ctx, arbiter)?;
            Done
        }
    };
    Ok(outcome)
}
