//! End-to-end flows through the transactional runtime.

use dac_custodian::ElectionConfig;
use dac_messages::{AccountWeightDelta, MessageKind, OutboundAction};
use dac_nullables::{
    NullBudgetSource, NullClock, NullDirectory, NullStateStore, NullTokenLedger, RecordingHandler,
};
use dac_proposals::{NewProposal, ProposalConfig, ProposalStatus, PublicVote, WhitelistKind};
use dac_runtime::{Action, ActionOutcome, DacRuntime, RuntimeConfig, RuntimeError};
use dac_types::{
    AccountName, AccountType, Asset, Authorization, DacId, ErrorKind, ExtendedAsset, ExtendedSymbol, Symbol,
    Tenant, Timestamp,
};
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

const DAY: u64 = 86_400;

fn name(s: &str) -> AccountName {
    s.parse().unwrap()
}

fn signed(account: &str) -> Authorization {
    Authorization::signed_by(name(account))
}

fn tlm(amount: i64) -> ExtendedAsset {
    ExtendedAsset::new(Asset::new(amount, Symbol::new("TLM", 4).unwrap()), name("alien.worlds"))
}

fn dac_token(amount: i64) -> ExtendedAsset {
    ExtendedAsset::new(Asset::new(amount, Symbol::new("DAC", 4).unwrap()), name("token"))
}

fn tenant(dac_id: &str) -> Tenant {
    Tenant {
        dac_id: name(dac_id),
        owner: name("owner"),
        title: "Test DAC".into(),
        symbol: ExtendedSymbol::new(Symbol::new("DAC", 4).unwrap(), name("token")),
        accounts: BTreeMap::new(),
    }
    .with_account(AccountType::Treasury, name("treasury"))
    .with_account(AccountType::Escrow, name("escrow"))
    .with_account(AccountType::Proposals, name("proposals"))
}

/// Three seats, tiers 2/2/1, pay cap 1000 TLM, no lockup.
fn election_config() -> ElectionConfig {
    let mut config = ElectionConfig::new(dac_token(0), tlm(10_000_000));
    config.numelected = 3;
    config.maxvotes = 3;
    config.auth_threshold_high = 2;
    config.auth_threshold_mid = 2;
    config.auth_threshold_low = 1;
    config
}

struct World {
    runtime: DacRuntime,
    store: Arc<NullStateStore>,
    directory: Arc<NullDirectory>,
    tokens: Arc<NullTokenLedger>,
    budget: Arc<NullBudgetSource>,
    clock: Arc<NullClock>,
    recorder: Arc<RecordingHandler>,
}

impl World {
    fn new() -> Self {
        let store = Arc::new(NullStateStore::new());
        let directory = Arc::new(NullDirectory::new());
        let tokens = Arc::new(NullTokenLedger::new());
        let budget = Arc::new(NullBudgetSource::new());
        let clock = Arc::new(NullClock::new(1_000_000));
        let recorder = Arc::new(RecordingHandler::new());
        let mut runtime = DacRuntime::new(
            store.clone(),
            directory.clone(),
            tokens.clone(),
            budget.clone(),
            clock.clone(),
        );
        runtime.register_handler(MessageKind::Transfer, tokens.clone());
        for kind in [
            MessageKind::Transfer,
            MessageKind::UpdatePermission,
            MessageKind::GovernanceChanged,
            MessageKind::AssertUnlock,
        ] {
            runtime.register_handler(kind, recorder.clone());
        }
        let world = Self {
            runtime,
            store,
            directory,
            tokens,
            budget,
            clock,
            recorder,
        };
        world.add_tenant("testdac");
        world
    }

    fn add_tenant(&self, dac_id: &str) {
        self.directory.add_tenant(tenant(dac_id));
        self.runtime
            .init_tenant(&name(dac_id), election_config(), ProposalConfig::default())
            .unwrap();
    }

    fn dac(&self) -> DacId {
        name("testdac")
    }

    fn exec(&self, auth: Authorization, action: Action) -> Result<ActionOutcome, RuntimeError> {
        self.runtime.execute(&self.dac(), &auth, action).map(|r| r.outcome)
    }

    fn members(&self, accounts: &[&str]) {
        for account in accounts {
            self.tokens.add_member(name(account), name("token"));
        }
    }

    fn weight(&self, voter: &str, weight: i64) {
        self.exec(
            signed("token"),
            Action::WeightObserve {
                deltas: vec![AccountWeightDelta {
                    account: name(voter),
                    weight_delta: weight,
                    weight_delta_quorum: weight,
                }],
            },
        )
        .unwrap();
    }

    fn nominate(&self, cand: &str) {
        self.members(&[cand]);
        self.exec(
            signed(cand),
            Action::Nominate {
                cand: name(cand),
                requestedpay: tlm(0).quantity,
            },
        )
        .unwrap();
    }

    fn vote(&self, voter: &str, cands: &[&str]) -> Result<ActionOutcome, RuntimeError> {
        self.exec(
            signed(voter),
            Action::VoteCustodians {
                voter: name(voter),
                candidates: cands.iter().map(|c| name(c)).collect(),
            },
        )
    }

    fn new_period(&self) -> Result<ActionOutcome, RuntimeError> {
        self.exec(
            Authorization::anonymous(),
            Action::NewPeriod {
                message: "period".into(),
            },
        )
    }

    /// Five candidates, each backed by one voter with a distinct weight.
    fn contested_election(&self) {
        self.tokens.set_supply(dac_token(1_000_000_000));
        let field = [
            ("cand1", "voter1", 100_000_000),
            ("cand2", "voter2", 90_000_000),
            ("cand3", "voter3", 80_000_000),
            ("cand4", "voter4", 70_000_000),
            ("cand5", "voter5", 60_000_000),
        ];
        for (cand, voter, weight) in field {
            self.nominate(cand);
            self.members(&[voter]);
            self.weight(voter, weight);
            self.vote(voter, &[cand]).unwrap();
        }
    }
}

// ── Elections ───────────────────────────────────────────────────────────

#[test]
fn vote_weight_reaches_the_candidate() {
    let w = World::new();
    w.nominate("alice");
    w.members(&["bob"]);
    w.weight("bob", 500);
    w.vote("bob", &["alice"]).unwrap();

    let state = w.runtime.state(&w.dac()).unwrap();
    let alice = state.custodian.candidates.get(&name("alice")).unwrap();
    assert_eq!(alice.total_vote_power, 500);
    assert_eq!(alice.number_voters, 1);
}

#[test]
fn election_seats_the_top_ranked_candidates() {
    let w = World::new();
    w.contested_election();

    w.new_period().unwrap();
    let state = w.runtime.state(&w.dac()).unwrap();
    let pending: Vec<AccountName> = state.custodian.pending_custodians.keys().copied().collect();
    assert_eq!(pending, vec![name("cand1"), name("cand2"), name("cand3")]);
    assert!(state.custodian.custodians.is_empty());

    let err = w.new_period().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);

    w.clock.advance(301);
    w.new_period().unwrap();
    let state = w.runtime.state(&w.dac()).unwrap();
    let serving: Vec<AccountName> = state.custodian.custodians.keys().copied().collect();
    assert_eq!(serving, vec![name("cand1"), name("cand2"), name("cand3")]);
    assert!(state.custodian.pending_custodians.is_empty());
    assert_eq!(w.recorder.count(MessageKind::UpdatePermission), 4);
    assert_eq!(w.recorder.count(MessageKind::GovernanceChanged), 1);
}

#[test]
fn supply_at_the_threshold_blocks_the_election() {
    let w = World::new();
    w.contested_election();
    w.tokens.set_supply(dac_token(100_000_000));
    let err = w.new_period().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientSupport);
    assert!(w.runtime.state(&w.dac()).unwrap().custodian.pending_custodians.is_empty());
}

#[test]
fn budget_is_claimed_once_per_period() {
    let w = World::new();
    w.contested_election();
    w.tokens.set_balance(name("treasury"), tlm(10_000_000));
    w.budget.set(w.dac(), 500);

    let err = w.exec(signed("owner"), Action::ClaimBudget).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);

    w.new_period().unwrap();
    w.clock.advance(301);
    w.new_period().unwrap();

    let outcome = w.exec(signed("owner"), Action::ClaimBudget).unwrap();
    assert!(matches!(outcome, ActionOutcome::Budget { plan } if plan.spendings > 0));
    let err = w.exec(signed("owner"), Action::ClaimBudget).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
}

#[test]
fn removing_a_candidate_twice_is_harmless() {
    let w = World::new();
    w.nominate("alice");
    let remove = || Action::RemoveCandidate { cand: name("alice") };
    w.exec(signed("alice"), remove()).unwrap();
    w.exec(signed("alice"), remove()).unwrap();
    let state = w.runtime.state(&w.dac()).unwrap();
    assert!(!state.custodian.candidates.get(&name("alice")).unwrap().is_active);
    assert_eq!(state.custodian.globals.number_active_candidates, 0);
}

// ── Transactions ────────────────────────────────────────────────────────

#[test]
fn failed_action_changes_nothing() {
    let w = World::new();
    w.nominate("alice");
    let before = w.store.save_count();
    let snapshot = w.runtime.state(&w.dac()).unwrap().encode().unwrap();

    let err = w.vote("mallory", &["alice"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(w.store.save_count(), before);
    assert_eq!(w.runtime.state(&w.dac()).unwrap().encode().unwrap(), snapshot);
    assert!(w.recorder.received().is_empty());
}

#[test]
fn tenants_are_isolated() {
    let w = World::new();
    w.add_tenant("otherdac");
    w.nominate("alice");
    let other = w.runtime.state(&name("otherdac")).unwrap();
    assert!(other.custodian.candidates.is_empty());
    assert_eq!(w.runtime.tenants().unwrap(), vec![name("otherdac"), name("testdac")]);
}

#[test]
fn tenants_initialise_once() {
    let w = World::new();
    let err = w
        .runtime
        .init_tenant(&w.dac(), election_config(), ProposalConfig::default())
        .unwrap_err();
    assert!(matches!(err, RuntimeError::TenantExists(_)));

    let err = w
        .runtime
        .execute(&name("ghostdac"), &signed("owner"), Action::ClaimBudget)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ── Escrow ──────────────────────────────────────────────────────────────

fn fund(w: &World, leg: &str, amount: i64) -> Result<ActionOutcome, RuntimeError> {
    w.exec(
        signed("sender"),
        Action::Transfer {
            from: name("sender"),
            to: name("escrow"),
            quantity: tlm(amount),
            memo: format!("{leg}:job1:testdac"),
        },
    )
}

#[test]
fn approved_escrow_pays_arbiter_then_receiver_exactly_once() {
    let w = World::new();
    w.tokens.set_balance(name("escrow"), tlm(1_050_000));
    w.exec(
        signed("sender"),
        Action::EscrowInit {
            sender: name("sender"),
            receiver: name("receiver"),
            arb: name("arbiter"),
            expires: Timestamp::new(1_000_000 + 30 * DAY),
            memo: "job".into(),
            ext_reference: name("job1"),
        },
    )
    .unwrap();
    assert!(matches!(fund(&w, "rec", 1_000_000).unwrap(), ActionOutcome::Funded { .. }));
    fund(&w, "arb", 50_000).unwrap();
    assert!(fund(&w, "rec", 1).is_err());

    let approve = || Action::EscrowApprove {
        key: name("job1"),
        approver: name("sender"),
    };
    let report = w.runtime.execute(&w.dac(), &signed("sender"), approve()).unwrap();
    let paid: Vec<(AccountName, i64)> = report
        .messages
        .iter()
        .filter_map(|m| match m {
            OutboundAction::Transfer { to, quantity, .. } => Some((*to, quantity.quantity.amount)),
            _ => None,
        })
        .collect();
    assert_eq!(paid, vec![(name("arbiter"), 50_000), (name("receiver"), 1_000_000)]);
    assert_eq!(report.dispatch.failed, 0);

    let err = w.runtime.execute(&w.dac(), &signed("sender"), approve()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let symbol = Symbol::new("TLM", 4).unwrap();
    assert_eq!(w.tokens.balance(name("receiver"), name("alien.worlds"), symbol).amount, 1_000_000);
    assert_eq!(w.tokens.balance(name("arbiter"), name("alien.worlds"), symbol).amount, 50_000);
}

#[test]
fn transfers_to_other_accounts_are_rejected() {
    let w = World::new();
    let err = w
        .exec(
            signed("sender"),
            Action::Transfer {
                from: name("sender"),
                to: name("stranger"),
                quantity: tlm(10),
                memo: String::new(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, RuntimeError::UnroutedTransfer(_)));
}

// ── Proposals ───────────────────────────────────────────────────────────

fn proposal_world() -> World {
    let w = World::new();
    w.members(&["worker"]);
    w.tokens.set_balance(name("treasury"), tlm(10_000_000));
    let custodians = ["cust1", "cust2", "cust3", "cust4", "cust5"];
    w.exec(
        signed("owner"),
        Action::AppointCustodians {
            custs: custodians.map(name).to_vec(),
        },
    )
    .unwrap();
    for (list, account) in [(WhitelistKind::Receiver, "worker"), (WhitelistKind::Arbiter, "arb")] {
        w.exec(
            Authorization::contract(),
            Action::AddProposalWhitelist {
                list,
                account: name(account),
                rating: 1,
            },
        )
        .unwrap();
    }
    w.exec(
        signed("worker"),
        Action::CreateProposal(NewProposal {
            proposer: name("worker"),
            title: "Build a bridge".into(),
            summary: "A bridge across the river".into(),
            arbiter: name("arb"),
            proposal_pay: tlm(1_000_000),
            arbiter_pay: tlm(50_000),
            content_hash: "abc123".into(),
            id: name("prop1"),
            category: 1,
            job_duration: (7 * DAY) as u32,
        }),
    )
    .unwrap();
    w.exec(
        signed("arb"),
        Action::ArbiterAgree {
            arbiter: name("arb"),
            id: name("prop1"),
        },
    )
    .unwrap();
    w
}

fn vote_prop(w: &World, custodian: &str, vote: PublicVote) -> ActionOutcome {
    w.exec(
        signed(custodian),
        Action::VoteProposal {
            custodian: name(custodian),
            id: name("prop1"),
            vote,
        },
    )
    .unwrap()
}

#[test]
fn delegated_vote_completes_the_threshold_and_work_is_paid() {
    let w = proposal_world();
    for custodian in ["cust1", "cust2", "cust3"] {
        vote_prop(&w, custodian, PublicVote::Approve);
    }
    let start = || Action::StartWork { id: name("prop1") };
    assert_eq!(
        w.exec(signed("worker"), start()).unwrap_err().kind(),
        ErrorKind::InsufficientSupport
    );

    w.exec(
        signed("cust4"),
        Action::DelegateVote {
            custodian: name("cust4"),
            id: name("prop1"),
            delegatee: name("cust1"),
        },
    )
    .unwrap();
    let outcome = w.exec(signed("worker"), start()).unwrap();
    assert_eq!(
        outcome,
        ActionOutcome::Status {
            status: ProposalStatus::WorkInProgress
        }
    );
    let state = w.runtime.state(&w.dac()).unwrap();
    assert!(state.escrow.get(&name("prop1")).unwrap().is_funded());

    w.exec(signed("worker"), Action::CompleteWork { id: name("prop1") })
        .unwrap();
    w.exec(
        signed("cust2"),
        Action::VoteProposalFinalize {
            custodian: name("cust2"),
            id: name("prop1"),
            vote: PublicVote::Approve,
        },
    )
    .unwrap();
    w.exec(Authorization::anonymous(), Action::Finalize { id: name("prop1") })
        .unwrap();

    let state = w.runtime.state(&w.dac()).unwrap();
    assert_eq!(
        state.proposals.proposal(&name("prop1")).unwrap().state,
        ProposalStatus::Completed
    );
    assert!(state.escrow.get(&name("prop1")).is_err());
    let symbol = Symbol::new("TLM", 4).unwrap();
    assert_eq!(w.tokens.balance(name("worker"), name("alien.worlds"), symbol).amount, 1_000_000);
    assert_eq!(w.tokens.balance(name("arb"), name("alien.worlds"), symbol).amount, 50_000);
    assert_eq!(w.tokens.balance(name("treasury"), name("alien.worlds"), symbol).amount, 8_950_000);
}

#[test]
fn busy_arbiter_survives_safe_removal() {
    let w = proposal_world();
    let err = w
        .exec(
            Authorization::contract(),
            Action::SafeRemoveArbiter { arbiter: name("arb") },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
}

// ── Configuration ───────────────────────────────────────────────────────

const CONFIG: &str = r#"
[[tenants]]
[tenants.tenant]
dac_id = "filedac"
owner = "owner"
symbol = { symbol = "4,DAC", contract = "token" }

[tenants.tenant.accounts]
TREASURY = "treasury"

[tenants.election]
lockupasset = { quantity = "0.0000 DAC", contract = "token" }
requested_pay_max = { quantity = "1000.0000 TLM", contract = "alien.worlds" }
numelected = 3
maxvotes = 3
auth_threshold_high = 2
auth_threshold_mid = 2
auth_threshold_low = 1

[tenants.proposals]
proposal_threshold = 3
"#;

#[test]
fn tenants_initialise_from_a_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    let config = RuntimeConfig::from_toml_file(file.path()).unwrap();

    let w = World::new();
    w.directory.add_tenant(config.tenants[0].tenant.clone());
    assert_eq!(w.runtime.init_from_config(&config).unwrap(), 1);
    assert_eq!(w.runtime.init_from_config(&config).unwrap(), 0);

    let state = w.runtime.state(&name("filedac")).unwrap();
    assert_eq!(state.custodian.config().numelected, 3);
    assert_eq!(state.proposals.config.proposal_threshold, 3);
}
