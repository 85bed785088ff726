use crate::engine::{NewProposal, ProposalEngine};
use crate::proposal::{ProposalStatus, PublicVote, Whitelisted};
use crate::state::ProposalState;
use dac_custodian::CustodianRoster;
use dac_escrow::EscrowState;
use dac_messages::{ActionContext, OutboundAction, Outbox};
use dac_nullables::NullWorld;
use dac_types::{
    AccountName, AccountType, Asset, Authorization, ExtendedAsset, ExtendedSymbol, Symbol, Tenant, Timestamp,
};
use std::collections::BTreeMap;

pub fn name(s: &str) -> AccountName {
    s.parse().unwrap()
}

pub fn signed(account: &str) -> Authorization {
    Authorization::signed_by(name(account))
}

pub fn contract() -> Authorization {
    Authorization::contract()
}

pub fn tlm(amount: i64) -> ExtendedAsset {
    ExtendedAsset::new(Asset::new(amount, Symbol::new("TLM", 4).unwrap()), name("alien.worlds"))
}

pub const DAY: u64 = 86_400;

pub struct Roster(pub Vec<AccountName>);

impl CustodianRoster for Roster {
    fn is_custodian(&self, account: &AccountName) -> bool {
        self.0.contains(account)
    }

    fn custodian_names(&self) -> Vec<AccountName> {
        self.0.clone()
    }
}

pub struct Harness {
    pub world: NullWorld,
    pub tenant: Tenant,
    pub state: ProposalState,
    pub escrow: EscrowState,
    pub roster: Roster,
    pub now: Timestamp,
    pub outbox: Outbox,
}

impl Harness {
    /// Five custodians, `worker` whitelisted as receiver and `arb` as arbiter.
    pub fn new() -> Self {
        let tenant = Tenant {
            dac_id: name("testdac"),
            owner: name("owner"),
            title: String::new(),
            symbol: ExtendedSymbol::new(Symbol::new("DAC", 4).unwrap(), name("token")),
            accounts: BTreeMap::new(),
        }
        .with_account(AccountType::Treasury, name("treasury"))
        .with_account(AccountType::Escrow, name("escrow"))
        .with_account(AccountType::Proposals, name("proposals"));
        let world = NullWorld::new();
        world.tokens.add_member(name("worker"), name("token"));
        let mut state = ProposalState::default();
        for (list, account) in [
            (&mut state.receiver_whitelist, "worker"),
            (&mut state.arbiter_whitelist, "arb"),
        ] {
            list.insert(Whitelisted {
                account: name(account),
                rating: 1,
            })
            .unwrap();
        }
        let roster = Roster(["cust1", "cust2", "cust3", "cust4", "cust5"].map(name).to_vec());
        Self {
            world,
            tenant,
            state,
            escrow: EscrowState::new(),
            roster,
            now: Timestamp::new(1_000_000),
            outbox: Outbox::new(),
        }
    }

    pub fn run<T>(
        &mut self,
        auth: Authorization,
        f: impl FnOnce(&mut ProposalState, &mut EscrowState, &Roster, &mut ActionContext<'_>) -> T,
    ) -> T {
        let Harness {
            world,
            tenant,
            state,
            escrow,
            roster,
            now,
            outbox,
        } = self;
        let mut ctx = world.context(tenant, *now, &auth, outbox);
        f(state, escrow, roster, &mut ctx)
    }

    pub fn advance(&mut self, secs: u64) {
        self.now = self.now.plus_secs(secs);
    }

    pub fn new_proposal(id: &str) -> NewProposal {
        NewProposal {
            proposer: name("worker"),
            title: "Build a bridge".into(),
            summary: "A bridge across the river".into(),
            arbiter: name("arb"),
            proposal_pay: tlm(1_000_000),
            arbiter_pay: tlm(50_000),
            content_hash: "abc123".into(),
            id: name(id),
            category: 1,
            job_duration: (7 * DAY) as u32,
        }
    }

    pub fn create(&mut self, id: &str) {
        let args = Self::new_proposal(id);
        self.run(signed("worker"), |s, _, _, ctx| ProposalEngine.create_proposal(s, ctx, args))
            .unwrap();
    }

    pub fn agree(&mut self, id: &str) {
        self.run(signed("arb"), |s, _, _, ctx| {
            ProposalEngine.arbiter_agree(s, ctx, name("arb"), name(id))
        })
        .unwrap();
    }

    pub fn vote(&mut self, custodian: &str, id: &str, vote: PublicVote) -> ProposalStatus {
        self.run(signed(custodian), |s, _, r, ctx| {
            ProposalEngine.vote_proposal(s, r, ctx, name(custodian), name(id), vote)
        })
        .unwrap()
    }

    /// Created, agreed and approved by four custodians.
    pub fn approved(&mut self, id: &str) {
        self.create(id);
        self.agree(id);
        for custodian in ["cust1", "cust2", "cust3", "cust4"] {
            self.vote(custodian, id, PublicVote::Approve);
        }
    }

    /// Approved and started; the outbox is cleared.
    pub fn started(&mut self, id: &str) {
        self.approved(id);
        let status = self
            .run(signed("worker"), |s, e, r, ctx| ProposalEngine.start_work(s, e, r, ctx, name(id)))
            .unwrap();
        assert_eq!(status, ProposalStatus::WorkInProgress);
        self.outbox.drain();
    }

    /// Started and reported complete.
    pub fn delivered(&mut self, id: &str) {
        self.started(id);
        self.run(signed("worker"), |s, _, _, ctx| ProposalEngine.complete_work(s, ctx, name(id)))
            .unwrap();
    }

    pub fn status(&self, id: &str) -> ProposalStatus {
        self.state.proposal(&name(id)).unwrap().state
    }

    /// Drained transfers as `(from, to, amount)`.
    pub fn transfers(&mut self) -> Vec<(AccountName, AccountName, i64)> {
        self.outbox
            .drain()
            .into_iter()
            .filter_map(|m| match m {
                OutboundAction::Transfer { from, to, quantity, .. } => Some((from, to, quantity.quantity.amount)),
                _ => None,
            })
            .collect()
    }
}
