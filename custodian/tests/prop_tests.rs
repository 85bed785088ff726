use proptest::prelude::*;

use dac_custodian::candidate::{decayed_index, rank_for};
use dac_custodian::{CandidateRegistry, CustodianState, ElectionConfig, InboundObserver, VoteTarget};
use dac_messages::{AccountWeightDelta, Outbox};
use dac_nullables::NullWorld;
use dac_types::{
    AccountName, Asset, Authorization, ExtendedAsset, ExtendedSymbol, Symbol, Tenant, Timestamp,
};
use std::collections::BTreeMap;

const CANDIDATES: [&str; 4] = ["cand1", "cand2", "cand3", "cand4"];
const VOTERS: [&str; 5] = ["voter1", "voter2", "voter3", "voter4", "prox"];

fn name(s: &str) -> AccountName {
    s.parse().unwrap()
}

fn tenant() -> Tenant {
    Tenant {
        dac_id: name("propdac"),
        owner: name("owner"),
        title: String::new(),
        symbol: ExtendedSymbol::new(Symbol::new("DAC", 4).unwrap(), name("token")),
        accounts: BTreeMap::new(),
    }
}

fn config() -> ElectionConfig {
    let symbol = Symbol::new("DAC", 4).unwrap();
    let lockup = ExtendedAsset::new(Asset::zero(symbol), name("token"));
    let mut config = ElectionConfig::new(lockup, ExtendedAsset::new(Asset::new(1_000, symbol), name("token")));
    config.maxvotes = 3;
    config
}

struct Sim {
    world: NullWorld,
    tenant: Tenant,
    state: CustodianState,
    now: Timestamp,
}

impl Sim {
    fn new() -> Self {
        let world = NullWorld::new();
        for account in CANDIDATES.iter().chain(VOTERS.iter()) {
            world.tokens.add_member(name(account), name("token"));
        }
        let mut sim = Self {
            world,
            tenant: tenant(),
            state: CustodianState::new(config()),
            now: Timestamp::new(1_000),
        };
        for cand in CANDIDATES {
            sim.act(cand, |s, ctx| CandidateRegistry.nominate_unpaid(s, ctx, name(cand)).is_ok());
        }
        sim.act("prox", |s, ctx| CandidateRegistry.register_proxy(s, ctx, name("prox")).is_ok());
        sim
    }

    fn act<T>(
        &mut self,
        signer: &str,
        f: impl FnOnce(&mut CustodianState, &mut dac_messages::ActionContext<'_>) -> T,
    ) -> T {
        let auth = Authorization::signed_by(name(signer));
        let mut outbox = Outbox::new();
        let mut ctx = self.world.context(&self.tenant, self.now, &auth, &mut outbox);
        f(&mut self.state, &mut ctx)
    }

    fn own_weight(&self, voter: &AccountName) -> i64 {
        self.state.weights.get(voter).map_or(0, |w| w.weight)
    }

    fn quorum_weight(&self, voter: &AccountName) -> i64 {
        self.state.weights.get(voter).map_or(0, |w| w.weight_quorum)
    }
}

#[derive(Clone, Debug)]
enum Op {
    Vote { voter: usize, picks: Vec<usize> },
    Delegate { voter: usize },
    Remove { voter: usize },
    Weight { voter: usize, delta: i64 },
    Tick(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..VOTERS.len(), proptest::collection::vec(0..CANDIDATES.len(), 0..4))
            .prop_map(|(voter, picks)| Op::Vote { voter, picks }),
        (0..VOTERS.len() - 1).prop_map(|voter| Op::Delegate { voter }),
        (0..VOTERS.len()).prop_map(|voter| Op::Remove { voter }),
        (0..VOTERS.len(), -500i64..5_000).prop_map(|(voter, delta)| Op::Weight { voter, delta }),
        (1u64..10_000).prop_map(Op::Tick),
    ]
}

fn apply(sim: &mut Sim, op: Op) {
    match op {
        Op::Vote { voter, picks } => {
            let mut list: Vec<AccountName> = picks.iter().map(|i| name(CANDIDATES[*i])).collect();
            list.dedup();
            let v = VOTERS[voter];
            let _ = sim.act(v, |s, ctx| CandidateRegistry.vote_custodians(s, ctx, name(v), list));
        }
        Op::Delegate { voter } => {
            let v = VOTERS[voter];
            let _ = sim.act(v, |s, ctx| CandidateRegistry.vote_proxy(s, ctx, name(v), name("prox")));
        }
        Op::Remove { voter } => {
            let v = VOTERS[voter];
            let _ = sim.act(v, |s, ctx| CandidateRegistry.remove_vote(s, ctx, name(v)));
        }
        Op::Weight { voter, delta } => {
            let account = name(VOTERS[voter]);
            // keep cached weights non-negative so nothing clamps
            if sim.own_weight(&account) + delta < 0 || sim.quorum_weight(&account) + delta < 0 {
                return;
            }
            let deltas = [AccountWeightDelta {
                account,
                weight_delta: delta,
                weight_delta_quorum: delta,
            }];
            sim.act("token", |s, ctx| InboundObserver.weight_observe(s, ctx, &deltas))
                .unwrap();
        }
        Op::Tick(secs) => sim.now = sim.now.plus_secs(secs),
    }
}

fn check_conservation(sim: &Sim) -> Result<(), TestCaseError> {
    let state = &sim.state;
    let mut expected_power: BTreeMap<AccountName, i64> = BTreeMap::new();
    let mut expected_voters: BTreeMap<AccountName, u32> = BTreeMap::new();
    let mut proxy_total = 0i64;
    let mut quorum = 0i64;
    let mut links = 0i64;

    for vote in state.votes.iter() {
        quorum += sim.quorum_weight(&vote.voter);
        match &vote.target {
            VoteTarget::Candidates(names) => {
                let delegated = state.proxies.get(&vote.voter).map_or(0, |p| p.total_weight);
                let weight = sim.own_weight(&vote.voter) + delegated;
                links += names.len() as i64;
                for cand in names {
                    *expected_power.entry(*cand).or_default() += weight;
                    *expected_voters.entry(*cand).or_default() += 1;
                }
            }
            VoteTarget::Proxy(_) => proxy_total += sim.own_weight(&vote.voter),
        }
    }

    prop_assert_eq!(state.proxies.get(&name("prox")).unwrap().total_weight, proxy_total);
    for cand in state.candidates.iter() {
        let power = expected_power.get(&cand.candidate_name).copied().unwrap_or(0);
        prop_assert_eq!(cand.total_vote_power as i64, power, "power of {}", cand.candidate_name);
        let voters = expected_voters.get(&cand.candidate_name).copied().unwrap_or(0);
        prop_assert_eq!(cand.number_voters, voters, "voters of {}", cand.candidate_name);
        prop_assert!(cand.avg_vote_time_stamp <= sim.now);
    }
    prop_assert_eq!(state.globals.total_weight_of_votes, quorum);
    prop_assert_eq!(state.globals.total_votes_on_candidates, links);
    Ok(())
}

proptest! {
    /// Candidate power, proxy totals and vote totals always equal what the
    /// current vote records imply.
    #[test]
    fn weight_is_conserved(ops in proptest::collection::vec(op(), 1..60)) {
        let mut sim = Sim::new();
        for op in ops {
            apply(&mut sim, op);
            check_conservation(&sim)?;
        }
    }

    /// The active counter matches the rows after any mix of nominations and
    /// withdrawals.
    #[test]
    fn active_count_matches_rows(ops in proptest::collection::vec((0..CANDIDATES.len(), 0u8..3), 1..40)) {
        let mut sim = Sim::new();
        for (idx, action) in ops {
            let cand = CANDIDATES[idx];
            let _ = sim.act(cand, |s, ctx| match action {
                0 => CandidateRegistry.nominate_unpaid(s, ctx, name(cand)),
                1 => CandidateRegistry.withdraw(s, ctx, name(cand)),
                _ => CandidateRegistry.remove(s, ctx, name(cand)),
            });
            prop_assert_eq!(
                sim.state.globals.number_active_candidates as usize,
                sim.state.active_candidate_count()
            );
        }
    }

    /// More support at the same average time never ranks worse.
    #[test]
    fn rank_is_monotonic_in_power(
        low in 0u64..1_000_000_000,
        extra in 0u64..1_000_000_000,
        at in 0u64..2_000_000_000,
    ) {
        let t = Timestamp::new(at);
        prop_assert!(rank_for(low + extra, t) <= rank_for(low, t));
        prop_assert_eq!(rank_for(low, t), u64::MAX - decayed_index(low, t));
    }

    /// More recent support at the same power never ranks worse.
    #[test]
    fn rank_is_monotonic_in_recency(
        power in 0u64..1_000_000_000,
        earlier in 0u64..2_000_000_000,
        later_by in 0u64..100_000_000,
    ) {
        let old = rank_for(power, Timestamp::new(earlier));
        let new = rank_for(power, Timestamp::new(earlier + later_by));
        prop_assert!(new <= old);
    }
}
