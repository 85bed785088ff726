//! Escrow state machine.
//!
//! ```text
//! init ──► unfunded ──fund──► funded ──approve (sender)──► paid to receiver
//!             │                  │ ──refund──────────────► returned to sender
//!           cancel                └─dispute─► disputed ──approve (arb)────► paid to receiver
//!                                                     └─disapprove (arb)─► returned to sender
//! ```
//!
//! Every terminal transition erases the record. The engine's own authority
//! skips the signer checks, never the state checks.

use crate::error::EscrowError;
use crate::escrow::{Escrow, EscrowState, FundingLeg, FundingMemo};
use dac_messages::ActionContext;
use dac_types::{AccountName, AccountType, ExtendedAsset, Timestamp};
use tracing::{debug, info};

pub struct EscrowService;

fn require_auth(ctx: &ActionContext<'_>, account: &AccountName) -> Result<(), EscrowError> {
    if !ctx.auth.has_auth_or_contract(account) {
        return Err(EscrowError::NotAuthorized(account.to_string()));
    }
    Ok(())
}

fn escrow_account(ctx: &ActionContext<'_>) -> Result<AccountName, EscrowError> {
    ctx.account_for_type(AccountType::Escrow)
        .ok_or(EscrowError::MissingAccount(AccountType::Escrow))
}

impl EscrowService {
    /// `init`: open an unfunded escrow under `ext_reference`.
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        &self,
        state: &mut EscrowState,
        ctx: &ActionContext<'_>,
        sender: AccountName,
        receiver: AccountName,
        arb: AccountName,
        expires: Timestamp,
        memo: String,
        ext_reference: AccountName,
    ) -> Result<(), EscrowError> {
        require_auth(ctx, &sender)?;
        if receiver == arb {
            return Err(EscrowError::InvalidParties("receiver cannot be the arbiter"));
        }
        if sender == arb {
            return Err(EscrowError::InvalidParties("sender cannot be the arbiter"));
        }
        if expires <= ctx.now {
            return Err(EscrowError::ExpiryInPast {
                expires: expires.as_secs(),
                now: ctx.now.as_secs(),
            });
        }
        if state.escrows.contains(&ext_reference) {
            return Err(EscrowError::AlreadyExists(ext_reference));
        }
        state.escrows.insert(Escrow {
            key: ext_reference,
            sender,
            receiver,
            arb,
            receiver_pay: None,
            arbiter_pay: None,
            expires,
            memo,
            disputed: false,
        })?;
        info!(dac = %ctx.dac_id(), key = %ext_reference, %sender, %receiver, %arb, "escrow opened");
        Ok(())
    }

    /// Incoming transfer to the escrow account. The memo picks the escrow and
    /// the leg; each leg takes exactly one deposit.
    pub fn fund(
        &self,
        state: &mut EscrowState,
        ctx: &ActionContext<'_>,
        from: AccountName,
        quantity: ExtendedAsset,
        memo: &str,
    ) -> Result<FundingLeg, EscrowError> {
        require_auth(ctx, &from)?;
        let target: FundingMemo = memo.parse()?;
        if target.dac_id != ctx.dac_id() {
            return Err(EscrowError::WrongTenant(target.dac_id));
        }
        if !quantity.quantity.is_positive() {
            return Err(EscrowError::InvalidAmount(quantity.to_string()));
        }
        let escrow = state.get(&target.key)?;
        let already = match target.leg {
            FundingLeg::Receiver => escrow.receiver_pay.is_some(),
            FundingLeg::Arbiter => escrow.arbiter_pay.is_some(),
        };
        if already {
            return Err(EscrowError::AlreadyFunded {
                key: target.key,
                leg: match target.leg {
                    FundingLeg::Receiver => "receiver",
                    FundingLeg::Arbiter => "arbiter",
                },
            });
        }
        state.escrows.modify(&target.key, |e| match target.leg {
            FundingLeg::Receiver => e.receiver_pay = Some(quantity),
            FundingLeg::Arbiter => e.arbiter_pay = Some(quantity),
        })?;
        info!(dac = %ctx.dac_id(), key = %target.key, leg = %target.leg, %quantity, "escrow funded");
        Ok(target.leg)
    }

    /// `approve`: release the payment to the receiver. The sender approves an
    /// undisputed escrow, the arbiter a disputed one.
    pub fn approve(
        &self,
        state: &mut EscrowState,
        ctx: &mut ActionContext<'_>,
        key: AccountName,
        approver: AccountName,
    ) -> Result<(), EscrowError> {
        require_auth(ctx, &approver)?;
        let escrow = state.get(&key)?;
        let receiver_pay = escrow.receiver_pay.ok_or(EscrowError::NotFunded(key))?;
        if approver == escrow.arb {
            if !escrow.disputed {
                return Err(EscrowError::NotDisputed(key));
            }
        } else if approver == escrow.sender {
            if escrow.disputed {
                return Err(EscrowError::Disputed(key));
            }
        } else {
            return Err(EscrowError::NotParty(approver));
        }
        let from = escrow_account(ctx)?;
        let escrow = state.escrows.remove(&key).ok_or(EscrowError::NotFound(key))?;
        pay_arbiter(ctx, from, &escrow);
        ctx.transfer(from, escrow.receiver, receiver_pay, escrow.memo.clone());
        info!(dac = %ctx.dac_id(), %key, %approver, receiver = %escrow.receiver, "escrow approved");
        Ok(())
    }

    /// `disapprove`: the arbiter rules against the receiver of a disputed
    /// escrow. The arbiter is still paid; the sender gets the payment back.
    pub fn disapprove(
        &self,
        state: &mut EscrowState,
        ctx: &mut ActionContext<'_>,
        key: AccountName,
        disapprover: AccountName,
    ) -> Result<(), EscrowError> {
        require_auth(ctx, &disapprover)?;
        let escrow = state.get(&key)?;
        let receiver_pay = escrow.receiver_pay.ok_or(EscrowError::NotFunded(key))?;
        if disapprover != escrow.arb {
            return Err(EscrowError::NotArbiter);
        }
        if !escrow.disputed {
            return Err(EscrowError::NotDisputed(key));
        }
        let from = escrow_account(ctx)?;
        let escrow = state.escrows.remove(&key).ok_or(EscrowError::NotFound(key))?;
        pay_arbiter(ctx, from, &escrow);
        ctx.transfer(from, escrow.sender, receiver_pay, escrow.memo.clone());
        info!(dac = %ctx.dac_id(), %key, sender = %escrow.sender, "escrow disapproved");
        Ok(())
    }

    /// `refund`: the receiver may hand the funds back at any time, the sender
    /// only once the escrow has expired. Whatever legs were paid in go back to
    /// the sender, so an escrow holding only the arbiter fee can still close.
    pub fn refund(
        &self,
        state: &mut EscrowState,
        ctx: &mut ActionContext<'_>,
        key: AccountName,
    ) -> Result<(), EscrowError> {
        let escrow = state.get(&key)?;
        if !ctx.auth.has_auth_or_contract(&escrow.receiver) {
            if !ctx.has_auth(&escrow.sender) {
                return Err(EscrowError::NotAuthorized(escrow.sender.to_string()));
            }
            if ctx.now < escrow.expires {
                return Err(EscrowError::NotExpired {
                    key,
                    remaining: ctx.now.elapsed_since(escrow.expires),
                });
            }
        }
        if escrow.is_empty() {
            return Err(EscrowError::NotFunded(key));
        }
        if escrow.disputed {
            return Err(EscrowError::Disputed(key));
        }
        let from = escrow_account(ctx)?;
        let escrow = state.escrows.remove(&key).ok_or(EscrowError::NotFound(key))?;
        if let Some(pay) = escrow.receiver_pay {
            ctx.transfer(from, escrow.sender, pay, escrow.memo.clone());
        }
        if let Some(fee) = escrow.arbiter_pay {
            ctx.transfer(from, escrow.sender, fee, escrow.memo.clone());
        }
        info!(dac = %ctx.dac_id(), %key, sender = %escrow.sender, "escrow refunded");
        Ok(())
    }

    /// `dispute`: the receiver locks a funded escrow for arbitration.
    pub fn dispute(
        &self,
        state: &mut EscrowState,
        ctx: &ActionContext<'_>,
        key: AccountName,
    ) -> Result<(), EscrowError> {
        let escrow = state.get(&key)?;
        require_auth(ctx, &escrow.receiver)?;
        if !escrow.is_funded() {
            return Err(EscrowError::NotFunded(key));
        }
        if escrow.disputed {
            return Err(EscrowError::Disputed(key));
        }
        state.escrows.modify(&key, |e| e.disputed = true)?;
        info!(dac = %ctx.dac_id(), %key, "escrow disputed");
        Ok(())
    }

    /// `cancel`: the sender withdraws an escrow nobody has paid into.
    pub fn cancel(
        &self,
        state: &mut EscrowState,
        ctx: &ActionContext<'_>,
        key: AccountName,
    ) -> Result<(), EscrowError> {
        let escrow = state.get(&key)?;
        require_auth(ctx, &escrow.sender)?;
        if !escrow.is_empty() {
            return Err(EscrowError::Funded(key));
        }
        state.escrows.remove(&key).ok_or(EscrowError::NotFound(key))?;
        info!(dac = %ctx.dac_id(), %key, "escrow cancelled");
        Ok(())
    }
}

fn pay_arbiter(ctx: &mut ActionContext<'_>, from: AccountName, escrow: &Escrow) {
    match escrow.arbiter_pay {
        Some(fee) if fee.quantity.is_positive() => {
            ctx.transfer(from, escrow.arb, fee, escrow.memo.clone());
        }
        _ => debug!(key = %escrow.key, "no arbiter fee"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dac_messages::{Outbox, OutboundAction};
    use dac_nullables::NullWorld;
    use dac_types::{Asset, Authorization, ErrorKind, ExtendedSymbol, Symbol, Tenant};
    use std::collections::BTreeMap;

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    fn signed(account: &str) -> Authorization {
        Authorization::signed_by(name(account))
    }

    fn tlm(amount: i64) -> ExtendedAsset {
        ExtendedAsset::new(Asset::new(amount, Symbol::new("TLM", 4).unwrap()), name("alien.worlds"))
    }

    struct Harness {
        world: NullWorld,
        tenant: Tenant,
        state: EscrowState,
        now: Timestamp,
        outbox: Outbox,
    }

    impl Harness {
        fn new() -> Self {
            let tenant = Tenant {
                dac_id: name("testdac"),
                owner: name("owner"),
                title: String::new(),
                symbol: ExtendedSymbol::new(Symbol::new("DAC", 4).unwrap(), name("token")),
                accounts: BTreeMap::new(),
            }
            .with_account(AccountType::Escrow, name("escrow"));
            Self {
                world: NullWorld::new(),
                tenant,
                state: EscrowState::new(),
                now: Timestamp::new(1_000_000),
                outbox: Outbox::new(),
            }
        }

        fn run<T>(
            &mut self,
            auth: Authorization,
            f: impl FnOnce(&mut EscrowState, &mut ActionContext<'_>) -> T,
        ) -> T {
            let Harness {
                world,
                tenant,
                state,
                now,
                outbox,
            } = self;
            let mut ctx = world.context(tenant, *now, &auth, outbox);
            f(state, &mut ctx)
        }

        /// `job1` from `sender` to `receiver`, arbitrated by `arb`, expiring in a day.
        fn open(&mut self) {
            let expires = self.now.plus_secs(86_400);
            let auth = signed("sender");
            self.run(auth, |s, ctx| {
                EscrowService.init(
                    s,
                    ctx,
                    name("sender"),
                    name("receiver"),
                    name("arb"),
                    expires,
                    "job one".into(),
                    name("job1"),
                )
            })
            .unwrap();
        }

        fn fund(&mut self, leg: &str, amount: i64) -> Result<FundingLeg, EscrowError> {
            let memo = format!("{leg}:job1:testdac");
            let auth = signed("sender");
            self.run(auth, |s, ctx| EscrowService.fund(s, ctx, name("sender"), tlm(amount), &memo))
        }

        fn funded(&mut self) {
            self.open();
            self.fund("rec", 1_000_000).unwrap();
            self.fund("arb", 50_000).unwrap();
        }

        fn transfers(&mut self) -> Vec<(AccountName, i64)> {
            self.outbox
                .drain()
                .into_iter()
                .filter_map(|m| match m {
                    OutboundAction::Transfer { from, to, quantity, .. } => {
                        assert_eq!(from, name("escrow"));
                        Some((to, quantity.quantity.amount))
                    }
                    _ => None,
                })
                .collect()
        }
    }

    // ── Init ──

    #[test]
    fn init_requires_distinct_parties_and_future_expiry() {
        let mut h = Harness::new();
        let later = h.now.plus_secs(10);
        let now = h.now;
        let auth = signed("sender");
        let err = h
            .run(auth.clone(), |s, ctx| {
                EscrowService.init(s, ctx, name("sender"), name("arb"), name("arb"), later, String::new(), name("k"))
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = h
            .run(auth.clone(), |s, ctx| {
                EscrowService.init(s, ctx, name("arb"), name("receiver"), name("arb"), later, String::new(), name("k"))
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        let err = h
            .run(auth, |s, ctx| {
                EscrowService.init(s, ctx, name("sender"), name("receiver"), name("arb"), now, String::new(), name("k"))
            })
            .unwrap_err();
        assert!(matches!(err, EscrowError::ExpiryInPast { .. }));
    }

    #[test]
    fn reference_is_unique() {
        let mut h = Harness::new();
        h.open();
        let expires = h.now.plus_secs(5);
        let err = h
            .run(Authorization::contract(), |s, ctx| {
                EscrowService.init(s, ctx, name("other"), name("receiver"), name("arb"), expires, String::new(), name("job1"))
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);
        assert_eq!(h.state.by_sender(&name("sender")).unwrap().len(), 1);
    }

    // ── Funding ──

    #[test]
    fn each_leg_is_funded_once() {
        let mut h = Harness::new();
        h.open();
        assert_eq!(h.fund("rec", 100).unwrap(), FundingLeg::Receiver);
        let err = h.fund("rec", 100).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);
        assert_eq!(h.fund("arb", 5).unwrap(), FundingLeg::Arbiter);
        assert!(h.fund("arb", 5).is_err());
        let escrow = h.state.get(&name("job1")).unwrap();
        assert_eq!(escrow.receiver_pay, Some(tlm(100)));
        assert_eq!(escrow.arbiter_pay, Some(tlm(5)));
    }

    #[test]
    fn funding_checks_memo_and_amount() {
        let mut h = Harness::new();
        h.open();
        let auth = signed("sender");
        let err = h
            .run(auth.clone(), |s, ctx| EscrowService.fund(s, ctx, name("sender"), tlm(1), "rec:job1:otherdac"))
            .unwrap_err();
        assert!(matches!(err, EscrowError::WrongTenant(_)));
        let err = h
            .run(auth.clone(), |s, ctx| EscrowService.fund(s, ctx, name("sender"), tlm(1), "rec:nojob:testdac"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = h
            .run(auth, |s, ctx| EscrowService.fund(s, ctx, name("sender"), tlm(0), "rec:job1:testdac"))
            .unwrap_err();
        assert!(matches!(err, EscrowError::InvalidAmount(_)));
    }

    // ── Resolution ──

    #[test]
    fn sender_approval_pays_arbiter_then_receiver() {
        let mut h = Harness::new();
        h.open();
        h.fund("rec", 1_000_000).unwrap();
        h.fund("arb", 50_000).unwrap();
        let auth = signed("sender");
        h.run(auth, |s, ctx| EscrowService.approve(s, ctx, name("job1"), name("sender")))
            .unwrap();
        assert_eq!(
            h.transfers(),
            vec![(name("arb"), 50_000), (name("receiver"), 1_000_000)]
        );
        assert!(h.state.escrows.is_empty());
    }

    #[test]
    fn approval_needs_funds_and_a_party() {
        let mut h = Harness::new();
        h.open();
        let auth = signed("sender");
        let err = h
            .run(auth, |s, ctx| EscrowService.approve(s, ctx, name("job1"), name("sender")))
            .unwrap_err();
        assert!(matches!(err, EscrowError::NotFunded(_)));
        h.fund("rec", 10).unwrap();
        let auth = signed("receiver");
        let err = h
            .run(auth, |s, ctx| EscrowService.approve(s, ctx, name("job1"), name("receiver")))
            .unwrap_err();
        assert!(matches!(err, EscrowError::NotParty(_)));
    }

    #[test]
    fn arbiter_rules_only_on_disputes() {
        let mut h = Harness::new();
        h.funded();
        let arb = signed("arb");
        let err = h
            .run(arb.clone(), |s, ctx| EscrowService.approve(s, ctx, name("job1"), name("arb")))
            .unwrap_err();
        assert!(matches!(err, EscrowError::NotDisputed(_)));
        let err = h
            .run(arb, |s, ctx| EscrowService.disapprove(s, ctx, name("job1"), name("arb")))
            .unwrap_err();
        assert!(matches!(err, EscrowError::NotDisputed(_)));

        let receiver = signed("receiver");
        h.run(receiver, |s, ctx| EscrowService.dispute(s, ctx, name("job1"))).unwrap();

        let sender = signed("sender");
        let err = h
            .run(sender.clone(), |s, ctx| EscrowService.approve(s, ctx, name("job1"), name("sender")))
            .unwrap_err();
        assert!(matches!(err, EscrowError::Disputed(_)));
        let err = h
            .run(sender, |s, ctx| EscrowService.disapprove(s, ctx, name("job1"), name("sender")))
            .unwrap_err();
        assert!(matches!(err, EscrowError::NotArbiter));
    }

    #[test]
    fn disapproval_pays_arbiter_and_returns_funds() {
        let mut h = Harness::new();
        h.funded();
        let receiver = signed("receiver");
        h.run(receiver, |s, ctx| EscrowService.dispute(s, ctx, name("job1"))).unwrap();
        let arb = signed("arb");
        h.run(arb, |s, ctx| EscrowService.disapprove(s, ctx, name("job1"), name("arb")))
            .unwrap();
        assert_eq!(
            h.transfers(),
            vec![(name("arb"), 50_000), (name("sender"), 1_000_000)]
        );
        assert!(h.state.escrows.is_empty());
    }

    #[test]
    fn dispute_requires_receiver_and_funds() {
        let mut h = Harness::new();
        h.open();
        let receiver = signed("receiver");
        let err = h
            .run(receiver.clone(), |s, ctx| EscrowService.dispute(s, ctx, name("job1")))
            .unwrap_err();
        assert!(matches!(err, EscrowError::NotFunded(_)));
        h.fund("rec", 10).unwrap();
        let sender = signed("sender");
        let err = h
            .run(sender, |s, ctx| EscrowService.dispute(s, ctx, name("job1")))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        h.run(receiver, |s, ctx| EscrowService.dispute(s, ctx, name("job1"))).unwrap();
        assert!(h.state.get(&name("job1")).unwrap().disputed);
    }

    #[test]
    fn receiver_refunds_anytime_sender_after_expiry() {
        let mut h = Harness::new();
        h.funded();
        let sender = signed("sender");
        let err = h
            .run(sender.clone(), |s, ctx| EscrowService.refund(s, ctx, name("job1")))
            .unwrap_err();
        assert!(matches!(err, EscrowError::NotExpired { remaining: 86_400, .. }));
        h.now = h.now.plus_secs(86_400);
        h.run(sender, |s, ctx| EscrowService.refund(s, ctx, name("job1"))).unwrap();
        assert_eq!(
            h.transfers(),
            vec![(name("sender"), 1_000_000), (name("sender"), 50_000)]
        );

        let mut h = Harness::new();
        h.funded();
        let receiver = signed("receiver");
        h.run(receiver, |s, ctx| EscrowService.refund(s, ctx, name("job1"))).unwrap();
        assert!(h.state.escrows.is_empty());
    }

    #[test]
    fn disputed_escrows_cannot_be_refunded() {
        let mut h = Harness::new();
        h.funded();
        let receiver = signed("receiver");
        h.run(receiver.clone(), |s, ctx| EscrowService.dispute(s, ctx, name("job1"))).unwrap();
        let err = h
            .run(receiver, |s, ctx| EscrowService.refund(s, ctx, name("job1")))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
    }

    #[test]
    fn cancel_only_while_empty() {
        let mut h = Harness::new();
        h.open();
        h.fund("arb", 5).unwrap();
        let sender = signed("sender");
        let err = h
            .run(sender.clone(), |s, ctx| EscrowService.cancel(s, ctx, name("job1")))
            .unwrap_err();
        assert!(matches!(err, EscrowError::Funded(_)));

        let mut h = Harness::new();
        h.open();
        let receiver = signed("receiver");
        assert!(h.run(receiver, |s, ctx| EscrowService.cancel(s, ctx, name("job1"))).is_err());
        h.run(sender.clone(), |s, ctx| EscrowService.cancel(s, ctx, name("job1"))).unwrap();
        assert!(h.transfers().is_empty());
        assert!(h.state.escrows.is_empty());
        let err = h
            .run(sender, |s, ctx| EscrowService.cancel(s, ctx, name("job1")))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn lone_arbiter_fee_is_refunded() {
        let mut h = Harness::new();
        h.open();
        h.fund("arb", 50_000).unwrap();
        h.run(signed("receiver"), |s, ctx| EscrowService.refund(s, ctx, name("job1")))
            .unwrap();
        assert_eq!(h.transfers(), vec![(name("sender"), 50_000)]);
        assert!(h.state.escrows.is_empty());
    }

    #[test]
    fn nothing_to_refund_before_funding() {
        let mut h = Harness::new();
        h.open();
        let err = h
            .run(signed("receiver"), |s, ctx| EscrowService.refund(s, ctx, name("job1")))
            .unwrap_err();
        assert!(matches!(err, EscrowError::NotFunded(_)));
        assert!(h.state.escrows.contains(&name("job1")));
    }

    #[test]
    fn contract_authority_skips_signers_not_state() {
        let mut h = Harness::new();
        h.funded();
        let err = h
            .run(Authorization::contract(), |s, ctx| {
                EscrowService.approve(s, ctx, name("job1"), name("arb"))
            })
            .unwrap_err();
        assert!(matches!(err, EscrowError::NotDisputed(_)));
        h.run(Authorization::contract(), |s, ctx| {
            EscrowService.approve(s, ctx, name("job1"), name("sender"))
        })
        .unwrap();
        let err = h
            .run(Authorization::contract(), |s, ctx| EscrowService.refund(s, ctx, name("job1")))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn missing_escrow_account_fails_before_erasing() {
        let mut h = Harness::new();
        h.funded();
        h.tenant.accounts.clear();
        let sender = signed("sender");
        let err = h
            .run(sender, |s, ctx| EscrowService.approve(s, ctx, name("job1"), name("sender")))
            .unwrap_err();
        assert!(matches!(err, EscrowError::MissingAccount(AccountType::Escrow)));
        assert!(h.state.escrows.contains(&name("job1")));
    }
}
