//! Pending withdrawals registry.
//!
//! A request moves `Locked → Ready → Expired` purely as a function of its
//! creation time and the configured durations; completing or cancelling it
//! removes it from the registry.

use crate::request::{WithdrawalId, WithdrawalRequest, WithdrawalStatus};
use lnet_domain::access::{AdminCapability, CapabilityKey};
use lnet_domain::error::{LiquidityError, Result};
use lnet_domain::ledger::{PoolTokenLedger, ReserveValuation};
use lnet_domain::settings::NetworkSettings;
use lnet_domain::token::{Address, Token};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Live withdrawal requests and the lock/window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingWithdrawals {
    admin: CapabilityKey,
    lock_duration: u64,
    withdrawal_window_duration: u64,
    next_id: u64,
    requests: BTreeMap<WithdrawalId, WithdrawalRequest>,
    by_provider: BTreeMap<Address, BTreeSet<WithdrawalId>>,
}

impl PendingWithdrawals {
    /// Creates an empty registry with the durations from `settings`.
    pub fn new(admin: CapabilityKey, settings: &NetworkSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            admin,
            lock_duration: settings.lock_duration,
            withdrawal_window_duration: settings.withdrawal_window_duration,
            next_id: 1,
            requests: BTreeMap::new(),
            by_provider: BTreeMap::new(),
        })
    }

    pub fn lock_duration(&self) -> u64 {
        self.lock_duration
    }

    pub fn withdrawal_window_duration(&self) -> u64 {
        self.withdrawal_window_duration
    }

    pub fn set_lock_duration(&mut self, capability: &AdminCapability, seconds: u64) -> Result<()> {
        self.admin.authorize(capability)?;
        self.lock_duration = seconds;
        info!(seconds, "Lock duration updated");
        Ok(())
    }

    pub fn set_withdrawal_window_duration(
        &mut self,
        capability: &AdminCapability,
        seconds: u64,
    ) -> Result<()> {
        self.admin.authorize(capability)?;
        if seconds == 0 {
            return Err(LiquidityError::InvalidAmount);
        }
        self.withdrawal_window_duration = seconds;
        info!(seconds, "Withdrawal window duration updated");
        Ok(())
    }

    pub fn withdrawal_request(&self, id: WithdrawalId) -> Option<&WithdrawalRequest> {
        self.requests.get(&id)
    }

    /// Ids of the live requests of `provider`, oldest first.
    pub fn withdrawal_request_ids(&self, provider: &Address) -> Vec<WithdrawalId> {
        self.by_provider
            .get(provider)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn withdrawal_request_count(&self, provider: &Address) -> usize {
        self.by_provider.get(provider).map_or(0, BTreeSet::len)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Pool tokens of `pool_token` that `provider` has locked in live requests.
    pub fn locked_amount(&self, provider: &Address, pool_token: &Token) -> U256 {
        self.by_provider
            .get(provider)
            .into_iter()
            .flatten()
            .filter_map(|id| self.requests.get(id))
            .filter(|request| request.pool_token == *pool_token)
            .fold(U256::zero(), |total, request| {
                total.saturating_add(request.pool_token_amount)
            })
    }

    pub fn status(&self, id: WithdrawalId, now: u64) -> Option<WithdrawalStatus> {
        self.requests.get(&id).map(|request| {
            request.status(self.lock_duration, self.withdrawal_window_duration, now)
        })
    }

    /// Whether request `id` can be completed at `now`. Unknown ids are
    /// never ready.
    pub fn is_ready_for_withdrawal(&self, id: WithdrawalId, now: u64) -> bool {
        self.status(id, now) == Some(WithdrawalStatus::Ready)
    }

    /// Locks `pool_token_amount` pool tokens of `provider` and returns the
    /// new request id.
    ///
    /// # Errors
    ///
    /// - [`LiquidityError::InvalidAmount`] when the amount is zero or
    ///   exceeds the provider's balance not already locked
    /// - [`LiquidityError::InvalidToken`] when `pool_token` has no pool
    pub fn initiate(
        &mut self,
        ledger: &impl PoolTokenLedger,
        valuation: &impl ReserveValuation,
        provider: Address,
        pool_token: Token,
        pool_token_amount: U256,
        now: u64,
    ) -> Result<WithdrawalId> {
        if provider.is_zero() {
            return Err(LiquidityError::InvalidAddress("provider"));
        }
        pool_token.validate("pool token")?;
        if pool_token_amount.is_zero() {
            return Err(LiquidityError::InvalidAmount);
        }

        let reserve_token_amount = valuation.underlying_value(&pool_token, pool_token_amount)?;
        let locked = self.locked_amount(&provider, &pool_token);
        let available = ledger
            .balance_of(&pool_token, &provider)
            .saturating_sub(locked);
        if pool_token_amount > available {
            warn!(
                provider = %provider,
                pool_token = %pool_token,
                requested = %pool_token_amount,
                available = %available,
                "Withdrawal request exceeds available balance"
            );
            return Err(LiquidityError::InvalidAmount);
        }

        let id = WithdrawalId(self.next_id);
        let next_id = self
            .next_id
            .checked_add(1)
            .ok_or(LiquidityError::Overflow("withdrawal id"))?;

        self.next_id = next_id;
        self.requests.insert(
            id,
            WithdrawalRequest {
                id,
                provider,
                pool_token,
                pool_token_amount,
                reserve_token_amount,
                created_at: now,
            },
        );
        self.by_provider.entry(provider).or_default().insert(id);

        info!(
            id = %id,
            provider = %provider,
            pool_token = %pool_token,
            pool_token_amount = %pool_token_amount,
            reserve_token_amount = %reserve_token_amount,
            "Withdrawal initiated"
        );
        Ok(id)
    }

    fn owned_request(&self, id: WithdrawalId, caller: &Address) -> Result<&WithdrawalRequest> {
        let request = self.requests.get(&id).ok_or(LiquidityError::NotFound)?;
        if request.provider != *caller {
            warn!(id = %id, caller = %caller, "Withdrawal request accessed by non-owner");
            return Err(LiquidityError::Unauthorized);
        }
        Ok(request)
    }

    fn remove(&mut self, id: WithdrawalId) -> Option<WithdrawalRequest> {
        let request = self.requests.remove(&id)?;
        if let Some(ids) = self.by_provider.get_mut(&request.provider) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_provider.remove(&request.provider);
            }
        }
        Some(request)
    }

    /// Cancels a live request of `caller` and returns its snapshotted
    /// reserve amount. Expired requests can be cancelled as well.
    pub fn cancel(&mut self, id: WithdrawalId, caller: &Address) -> Result<U256> {
        self.owned_request(id, caller)?;
        let request = self.remove(id).ok_or(LiquidityError::NotFound)?;
        info!(id = %id, provider = %caller, "Withdrawal cancelled");
        Ok(request.reserve_token_amount)
    }

    /// Restarts the lock period of a request of `caller` at `now` and
    /// re-snapshots its reserve value.
    pub fn reinitiate(
        &mut self,
        valuation: &impl ReserveValuation,
        id: WithdrawalId,
        caller: &Address,
        now: u64,
    ) -> Result<()> {
        let request = self.owned_request(id, caller)?;
        let reserve_token_amount =
            valuation.underlying_value(&request.pool_token, request.pool_token_amount)?;

        if let Some(request) = self.requests.get_mut(&id) {
            request.reserve_token_amount = reserve_token_amount;
            request.created_at = now;
        }
        info!(
            id = %id,
            provider = %caller,
            reserve_token_amount = %reserve_token_amount,
            "Withdrawal reinitiated"
        );
        Ok(())
    }

    /// Completes a ready request of `caller`, removing it.
    ///
    /// # Errors
    ///
    /// - [`LiquidityError::WithdrawalNotReady`] during the lock period
    /// - [`LiquidityError::Expired`] once the window has passed
    pub fn complete(
        &mut self,
        id: WithdrawalId,
        caller: &Address,
        now: u64,
    ) -> Result<WithdrawalRequest> {
        let request = self.owned_request(id, caller)?;
        match request.status(self.lock_duration, self.withdrawal_window_duration, now) {
            WithdrawalStatus::Locked => return Err(LiquidityError::WithdrawalNotReady),
            WithdrawalStatus::Expired => return Err(LiquidityError::Expired),
            WithdrawalStatus::Ready => {}
        }
        let request = self.remove(id).ok_or(LiquidityError::NotFound)?;
        info!(
            id = %id,
            provider = %caller,
            pool_token_amount = %request.pool_token_amount,
            "Withdrawal completed"
        );
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lnet_domain::ledger::InMemoryPoolTokenLedger;

    const LOCK: u64 = 50;
    const WINDOW: u64 = 20;

    /// One pool token is worth two reserve tokens.
    struct DoubleValuation;

    impl ReserveValuation for DoubleValuation {
        fn underlying_value(&self, pool_token: &Token, amount: U256) -> Result<U256> {
            if *pool_token != pool_token_id() {
                return Err(LiquidityError::InvalidToken);
            }
            Ok(amount * 2)
        }
    }

    fn pool_token_id() -> Token {
        Token::from_low_u64(0x77)
    }

    fn alice() -> Address {
        Address::from_low_u64(0xa11ce)
    }

    fn bob() -> Address {
        Address::from_low_u64(0xb0b)
    }

    fn setup() -> (AdminCapability, PendingWithdrawals, InMemoryPoolTokenLedger) {
        let admin = AdminCapability::mint(3);
        let settings = NetworkSettings::default()
            .with_lock_duration(LOCK)
            .with_withdrawal_window_duration(WINDOW);
        let pending = PendingWithdrawals::new(admin.key(), &settings).unwrap();
        let mut ledger = InMemoryPoolTokenLedger::new();
        ledger
            .mint(pool_token_id(), alice(), U256::from(1_000u64))
            .unwrap();
        (admin, pending, ledger)
    }

    fn initiate(
        pending: &mut PendingWithdrawals,
        ledger: &InMemoryPoolTokenLedger,
        amount: u64,
        now: u64,
    ) -> Result<WithdrawalId> {
        pending.initiate(
            ledger,
            &DoubleValuation,
            alice(),
            pool_token_id(),
            U256::from(amount),
            now,
        )
    }

    #[test]
    fn test_initiate_snapshots_reserve_value() {
        let (_, mut pending, ledger) = setup();
        let id = initiate(&mut pending, &ledger, 100, 10).unwrap();
        let request = pending.withdrawal_request(id).unwrap();
        assert_eq!(request.reserve_token_amount, U256::from(200u64));
        assert_eq!(request.created_at, 10);
        assert_eq!(pending.withdrawal_request_ids(&alice()), vec![id]);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let (_, mut pending, ledger) = setup();
        let first = initiate(&mut pending, &ledger, 1, 0).unwrap();
        pending.cancel(first, &alice()).unwrap();
        let second = initiate(&mut pending, &ledger, 1, 0).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_initiate_rejects_bad_amounts() {
        let (_, mut pending, ledger) = setup();
        assert_eq!(
            initiate(&mut pending, &ledger, 0, 0),
            Err(LiquidityError::InvalidAmount)
        );
        assert_eq!(
            initiate(&mut pending, &ledger, 1_001, 0),
            Err(LiquidityError::InvalidAmount)
        );
        assert!(pending.is_empty());
    }

    #[test]
    fn test_locked_amounts_are_reserved() {
        let (_, mut pending, ledger) = setup();
        initiate(&mut pending, &ledger, 600, 0).unwrap();
        assert_eq!(
            initiate(&mut pending, &ledger, 401, 0),
            Err(LiquidityError::InvalidAmount)
        );
        initiate(&mut pending, &ledger, 400, 0).unwrap();
        assert_eq!(pending.withdrawal_request_count(&alice()), 2);
        assert_eq!(
            pending.locked_amount(&alice(), &pool_token_id()),
            U256::from(1_000u64)
        );
    }

    #[test]
    fn test_unknown_pool_token() {
        let (_, mut pending, ledger) = setup();
        assert_eq!(
            pending.initiate(
                &ledger,
                &DoubleValuation,
                alice(),
                Token::from_low_u64(0x99),
                U256::one(),
                0
            ),
            Err(LiquidityError::InvalidToken)
        );
    }

    #[test]
    fn test_readiness_window() {
        let (_, mut pending, ledger) = setup();
        let id = initiate(&mut pending, &ledger, 10, 100).unwrap();
        assert!(!pending.is_ready_for_withdrawal(id, 149));
        assert!(pending.is_ready_for_withdrawal(id, 150));
        assert!(pending.is_ready_for_withdrawal(id, 169));
        assert!(!pending.is_ready_for_withdrawal(id, 170));
        assert!(!pending.is_ready_for_withdrawal(WithdrawalId(999), 150));
    }

    #[test]
    fn test_complete_lifecycle() {
        let (_, mut pending, ledger) = setup();
        let id = initiate(&mut pending, &ledger, 10, 100).unwrap();
        assert_eq!(
            pending.complete(id, &alice(), 149),
            Err(LiquidityError::WithdrawalNotReady)
        );
        assert_eq!(
            pending.complete(id, &bob(), 150),
            Err(LiquidityError::Unauthorized)
        );
        let request = pending.complete(id, &alice(), 150).unwrap();
        assert_eq!(request.pool_token_amount, U256::from(10u64));
        assert_eq!(
            pending.complete(id, &alice(), 150),
            Err(LiquidityError::NotFound)
        );
        assert_eq!(pending.withdrawal_request_count(&alice()), 0);
    }

    #[test]
    fn test_expired_request_must_be_reinitiated() {
        let (_, mut pending, ledger) = setup();
        let id = initiate(&mut pending, &ledger, 10, 100).unwrap();
        assert_eq!(
            pending.complete(id, &alice(), 171),
            Err(LiquidityError::Expired)
        );
        assert_eq!(pending.status(id, 171), Some(WithdrawalStatus::Expired));

        pending.reinitiate(&DoubleValuation, id, &alice(), 171).unwrap();
        assert_eq!(pending.status(id, 171), Some(WithdrawalStatus::Locked));
        assert!(pending.complete(id, &alice(), 221).is_ok());
    }

    #[test]
    fn test_cancel_rules() {
        let (_, mut pending, ledger) = setup();
        let id = initiate(&mut pending, &ledger, 10, 100).unwrap();
        assert_eq!(
            pending.cancel(id, &bob()),
            Err(LiquidityError::Unauthorized)
        );
        assert_eq!(
            pending.cancel(WithdrawalId(999), &alice()),
            Err(LiquidityError::NotFound)
        );
        assert_eq!(pending.cancel(id, &alice()).unwrap(), U256::from(20u64));
        assert!(pending.withdrawal_request(id).is_none());
    }

    #[test]
    fn test_duration_setters() {
        let (admin, mut pending, _) = setup();
        pending.set_lock_duration(&admin, 10).unwrap();
        assert_eq!(pending.lock_duration(), 10);
        assert_eq!(
            pending.set_withdrawal_window_duration(&admin, 0),
            Err(LiquidityError::InvalidAmount)
        );
        let intruder = AdminCapability::mint(4);
        assert_eq!(
            pending.set_lock_duration(&intruder, 1),
            Err(LiquidityError::Unauthorized)
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_window_boundaries(
                created_at in 0u64..1_000_000,
                lock in 0u64..100_000,
                window in 1u64..100_000,
                offset in 0u64..300_000,
            ) {
                let admin = AdminCapability::mint(3);
                let settings = NetworkSettings::default()
                    .with_lock_duration(lock)
                    .with_withdrawal_window_duration(window);
                let Ok(mut pending) = PendingWithdrawals::new(admin.key(), &settings) else {
                    panic!("valid settings");
                };
                let mut ledger = InMemoryPoolTokenLedger::new();
                let Ok(()) = ledger.mint(pool_token_id(), alice(), U256::one()) else {
                    panic!("minted");
                };
                let Ok(id) = initiate(&mut pending, &ledger, 1, created_at) else {
                    panic!("initiated");
                };

                let now = created_at + offset;
                let ready = now >= created_at + lock && now < created_at + lock + window;
                prop_assert_eq!(pending.is_ready_for_withdrawal(id, now), ready);

                let completed = pending.complete(id, &alice(), now);
                if ready {
                    prop_assert!(completed.is_ok());
                } else if now < created_at + lock {
                    prop_assert_eq!(completed, Err(LiquidityError::WithdrawalNotReady));
                } else {
                    prop_assert_eq!(completed, Err(LiquidityError::Expired));
                }
            }
        }
    }
}
