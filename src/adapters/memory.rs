//! In-memory reference implementations of the engine's ports.
//!
//! `InMemoryLedger` keeps the append-only transaction log in a `Vec` and
//! derives balances from it, so repository and balance gateway agree by
//! construction. `InMemoryLock` provides the same lease/release semantics as
//! the Redis lock inside one process. Both are used heavily by the test
//! suites and are useful for running the service without infrastructure.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    Account, AccountBalance, PendingTransaction, Transaction, TransactionFilter,
};
use crate::ports::{
    AccountGateway, BalanceGateway, DistributedLock, GatewayError, RepositoryResult,
    TransactionRepository,
};

/// Append-only transaction log with derived balances.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    records: Arc<RwLock<Vec<Transaction>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record verbatim, bypassing id assignment. Lets tests seed
    /// histories `create` could never produce, like duplicate identifiers.
    pub async fn insert_record(&self, record: Transaction) {
        self.records.write().await.push(record);
    }

    pub async fn records(&self) -> Vec<Transaction> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryLedger {
    async fn create(&self, pending: PendingTransaction) -> RepositoryResult<Transaction> {
        let record = Transaction {
            id: Uuid::new_v4(),
            kind: pending.kind,
            from: pending.from,
            to: pending.to,
            amount: pending.amount,
            description: pending.description,
            created_at: Utc::now(),
        };

        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn get_by_filter(&self, filter: TransactionFilter) -> RepositoryResult<Vec<Transaction>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| filter.id.map_or(true, |id| r.id == id))
            .filter(|r| filter.from.map_or(true, |from| r.from == Some(from)))
            .filter(|r| filter.to.map_or(true, |to| r.to == Some(to)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BalanceGateway for InMemoryLedger {
    async fn get_by_account_id(&self, account_id: Uuid) -> Result<AccountBalance, GatewayError> {
        let records = self.records.read().await;
        let mut current_balance = BigDecimal::from(0);

        for record in records.iter() {
            if record.to == Some(account_id) {
                current_balance = &current_balance + &record.amount;
            }
            if record.from == Some(account_id) {
                current_balance = &current_balance - &record.amount;
            }
        }

        Ok(AccountBalance {
            account_id,
            current_balance,
        })
    }
}

/// Account lookups over a plain map.
#[derive(Default, Clone)]
pub struct InMemoryAccountDirectory {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, account: Account) {
        self.accounts.write().await.insert(account.id, account);
    }
}

#[async_trait]
impl AccountGateway for InMemoryAccountDirectory {
    async fn get_by_id(&self, account_id: Uuid) -> Result<Account, GatewayError> {
        let accounts = self.accounts.read().await;
        accounts.get(&account_id).cloned().ok_or(GatewayError::NotFound)
    }
}

const MEMORY_LOCK_BACKOFF: Duration = Duration::from_millis(2);

/// Single-process lock with the same contract as the Redis implementation:
/// leases expire on their own, acquisition is bounded by `max_retries`, and
/// a release paired with a failed acquisition is a no-op. Call counters let
/// tests assert the release-exactly-once discipline.
#[derive(Default)]
pub struct InMemoryLock {
    slots: Mutex<HashMap<String, KeySlot>>,
    acquire_calls: AtomicUsize,
    release_calls: AtomicUsize,
}

/// `leases` queues outstanding grants oldest-first; only the newest can
/// still be live, older entries are expired grants whose releases have not
/// arrived yet. `balked` counts failed acquisitions that still owe their
/// paired release.
#[derive(Default)]
struct KeySlot {
    leases: VecDeque<Instant>,
    balked: u32,
}

impl KeySlot {
    fn is_live(&self, now: Instant) -> bool {
        self.leases.back().is_some_and(|until| *until > now)
    }
}

impl InMemoryLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire_calls(&self) -> usize {
        self.acquire_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    pub fn is_held(&self, key: &str) -> bool {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.get(key).is_some_and(|slot| slot.is_live(Instant::now()))
    }

    fn try_take(&self, key: &str, lease: Duration) -> bool {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let slot = slots.entry(key.to_string()).or_default();
        let now = Instant::now();

        if slot.is_live(now) {
            return false;
        }
        slot.leases.push_back(now + lease);
        true
    }

    // Mirrors the Redis guarded delete: the oldest outstanding grant is
    // settled first, so a late release after the key was re-granted drops
    // an expired lease and leaves the live one in place.
    fn settle_release(&self, key: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let Some(slot) = slots.get_mut(key) else {
            return;
        };

        if slot.balked > 0 {
            slot.balked -= 1;
        } else {
            slot.leases.pop_front();
        }

        let now_idle = slot.balked == 0 && slot.leases.is_empty();
        if now_idle {
            slots.remove(key);
        }
    }

    fn mark_balked(&self, key: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(key.to_string()).or_default().balked += 1;
    }
}

#[async_trait]
impl DistributedLock for InMemoryLock {
    async fn acquire(&self, key: &str, lease: Duration, max_retries: u32) -> bool {
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);

        for attempt in 1..=max_retries {
            if self.try_take(key, lease) {
                return true;
            }
            if attempt < max_retries {
                tokio::time::sleep(MEMORY_LOCK_BACKOFF).await;
            }
        }

        self.mark_balked(key);
        false
    }

    async fn release(&self, key: &str) {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.settle_release(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionKind;

    fn pending_credit(to: Uuid, amount: i64) -> PendingTransaction {
        PendingTransaction {
            kind: TransactionKind::Credit,
            from: None,
            to: Some(to),
            amount: BigDecimal::from(amount),
            description: "seed".to_string(),
        }
    }

    #[tokio::test]
    async fn test_ledger_assigns_identity_on_create() {
        let ledger = InMemoryLedger::new();
        let account = Uuid::new_v4();

        let first = ledger.create(pending_credit(account, 10)).await.unwrap();
        let second = ledger.create(pending_credit(account, 20)).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(ledger.len().await, 2);
    }

    #[tokio::test]
    async fn test_ledger_balance_is_signed_sum() {
        let ledger = InMemoryLedger::new();
        let account = Uuid::new_v4();
        let other = Uuid::new_v4();

        ledger.create(pending_credit(account, 100)).await.unwrap();
        ledger
            .create(PendingTransaction {
                kind: TransactionKind::P2p,
                from: Some(account),
                to: Some(other),
                amount: BigDecimal::from(30),
                description: "transfer".to_string(),
            })
            .await
            .unwrap();

        let balance = ledger.get_by_account_id(account).await.unwrap();
        assert_eq!(balance.current_balance, BigDecimal::from(70));

        let counterparty = ledger.get_by_account_id(other).await.unwrap();
        assert_eq!(counterparty.current_balance, BigDecimal::from(30));
    }

    #[tokio::test]
    async fn test_ledger_balance_without_history_is_zero() {
        let ledger = InMemoryLedger::new();
        let balance = ledger.get_by_account_id(Uuid::new_v4()).await.unwrap();
        assert_eq!(balance.current_balance, BigDecimal::from(0));
    }

    #[tokio::test]
    async fn test_ledger_filter_by_id() {
        let ledger = InMemoryLedger::new();
        let account = Uuid::new_v4();
        let created = ledger.create(pending_credit(account, 10)).await.unwrap();
        ledger.create(pending_credit(account, 20)).await.unwrap();

        let found = ledger
            .get_by_filter(TransactionFilter::by_id(created.id))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, created.id);
    }

    #[tokio::test]
    async fn test_lock_mutual_exclusion_within_lease() {
        let lock = InMemoryLock::new();
        let lease = Duration::from_secs(5);

        assert!(lock.acquire("k", lease, 1).await);
        assert!(!lock.acquire("k", lease, 2).await);
        assert!(lock.is_held("k"));

        // Paired release of the failed acquisition must not free the lease.
        lock.release("k").await;
        assert!(lock.is_held("k"));

        // The holder's release does.
        lock.release("k").await;
        assert!(!lock.is_held("k"));
        assert!(lock.acquire("k", lease, 1).await);
    }

    #[tokio::test]
    async fn test_lock_lease_expires_on_its_own() {
        let lock = InMemoryLock::new();

        assert!(lock.acquire("k", Duration::from_millis(10), 1).await);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!lock.is_held("k"));
        assert!(lock.acquire("k", Duration::from_secs(1), 1).await);
    }

    #[tokio::test]
    async fn test_late_release_after_expiry_does_not_evict_the_next_holder() {
        let lock = InMemoryLock::new();

        assert!(lock.acquire("k", Duration::from_millis(10), 1).await);
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Lease expired unreleased; the key is re-granted before the first
        // release arrives.
        assert!(lock.acquire("k", Duration::from_secs(5), 1).await);

        lock.release("k").await;
        assert!(lock.is_held("k"));

        lock.release("k").await;
        assert!(!lock.is_held("k"));
    }

    #[tokio::test]
    async fn test_lock_counts_calls() {
        let lock = InMemoryLock::new();

        lock.acquire("k", Duration::from_secs(1), 1).await;
        lock.release("k").await;
        lock.release("other").await;

        assert_eq!(lock.acquire_calls(), 1);
        assert_eq!(lock.release_calls(), 2);
    }
}
