use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use chrono::Utc;
use futures::future::join_all;
use rand::Rng;
use uuid::Uuid;

use ledger_core::adapters::{InMemoryAccountDirectory, InMemoryLedger, InMemoryLock};
use ledger_core::domain::{Account, AccountStatus, NewTransaction, Transaction};
use ledger_core::ports::BalanceGateway;
use ledger_core::services::{TransactionError, TransactionService};

struct Fixture {
    ledger: InMemoryLedger,
    accounts: InMemoryAccountDirectory,
    service: TransactionService,
}

fn fixture() -> Fixture {
    let ledger = InMemoryLedger::new();
    let accounts = InMemoryAccountDirectory::new();
    let lock = Arc::new(InMemoryLock::new());
    let service = TransactionService::new(
        Arc::new(ledger.clone()),
        lock,
        Arc::new(accounts.clone()),
        Arc::new(ledger.clone()),
    );

    Fixture {
        ledger,
        accounts,
        service,
    }
}

fn active_account(id: Uuid) -> Account {
    Account {
        id,
        holder_id: Uuid::new_v4(),
        name: "Concurrent Holder".to_string(),
        document_number: "98765432100".to_string(),
        agency: "0001".to_string(),
        number: "7".to_string(),
        status: AccountStatus::Active,
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn request(from: Option<Uuid>, to: Option<Uuid>, amount: BigDecimal) -> NewTransaction {
    NewTransaction {
        from,
        to,
        amount,
        description: "contended movement".to_string(),
    }
}

async fn balance_of(ledger: &InMemoryLedger, account: Uuid) -> BigDecimal {
    BalanceGateway::get_by_account_id(ledger, account)
        .await
        .unwrap()
        .current_balance
}

/// Retries lock contention until the engine produces a definitive answer.
async fn settle(
    service: TransactionService,
    request: NewTransaction,
) -> Result<Transaction, TransactionError> {
    loop {
        match service.create_debit(request.clone()).await {
            Err(TransactionError::AccountLockFailed) => {
                tokio::time::sleep(Duration::from_millis(3)).await;
            }
            outcome => return outcome,
        }
    }
}

async fn settle_p2p(
    service: TransactionService,
    request: NewTransaction,
) -> Result<Transaction, TransactionError> {
    loop {
        match service.create_p2p(request.clone()).await {
            Err(TransactionError::AccountLockFailed) => {
                tokio::time::sleep(Duration::from_millis(3)).await;
            }
            outcome => return outcome,
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_debits_never_overdraw() {
    let f = fixture();
    let account = Uuid::new_v4();
    f.accounts.insert(active_account(account)).await;
    f.service
        .create_credit(request(None, Some(account), BigDecimal::from(100)))
        .await
        .unwrap();

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let service = f.service.clone();
            let debit = request(Some(account), None, BigDecimal::from(10));
            tokio::spawn(settle(service, debit))
        })
        .collect();

    let outcomes: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let admitted = outcomes.iter().filter(|r| r.is_ok()).count();
    for outcome in &outcomes {
        if let Err(err) = outcome {
            assert!(matches!(err, TransactionError::InsufficientFunds));
        }
    }

    assert_eq!(admitted, 10);
    assert_eq!(balance_of(&f.ledger, account).await, BigDecimal::from(0));
    assert_eq!(f.ledger.len().await, 1 + admitted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn randomized_concurrent_debits_respect_the_balance() {
    let f = fixture();
    let account = Uuid::new_v4();
    f.accounts.insert(active_account(account)).await;

    let mut rng = rand::thread_rng();
    let initial: i64 = rng.gen_range(200..=400);
    let amounts: Vec<i64> = (0..16).map(|_| rng.gen_range(10..=60)).collect();

    f.service
        .create_credit(request(None, Some(account), BigDecimal::from(initial)))
        .await
        .unwrap();

    let tasks: Vec<_> = amounts
        .iter()
        .map(|&amount| {
            let service = f.service.clone();
            let debit = request(Some(account), None, BigDecimal::from(amount));
            tokio::spawn(async move { (amount, settle(service, debit).await) })
        })
        .collect();

    let outcomes: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let mut admitted_total: i64 = 0;
    for (amount, outcome) in &outcomes {
        match outcome {
            Ok(_) => admitted_total += amount,
            Err(err) => assert!(matches!(err, TransactionError::InsufficientFunds)),
        }
    }

    assert!(admitted_total <= initial);
    assert_eq!(
        balance_of(&f.ledger, account).await,
        BigDecimal::from(initial - admitted_total)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_drain_at_most_the_funded_amount() {
    let f = fixture();
    let source = Uuid::new_v4();
    f.accounts.insert(active_account(source)).await;
    f.service
        .create_credit(request(None, Some(source), BigDecimal::from(50)))
        .await
        .unwrap();

    let mut targets = Vec::new();
    for _ in 0..10 {
        let target = Uuid::new_v4();
        f.accounts.insert(active_account(target)).await;
        targets.push(target);
    }

    let tasks: Vec<_> = targets
        .iter()
        .map(|&target| {
            let service = f.service.clone();
            let transfer = request(Some(source), Some(target), BigDecimal::from(10));
            tokio::spawn(settle_p2p(service, transfer))
        })
        .collect();

    let outcomes: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let admitted = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 5);
    assert_eq!(balance_of(&f.ledger, source).await, BigDecimal::from(0));

    let mut received = BigDecimal::from(0);
    for target in targets {
        received = received + balance_of(&f.ledger, target).await;
    }
    assert_eq!(received, BigDecimal::from(50));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interleaved_credits_and_debits_keep_the_balance_consistent() {
    let f = fixture();
    let account = Uuid::new_v4();
    f.accounts.insert(active_account(account)).await;

    let credits: Vec<_> = (0..8)
        .map(|_| {
            let service = f.service.clone();
            let credit = request(None, Some(account), BigDecimal::from(25));
            tokio::spawn(async move { service.create_credit(credit).await })
        })
        .collect();

    let debits: Vec<_> = (0..8)
        .map(|_| {
            let service = f.service.clone();
            let debit = request(Some(account), None, BigDecimal::from(40));
            tokio::spawn(settle(service, debit))
        })
        .collect();

    for joined in join_all(credits).await {
        joined.unwrap().unwrap();
    }

    let mut admitted_debits: i64 = 0;
    for joined in join_all(debits).await {
        match joined.unwrap() {
            Ok(_) => admitted_debits += 1,
            Err(err) => assert!(matches!(err, TransactionError::InsufficientFunds)),
        }
    }

    let expected = BigDecimal::from(8 * 25 - 40 * admitted_debits);
    let balance = balance_of(&f.ledger, account).await;
    assert_eq!(balance, expected);
    assert!(balance >= BigDecimal::from(0));
}
