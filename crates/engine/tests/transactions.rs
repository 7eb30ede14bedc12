use std::time::Duration;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use tokio::time::Instant;

use engine::{
    DepositCmd, DomainError, Engine, EngineError, FinalStatus, NewProduct, NewTransactionRecord,
    PurchaseCmd, TransactionKind, TransactionRecord, TransactionService, TransactionStatus,
    TransferCmd, WithdrawCmd,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// Provision a user and its wallet, returning `(user_id, wallet_id)`.
async fn user_with_wallet(engine: &Engine, username: &str, balance: i64) -> (i32, i32) {
    let user_id = engine.provision_user(username).await.unwrap();
    let wallet = engine.wallets().create(user_id, balance).await.unwrap();
    (user_id, wallet.id)
}

async fn balance(engine: &Engine, user_id: i32) -> i64 {
    engine.wallets().get_by_user_id(user_id).await.unwrap().balance
}

async fn history(engine: &Engine, wallet_id: i32) -> Vec<TransactionRecord> {
    engine
        .records()
        .list_for_wallet(wallet_id, 1000, 0)
        .await
        .unwrap()
}

async fn pending_count(db: &DatabaseConnection) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "SELECT COUNT(*) AS n FROM transaction_histories WHERE t_status = 'pending'",
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

#[tokio::test]
async fn purchase_moves_stock_and_balance() {
    let (engine, db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (user_id, wallet_id) = user_with_wallet(&engine, "alice", 1000).await;
    let product = engine
        .products()
        .create(&NewProduct::new("Lamp", 20, 50))
        .await
        .unwrap();

    let receipt = service
        .purchase(PurchaseCmd::new(user_id, product.id, 10))
        .await
        .unwrap();

    assert_eq!(receipt.code, 200);
    assert_eq!(receipt.record.status, TransactionStatus::Completed);
    assert_eq!(receipt.record.kind, TransactionKind::Purchase);
    assert_eq!(receipt.record.amount, 200);
    assert_eq!(receipt.record.quantity, Some(10));
    assert_eq!(receipt.record.from_wallet_id, Some(wallet_id));
    assert_eq!(receipt.record.product_id, Some(product.id));
    assert_eq!(balance(&engine, user_id).await, 800);
    let product = engine.products().get_by_id(product.id).await.unwrap();
    assert_eq!(product.availability, 40);
    assert_eq!(pending_count(&db).await, 0);
}

#[tokio::test]
async fn purchase_beyond_stock_fails_without_charging() {
    let (engine, db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (user_id, _) = user_with_wallet(&engine, "alice", 1000).await;
    let product = engine
        .products()
        .create(&NewProduct::new("Lamp", 20, 5))
        .await
        .unwrap();

    let rejection = service
        .purchase(PurchaseCmd::new(user_id, product.id, 6))
        .await
        .unwrap_err();

    assert_eq!(rejection.error, DomainError::InsufficientStock);
    assert_eq!(rejection.code(), 400);
    let record = rejection.record.unwrap();
    assert_eq!(record.status, TransactionStatus::Failed);
    assert_eq!(record.amount, 120);
    assert_eq!(balance(&engine, user_id).await, 1000);
    let product = engine.products().get_by_id(product.id).await.unwrap();
    assert_eq!(product.availability, 5);
    assert_eq!(pending_count(&db).await, 0);
}

#[tokio::test]
async fn purchase_without_funds_keeps_stock_taken() {
    let (engine, _db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (user_id, _) = user_with_wallet(&engine, "alice", 50).await;
    let product = engine
        .products()
        .create(&NewProduct::new("Lamp", 20, 10))
        .await
        .unwrap();

    let rejection = service
        .purchase(PurchaseCmd::new(user_id, product.id, 3))
        .await
        .unwrap_err();

    assert_eq!(rejection.error, DomainError::InsufficientBalance);
    assert_eq!(
        rejection.record.map(|record| record.status),
        Some(TransactionStatus::Failed)
    );
    assert_eq!(balance(&engine, user_id).await, 50);
    // Stock and balance are separate mutations; the stock is not given back.
    let product = engine.products().get_by_id(product.id).await.unwrap();
    assert_eq!(product.availability, 7);
}

#[tokio::test]
async fn purchase_of_unknown_product_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (user_id, wallet_id) = user_with_wallet(&engine, "alice", 1000).await;

    let rejection = service
        .purchase(PurchaseCmd::new(user_id, 999, 1))
        .await
        .unwrap_err();

    assert!(matches!(rejection.error, DomainError::NotFound(_)));
    assert_eq!(rejection.code(), 404);
    assert!(rejection.record.is_none());
    assert!(history(&engine, wallet_id).await.is_empty());
    assert_eq!(balance(&engine, user_id).await, 1000);
}

#[tokio::test]
async fn deposit_and_withdraw() {
    let (engine, _db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (user_id, wallet_id) = user_with_wallet(&engine, "alice", 100).await;

    let deposit = service.deposit(DepositCmd::new(user_id, 250)).await.unwrap();
    assert_eq!(deposit.record.kind, TransactionKind::Deposit);
    assert_eq!(deposit.record.amount, 250);
    assert_eq!(deposit.record.to_wallet_id, Some(wallet_id));
    assert_eq!(balance(&engine, user_id).await, 350);

    let withdrawal = service
        .withdraw(WithdrawCmd::new(user_id, 300))
        .await
        .unwrap();
    assert_eq!(withdrawal.record.kind, TransactionKind::Withdrawal);
    assert_eq!(withdrawal.record.amount, -300);
    assert_eq!(withdrawal.record.from_wallet_id, Some(wallet_id));
    assert_eq!(balance(&engine, user_id).await, 50);

    assert_eq!(history(&engine, wallet_id).await.len(), 2);
}

#[tokio::test]
async fn withdraw_beyond_balance_fails() {
    let (engine, _db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (user_id, _) = user_with_wallet(&engine, "alice", 100).await;

    let rejection = service
        .withdraw(WithdrawCmd::new(user_id, 101))
        .await
        .unwrap_err();

    assert_eq!(rejection.error, DomainError::InsufficientBalance);
    assert_eq!(rejection.code(), 400);
    let record = rejection.record.unwrap();
    assert_eq!(record.status, TransactionStatus::Failed);
    assert_eq!(record.amount, -101);
    assert_eq!(balance(&engine, user_id).await, 100);
}

#[tokio::test]
async fn invalid_amounts_are_rejected_before_any_record() {
    let (engine, _db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (user_id, wallet_id) = user_with_wallet(&engine, "alice", 100).await;
    let (_, other_wallet) = user_with_wallet(&engine, "bob", 0).await;

    for amount in [0, -5] {
        let rejection = service
            .deposit(DepositCmd::new(user_id, amount))
            .await
            .unwrap_err();
        assert!(matches!(rejection.error, DomainError::Validation(_)));
        assert!(rejection.record.is_none());
    }
    let rejection = service
        .transfer(TransferCmd::new(user_id, wallet_id, other_wallet, 0))
        .await
        .unwrap_err();
    assert!(matches!(rejection.error, DomainError::Validation(_)));
    let rejection = service
        .transfer(TransferCmd::new(user_id, wallet_id, wallet_id, 10))
        .await
        .unwrap_err();
    assert!(matches!(rejection.error, DomainError::Validation(_)));

    assert!(history(&engine, wallet_id).await.is_empty());
    assert_eq!(balance(&engine, user_id).await, 100);
}

#[tokio::test]
async fn transfer_moves_the_whole_balance() {
    let (engine, _db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (alice, alice_wallet) = user_with_wallet(&engine, "alice", 500).await;
    let (bob, bob_wallet) = user_with_wallet(&engine, "bob", 30).await;

    let receipt = service
        .transfer(TransferCmd::new(alice, alice_wallet, bob_wallet, 500))
        .await
        .unwrap();

    assert_eq!(receipt.record.kind, TransactionKind::Transfer);
    assert_eq!(receipt.record.amount, 500);
    assert_eq!(receipt.record.from_wallet_id, Some(alice_wallet));
    assert_eq!(receipt.record.to_wallet_id, Some(bob_wallet));
    assert_eq!(balance(&engine, alice).await, 0);
    assert_eq!(balance(&engine, bob).await, 530);

    // The record shows up in both wallets' history.
    assert_eq!(history(&engine, alice_wallet).await.len(), 1);
    assert_eq!(history(&engine, bob_wallet).await.len(), 1);
}

#[tokio::test]
async fn transfer_beyond_balance_leaves_destination_untouched() {
    let (engine, _db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (alice, alice_wallet) = user_with_wallet(&engine, "alice", 500).await;
    let (bob, bob_wallet) = user_with_wallet(&engine, "bob", 30).await;

    let rejection = service
        .transfer(TransferCmd::new(alice, alice_wallet, bob_wallet, 501))
        .await
        .unwrap_err();

    assert_eq!(rejection.error, DomainError::InsufficientBalance);
    assert_eq!(
        rejection.record.map(|record| record.status),
        Some(TransactionStatus::Failed)
    );
    assert_eq!(balance(&engine, alice).await, 500);
    assert_eq!(balance(&engine, bob).await, 30);
}

#[tokio::test]
async fn transfer_from_foreign_wallet_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (alice, alice_wallet) = user_with_wallet(&engine, "alice", 500).await;
    let (bob, bob_wallet) = user_with_wallet(&engine, "bob", 30).await;

    let rejection = service
        .transfer(TransferCmd::new(bob, alice_wallet, bob_wallet, 10))
        .await
        .unwrap_err();

    assert!(matches!(rejection.error, DomainError::NotFound(_)));
    assert_eq!(rejection.code(), 404);
    assert!(rejection.record.is_none());
    assert_eq!(balance(&engine, alice).await, 500);
}

#[tokio::test]
async fn negative_transfer_credit_failure_keeps_debit_applied() {
    let (engine, _db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (alice, alice_wallet) = user_with_wallet(&engine, "alice", 100).await;
    let (bob, bob_wallet) = user_with_wallet(&engine, "bob", 10).await;

    // A negative amount pulls from the destination; bob cannot cover 50.
    let rejection = service
        .transfer(TransferCmd::new(alice, alice_wallet, bob_wallet, -50))
        .await
        .unwrap_err();

    assert_eq!(rejection.error, DomainError::InsufficientBalance);
    assert_eq!(
        rejection.record.map(|record| record.status),
        Some(TransactionStatus::Failed)
    );
    // The source side was applied and is not reverted.
    assert_eq!(balance(&engine, alice).await, 150);
    assert_eq!(balance(&engine, bob).await, 10);
}

#[tokio::test]
async fn missing_wallet_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let user_id = engine.provision_user("alice").await.unwrap();

    let rejection = service
        .deposit(DepositCmd::new(user_id, 10))
        .await
        .unwrap_err();

    assert!(matches!(rejection.error, DomainError::NotFound(_)));
    assert!(rejection.record.is_none());
}

#[tokio::test]
async fn second_wallet_for_user_is_duplicate() {
    let (engine, _db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let user_id = engine.provision_user("alice").await.unwrap();

    service.open_wallet(user_id, 10).await.unwrap();
    let rejection = service.open_wallet(user_id, 10).await.unwrap_err();

    assert_eq!(rejection.error, DomainError::Duplicate);
    assert_eq!(rejection.code(), 409);
}

#[tokio::test]
async fn wallet_for_unknown_user_is_reference_violation() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.wallets().create(42, 0).await.unwrap_err();

    assert!(matches!(err, EngineError::ForeignKeyViolation(_)));
}

#[tokio::test]
async fn negative_opening_balance_hits_the_balance_constraint() {
    let (engine, _db) = engine_with_db().await;
    let user_id = engine.provision_user("alice").await.unwrap();

    let err = engine.wallets().create(user_id, -1).await.unwrap_err();

    assert_eq!(err.constraint(), Some("ck_wallets_balance"));
}

#[tokio::test]
async fn finalize_twice_is_an_invalid_transition() {
    let (engine, _db) = engine_with_db().await;
    let (_, wallet_id) = user_with_wallet(&engine, "alice", 0).await;

    let pending = engine
        .records()
        .create(&NewTransactionRecord::new(TransactionKind::Deposit, 10).to_wallet(wallet_id))
        .await
        .unwrap();
    assert_eq!(pending.status, TransactionStatus::Pending);

    let done = engine
        .records()
        .finalize(pending.id, 10, FinalStatus::Completed)
        .await
        .unwrap();
    assert_eq!(done.status, TransactionStatus::Completed);

    let err = engine
        .records()
        .finalize(pending.id, 10, FinalStatus::Failed)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
    let record = engine.records().get(pending.id).await.unwrap();
    assert_eq!(record.status, TransactionStatus::Completed);
}

#[tokio::test]
async fn finalize_unknown_record_is_not_found() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .records()
        .finalize(uuid::Uuid::new_v4(), 0, FinalStatus::Failed)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn expired_deadline_writes_no_record() {
    let (engine, _db) = engine_with_db().await;
    let (user_id, wallet_id) = user_with_wallet(&engine, "alice", 100).await;

    let err = engine
        .execute_until(
            DepositCmd::new(user_id, 10).into(),
            Some(Instant::now() - Duration::from_millis(1)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::DeadlineExceeded(_)));
    assert!(history(&engine, wallet_id).await.is_empty());
    assert_eq!(balance(&engine, user_id).await, 100);
}

#[tokio::test]
async fn generous_deadline_completes() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .deadline(Duration::from_secs(30))
        .build()
        .await
        .unwrap();
    let (user_id, _) = user_with_wallet(&engine, "alice", 100).await;

    let settled = engine
        .execute(DepositCmd::new(user_id, 10).into())
        .await
        .unwrap();

    assert!(settled.is_completed());
    assert_eq!(balance(&engine, user_id).await, 110);
}

#[tokio::test]
async fn concurrent_withdrawals_never_overdraw() {
    let (engine, db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (user_id, wallet_id) = user_with_wallet(&engine, "alice", 100).await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.withdraw(WithdrawCmd::new(user_id, 10)).await })
        })
        .collect();

    let mut completed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => completed += 1,
            Err(rejection) => assert_eq!(rejection.error, DomainError::InsufficientBalance),
        }
    }

    assert_eq!(completed, 10);
    assert_eq!(balance(&engine, user_id).await, 0);
    let records = history(&engine, wallet_id).await;
    assert_eq!(records.len(), 20);
    let settled: i64 = records
        .iter()
        .filter(|record| record.status == TransactionStatus::Completed)
        .map(|record| record.amount)
        .sum();
    assert_eq!(settled, -100);
    assert_eq!(pending_count(&db).await, 0);
}

#[tokio::test]
async fn concurrent_transfers_conserve_money() {
    let (engine, db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (alice, alice_wallet) = user_with_wallet(&engine, "alice", 300).await;
    let (bob, bob_wallet) = user_with_wallet(&engine, "bob", 300).await;

    let mut handles = Vec::new();
    for _ in 0..15 {
        let alice_service = service.clone();
        handles.push(tokio::spawn(async move {
            alice_service
                .transfer(TransferCmd::new(alice, alice_wallet, bob_wallet, 40))
                .await
        }));
        let bob_service = service.clone();
        handles.push(tokio::spawn(async move {
            bob_service
                .transfer(TransferCmd::new(bob, bob_wallet, alice_wallet, 40))
                .await
        }));
    }
    for handle in handles {
        let _ = handle.await.unwrap();
    }

    let alice_balance = balance(&engine, alice).await;
    let bob_balance = balance(&engine, bob).await;
    assert!(alice_balance >= 0);
    assert!(bob_balance >= 0);
    assert_eq!(alice_balance + bob_balance, 600);
    assert_eq!(pending_count(&db).await, 0);
}

#[tokio::test]
async fn concurrent_purchases_never_oversell() {
    let (engine, _db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (user_id, _) = user_with_wallet(&engine, "alice", 10_000).await;
    let product = engine
        .products()
        .create(&NewProduct::new("Lamp", 10, 7))
        .await
        .unwrap();

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let service = service.clone();
            let product_id = product.id;
            tokio::spawn(async move {
                service
                    .purchase(PurchaseCmd::new(user_id, product_id, 1))
                    .await
            })
        })
        .collect();

    let mut sold = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            sold += 1;
        }
    }

    assert_eq!(sold, 7);
    let product = engine.products().get_by_id(product.id).await.unwrap();
    assert_eq!(product.availability, 0);
    assert_eq!(balance(&engine, user_id).await, 10_000 - 70);
}

#[tokio::test]
async fn history_pages_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let service = TransactionService::new(engine.clone());
    let (user_id, _) = user_with_wallet(&engine, "alice", 0).await;

    for amount in 1..=5 {
        service
            .deposit(DepositCmd::new(user_id, amount))
            .await
            .unwrap();
    }

    let page = service.history(user_id, 2, 0).await.unwrap();
    assert_eq!(page.len(), 2);
    assert!(page[0].created_at >= page[1].created_at);
    let rest = service.history(user_id, 10, 2).await.unwrap();
    assert_eq!(rest.len(), 3);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let (engine, _db) = engine_with_db().await;

    engine.provision_user("alice").await.unwrap();
    let err = engine.provision_user(" alice ").await.unwrap_err();

    assert!(matches!(err, EngineError::ExistingKey(_)));
    assert!(engine.user_id("alice").await.is_ok());
}
