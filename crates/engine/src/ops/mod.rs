use std::{
    future::Future,
    sync::atomic::{AtomicI64, Ordering},
    time::Duration,
};

use sea_orm::DatabaseConnection;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
    EngineError, FinalStatus, NewTransactionRecord, ProductStore, ResultEngine, TransactionRecord,
    TransactionRequest, TransactionStore, WalletStore,
};

mod purchase;
mod transfer;
mod users;
mod wallet_flows;

/// The transaction engine.
///
/// Every workflow runs the same three phases, strictly in order:
///
/// 1. write a `pending` intent record;
/// 2. attempt the balance/stock mutations, each one atomic on its own;
/// 3. finalize the record to `completed` or `failed`, whatever phase 2 did.
///
/// Phase 2 is not wrapped in one enclosing DB transaction: a multi-step
/// workflow whose second step fails keeps the effects of the first step, and
/// the record is finalized as `failed`.
#[derive(Clone, Debug)]
pub struct Engine {
    wallets: WalletStore,
    products: ProductStore,
    records: TransactionStore,
    database: DatabaseConnection,
    deadline: Option<Duration>,
}

/// A workflow that reached phase 3.
///
/// `failure` is the phase-2 error, if any; `record` is already finalized and
/// its status agrees with `failure`.
#[derive(Debug)]
pub struct Settled {
    pub record: TransactionRecord,
    pub failure: Option<EngineError>,
}

impl Settled {
    pub fn is_completed(&self) -> bool {
        self.failure.is_none()
    }
}

/// What phase 2 produced: the best-known final amount and its result.
#[derive(Debug)]
struct Mutation {
    amount: i64,
    result: ResultEngine<()>,
}

impl Mutation {
    fn done(amount: i64) -> Self {
        Self {
            amount,
            result: Ok(()),
        }
    }

    fn failed(amount: i64, err: EngineError) -> Self {
        Self {
            amount,
            result: Err(err),
        }
    }

    fn from_result<T>(amount: i64, result: ResultEngine<T>) -> Self {
        match result {
            Ok(_) => Self::done(amount),
            Err(err) => Self::failed(amount, err),
        }
    }
}

/// Best-known final amount of a running workflow.
///
/// Phase 2 updates it as it learns more (a purchase only knows its amount
/// once the price is read), so a deadline expiring mid-phase still finalizes
/// the record with the latest figure.
#[derive(Debug)]
struct Progress(AtomicI64);

impl Progress {
    fn new(amount: i64) -> Self {
        Self(AtomicI64::new(amount))
    }

    fn record(&self, amount: i64) {
        self.0.store(amount, Ordering::Relaxed);
    }

    fn amount(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn wallets(&self) -> &WalletStore {
        &self.wallets
    }

    pub fn products(&self) -> &ProductStore {
        &self.products
    }

    pub fn records(&self) -> &TransactionStore {
        &self.records
    }

    /// Run `request` under the engine's configured deadline, if any.
    pub async fn execute(&self, request: TransactionRequest) -> ResultEngine<Settled> {
        let deadline = self.deadline.map(|budget| Instant::now() + budget);
        self.execute_until(request, deadline).await
    }

    /// Run `request`, bounding the mutation phase by `deadline`.
    ///
    /// An already expired deadline is rejected before any record is written.
    /// Expiry during phase 2 abandons the in-flight store call (the storage
    /// engine may still apply it) and the record is finalized as `failed`.
    /// Finalization itself is never bounded.
    pub async fn execute_until(
        &self,
        request: TransactionRequest,
        deadline: Option<Instant>,
    ) -> ResultEngine<Settled> {
        if let Some(deadline) = deadline
            && Instant::now() >= deadline
        {
            return Err(EngineError::DeadlineExceeded(format!(
                "{} request expired before it started",
                request.kind().as_str()
            )));
        }

        match request {
            TransactionRequest::Purchase(cmd) => self.purchase(cmd, deadline).await,
            TransactionRequest::Deposit(cmd) => self.deposit(cmd, deadline).await,
            TransactionRequest::Withdraw(cmd) => self.withdraw(cmd, deadline).await,
            TransactionRequest::Transfer(cmd) => self.transfer(cmd, deadline).await,
        }
    }

    /// Phases 1 to 3 around an already built phase-2 future.
    ///
    /// `mutation` is lazy: nothing in it runs before the intent record exists.
    async fn run_phases(
        &self,
        intent: NewTransactionRecord,
        deadline: Option<Instant>,
        progress: &Progress,
        mutation: impl Future<Output = Mutation>,
    ) -> ResultEngine<Settled> {
        let pending = self.records.create(&intent).await?;
        tracing::debug!(id = %pending.id, kind = pending.kind.as_str(), "transaction pending");

        let mutation = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, mutation)
                .await
                .unwrap_or_else(|_| {
                    Mutation::failed(
                        progress.amount(),
                        EngineError::DeadlineExceeded(format!(
                            "transaction {} timed out while mutating",
                            pending.id
                        )),
                    )
                }),
            None => mutation.await,
        };

        self.settle(pending.id, mutation).await
    }

    async fn settle(&self, id: Uuid, mutation: Mutation) -> ResultEngine<Settled> {
        let status = match mutation.result {
            Ok(()) => FinalStatus::Completed,
            Err(_) => FinalStatus::Failed,
        };

        let record = match self.records.finalize(id, mutation.amount, status).await {
            Ok(record) => record,
            Err(err) => {
                tracing::error!(%id, "failed to finalize transaction: {err}");
                return Err(EngineError::Finalize {
                    id,
                    source: Box::new(err),
                });
            }
        };

        match &mutation.result {
            Ok(()) => tracing::debug!(%id, amount = record.amount, "transaction completed"),
            Err(err) => tracing::info!(%id, amount = record.amount, "transaction failed: {err}"),
        }

        Ok(Settled {
            record,
            failure: mutation.result.err(),
        })
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    deadline: Option<Duration>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Bound every workflow started through [`Engine::execute`].
    pub fn deadline(mut self, deadline: Duration) -> EngineBuilder {
        self.deadline = Some(deadline);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            wallets: WalletStore::new(self.database.clone()),
            products: ProductStore::new(self.database.clone()),
            records: TransactionStore::new(self.database.clone()),
            database: self.database,
            deadline: self.deadline,
        })
    }
}

#[cfg(test)]
mod tests {
    use migration::MigratorTrait;
    use sea_orm::{ConnectionTrait, Database, Statement};

    use super::*;
    use crate::{DomainError, TransactionKind, TransactionStatus};

    async fn engine_with_wallet() -> (Engine, DatabaseConnection, i32) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder()
            .database(db.clone())
            .build()
            .await
            .unwrap();
        let user_id = engine.provision_user("alice").await.unwrap();
        let wallet = engine.wallets().create(user_id, 100).await.unwrap();
        (engine, db, wallet.id)
    }

    async fn exec(db: &DatabaseConnection, sql: &str) {
        db.execute(Statement::from_string(db.get_database_backend(), sql))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn deadline_during_mutation_finalizes_failed_with_best_known_amount() {
        let (engine, _db, wallet_id) = engine_with_wallet().await;
        let intent = NewTransactionRecord::new(TransactionKind::Purchase, 0).from_wallet(wallet_id);
        let progress = Progress::new(0);
        let mutation = async {
            progress.record(120);
            tokio::time::sleep(Duration::from_secs(30)).await;
            Mutation::done(120)
        };

        let settled = engine
            .run_phases(
                intent,
                Some(Instant::now() + Duration::from_millis(50)),
                &progress,
                mutation,
            )
            .await
            .unwrap();

        assert_eq!(settled.record.status, TransactionStatus::Failed);
        assert_eq!(settled.record.amount, 120);
        assert!(matches!(
            settled.failure,
            Some(EngineError::DeadlineExceeded(_))
        ));
        let stored = engine.records().get(settled.record.id).await.unwrap();
        assert_eq!(stored.status, TransactionStatus::Failed);
    }

    #[tokio::test]
    async fn finalize_on_terminal_record_is_fatal() {
        let (engine, db, wallet_id) = engine_with_wallet().await;
        let intent = NewTransactionRecord::new(TransactionKind::Deposit, 10).to_wallet(wallet_id);
        let progress = Progress::new(10);
        let mutation = async {
            exec(&db, "UPDATE transaction_histories SET t_status = 'failed'").await;
            Mutation::done(10)
        };

        let err = engine
            .run_phases(intent, None, &progress, mutation)
            .await
            .unwrap_err();

        let EngineError::Finalize { source, .. } = &err else {
            panic!("expected a finalize failure, got {err:?}");
        };
        assert!(matches!(**source, EngineError::InvalidTransition(_)));
        let error = DomainError::classify(&err);
        assert_eq!(error, DomainError::FatalEngine);
        assert_eq!(error.status_code(), 500);
    }

    #[tokio::test]
    async fn finalize_on_vanished_record_is_fatal() {
        let (engine, db, wallet_id) = engine_with_wallet().await;
        let intent = NewTransactionRecord::new(TransactionKind::Deposit, 10).to_wallet(wallet_id);
        let progress = Progress::new(10);
        let mutation = async {
            exec(&db, "DELETE FROM transaction_histories").await;
            Mutation::done(10)
        };

        let err = engine
            .run_phases(intent, None, &progress, mutation)
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            EngineError::Finalize { source, .. } if matches!(**source, EngineError::KeyNotFound(_))
        ));
    }

    #[test]
    fn progress_keeps_latest_amount() {
        let progress = Progress::new(0);
        progress.record(200);
        assert_eq!(progress.amount(), 200);
    }
}
