//! Store/service wiring for the HTTP layer.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use bomledger_infra::batch_executor::BatchExecutor;
use bomledger_infra::catalog_store::{CatalogStore, InMemoryCatalog, PostgresCatalog};
use bomledger_infra::config::{AppConfig, StoreBackend};
use bomledger_infra::ledger_store::{InMemoryLedgerStore, LedgerStore, PostgresLedgerStore};
use bomledger_infra::postgres;
use bomledger_infra::revision_store::{InMemoryRevisionStore, PostgresRevisionStore, RevisionStore};
use bomledger_infra::services::{BomService, StockService};
use bomledger_infra::StoreError;
use bomledger_production::ShipmentPolicy;

type DynCatalog = Arc<dyn CatalogStore>;
type DynRevisions = Arc<dyn RevisionStore>;
type DynLedger = Arc<dyn LedgerStore>;

// Type-erased services so in-memory and Postgres backends share one router.
pub type AppBomService = BomService<DynCatalog, DynRevisions>;
pub type AppStockService = StockService<DynCatalog, DynLedger>;
pub type AppExecutor = BatchExecutor<DynCatalog, DynRevisions, DynLedger>;

#[derive(Debug, Error)]
pub enum ServiceInitError {
    #[error("failed to read catalog seed {path}: {source}")]
    Seed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct AppServices {
    executor: Arc<AppExecutor>,
    backend: &'static str,
}

impl AppServices {
    fn with_backend(
        catalog: DynCatalog,
        revisions: DynRevisions,
        ledger: DynLedger,
        policy: ShipmentPolicy,
        backend: &'static str,
    ) -> Self {
        let bom = BomService::new(catalog.clone(), revisions);
        let stock = StockService::new(catalog, ledger);
        Self {
            executor: Arc::new(BatchExecutor::new(bom, stock, policy)),
            backend,
        }
    }

    /// In-memory stores over the given catalog (tests, local dev).
    pub fn in_memory(catalog: Arc<InMemoryCatalog>, policy: ShipmentPolicy) -> Self {
        Self::with_backend(
            catalog,
            Arc::new(InMemoryRevisionStore::new()),
            Arc::new(InMemoryLedgerStore::new()),
            policy,
            "in_memory",
        )
    }

    pub fn bom(&self) -> &AppBomService {
        self.executor.bom()
    }

    pub fn stock(&self) -> &AppStockService {
        self.executor.stock()
    }

    pub fn executor(&self) -> &AppExecutor {
        &self.executor
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    pub fn shipment_policy(&self) -> ShipmentPolicy {
        self.executor.policy()
    }
}

/// Build services for the configured backend.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, ServiceInitError> {
    match &config.backend {
        StoreBackend::InMemory { catalog_seed } => {
            let catalog = match catalog_seed {
                Some(path) => {
                    let json = tokio::fs::read_to_string(path).await.map_err(|source| ServiceInitError::Seed {
                        path: path.display().to_string(),
                        source,
                    })?;
                    InMemoryCatalog::from_json(&json)?
                }
                None => InMemoryCatalog::new(),
            };
            info!(backend = "in_memory", "stores ready");
            Ok(AppServices::in_memory(Arc::new(catalog), config.shipment_policy))
        }
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = postgres::connect(database_url, *max_connections).await?;
            postgres::migrate(&pool).await?;
            info!(backend = "postgres", "stores ready");
            Ok(AppServices::with_backend(
                Arc::new(PostgresCatalog::new(pool.clone())),
                Arc::new(PostgresRevisionStore::new(pool.clone())),
                Arc::new(PostgresLedgerStore::new(pool)),
                config.shipment_policy,
                "postgres",
            ))
        }
    }
}
