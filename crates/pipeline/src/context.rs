use mailport_executor::Executor;
use mailport_ledger::{KeyStrategy, StoreHandle};
use mailport_naming::LabelMapper;
use mailport_remote::RemoteHandle;
use mailport_spool::{Exclusions, SpoolHandle};
use std::sync::Arc;

/// Everything an import needs, shared by the label phase, the spool producer
/// and every send action.
pub struct Context {
    account: String,
    spool: SpoolHandle,
    remote: RemoteHandle,
    ledger: StoreHandle,
    executor: Executor,
    mapper: LabelMapper,
    rules: Exclusions,
    keys: KeyStrategy,
    lookup_concurrency: usize,
}

impl Context {
    /// Ledger lookups default to the executor's concurrency.
    pub fn new(
        account: impl Into<String>,
        spool: SpoolHandle,
        remote: RemoteHandle,
        ledger: StoreHandle,
        executor: Executor,
    ) -> Self {
        Self {
            account: account.into(),
            spool,
            remote,
            ledger,
            lookup_concurrency: executor.concurrency(),
            executor,
            mapper: LabelMapper::default(),
            rules: Exclusions::default(),
            keys: KeyStrategy::default(),
        }
    }

    pub fn with_mapper(mut self, mapper: LabelMapper) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn with_rules(mut self, rules: Exclusions) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_keys(mut self, keys: KeyStrategy) -> Self {
        self.keys = keys;
        self
    }

    /// Maximum number of outstanding ledger lookups while walking the spool.
    pub fn with_lookup_concurrency(mut self, lookups: usize) -> Self {
        self.lookup_concurrency = lookups.max(1);
        self
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn spool(&self) -> &SpoolHandle {
        &self.spool
    }

    pub fn remote(&self) -> &RemoteHandle {
        &self.remote
    }

    pub fn ledger(&self) -> &StoreHandle {
        &self.ledger
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn mapper(&self) -> &LabelMapper {
        &self.mapper
    }

    pub fn rules(&self) -> &Exclusions {
        &self.rules
    }

    pub fn keys(&self) -> KeyStrategy {
        self.keys
    }

    pub fn lookup_concurrency(&self) -> usize {
        self.lookup_concurrency
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
