use std::sync::Arc;

use bh_ledger::{CommitResult, LedgerError, PointerLedger};
use bh_session::Session;
use bh_store::ContentStoreClient;
use bh_types::{ContentAddress, HistoryEntryDraft, Identity, PatientProfile, PatientRecord};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{OrchestratorConfig, ReadPolicy};
use crate::error::{FailureReason, UpdateError, UpdateResult};
use crate::state::UpdateState;

/// State of one invocation. Errors are tagged with the state current at
/// the time they occur.
struct Invocation {
    state: UpdateState,
}

impl Invocation {
    fn new() -> Self {
        Self {
            state: UpdateState::Idle,
        }
    }

    fn enter(&mut self, next: UpdateState) {
        debug!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }

    fn fail(&mut self, reason: impl Into<FailureReason>) -> UpdateError {
        let error = UpdateError::new(self.state, reason);
        warn!(state = %error.state, reason = %error.reason, "invocation failed");
        self.state = UpdateState::Failed;
        error
    }

    fn finish(&mut self) {
        self.enter(UpdateState::Done);
    }
}

/// Read-modify-write over one patient's record.
///
/// The ledger holds the authoritative pointer, the content store holds the
/// immutable documents and the session supplies identity and credentials.
/// Every public operation is a fresh invocation starting from
/// [`UpdateState::Idle`]; nothing is retried automatically.
///
/// Under the default "authorize and record" ledger semantics two concurrent
/// `append`s on one identity can both succeed, and the later commit
/// silently drops the earlier edit. Pair
/// [`OrchestratorConfig::expect_prior_pointer`] with a compare-and-swap
/// ledger to turn that into a `Conflict` rejection.
pub struct RecordOrchestrator {
    store: ContentStoreClient,
    ledger: Arc<dyn PointerLedger>,
    session: Arc<Session>,
    config: OrchestratorConfig,
}

impl RecordOrchestrator {
    pub fn new(
        store: ContentStoreClient,
        ledger: Arc<dyn PointerLedger>,
        session: Arc<Session>,
    ) -> Self {
        Self {
            store,
            ledger,
            session,
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn ledger(&self) -> &Arc<dyn PointerLedger> {
        &self.ledger
    }

    pub fn store(&self) -> &ContentStoreClient {
        &self.store
    }

    /// Fetch the current record of `identity`, or of the session's identity.
    ///
    /// Resolves through the ledger unless the config tolerates stale reads
    /// and the session has a cached pointer.
    pub async fn read(&self, identity: Option<Identity>) -> UpdateResult<PatientRecord> {
        let span = info_span!("read", invocation = %Uuid::now_v7());
        async move {
            let mut run = Invocation::new();
            let identity = self.connect(&mut run, identity).await?;
            let pointer = self
                .resolve(&mut run, &identity, self.config.read_policy)
                .await?;
            let record = self.fetch(&mut run, &pointer).await?;
            self.session.update_cache(&identity, pointer);
            run.finish();
            Ok(record)
        }
        .instrument(span)
        .await
    }

    /// Apply `edit` to the freshly fetched record and commit the result.
    ///
    /// The edit must keep the prior history as a prefix. Returns the
    /// address of the new record.
    pub async fn append<F>(&self, identity: Option<Identity>, edit: F) -> UpdateResult<ContentAddress>
    where
        F: FnOnce(PatientRecord) -> PatientRecord + Send,
    {
        let span = info_span!("append", invocation = %Uuid::now_v7());
        async move {
            let mut run = Invocation::new();
            let identity = self.connect(&mut run, identity).await?;
            let prior_pointer = self
                .resolve(&mut run, &identity, ReadPolicy::Authoritative)
                .await?;
            let prior = self.fetch(&mut run, &prior_pointer).await?;

            run.enter(UpdateState::Editing);
            let edited = edit(prior.clone());
            edited
                .validate()
                .and_then(|()| edited.extends(&prior))
                .map_err(|e| run.fail(e))?;

            self.store_and_commit(&mut run, &identity, &edited, Some(prior_pointer))
                .await
        }
        .instrument(span)
        .await
    }

    /// Append one history entry from form input.
    ///
    /// The draft is checked before anything touches the network; a bad
    /// draft fails in `Editing` with no store or ledger calls.
    pub async fn append_entry(
        &self,
        identity: Option<Identity>,
        draft: HistoryEntryDraft,
    ) -> UpdateResult<ContentAddress> {
        let entry = draft.validate().map_err(|e| {
            warn!(error = %e, "history entry rejected");
            UpdateError::new(UpdateState::Editing, e)
        })?;
        self.append(identity, move |record| record.with_entry(entry))
            .await
    }

    /// Store a new record with an empty history and point the identity at it.
    ///
    /// Fails in `Resolving` with [`FailureReason::AlreadyRegistered`] if the
    /// identity already has a pointer; nothing is stored in that case.
    pub async fn register(
        &self,
        identity: Option<Identity>,
        profile: PatientProfile,
    ) -> UpdateResult<ContentAddress> {
        let span = info_span!("register", invocation = %Uuid::now_v7());
        async move {
            let mut run = Invocation::new();
            let identity = self.connect(&mut run, identity).await?;

            run.enter(UpdateState::Resolving);
            match self.ledger.resolve(&identity).await {
                Err(LedgerError::UnknownIdentity(_)) => {}
                Ok(current) => return Err(run.fail(FailureReason::AlreadyRegistered(current))),
                Err(e) => return Err(run.fail(e)),
            }

            run.enter(UpdateState::Editing);
            let record = PatientRecord::new(profile);
            record.validate().map_err(|e| run.fail(e))?;

            self.store_and_commit(&mut run, &identity, &record, None)
                .await
        }
        .instrument(span)
        .await
    }

    async fn connect(&self, run: &mut Invocation, identity: Option<Identity>) -> UpdateResult<Identity> {
        run.enter(UpdateState::Connecting);
        match identity {
            Some(identity) => Ok(identity),
            None => self.session.connect().await.map_err(|e| run.fail(e)),
        }
    }

    async fn resolve(
        &self,
        run: &mut Invocation,
        identity: &Identity,
        policy: ReadPolicy,
    ) -> UpdateResult<ContentAddress> {
        run.enter(UpdateState::Resolving);
        if policy == ReadPolicy::TolerateStale {
            if let Some(pointer) = self.session.cached_pointer_for(identity) {
                debug!(identity = %identity, pointer = %pointer.short_hex(), "using cached pointer");
                return Ok(pointer);
            }
        }
        self.ledger.resolve(identity).await.map_err(|e| run.fail(e))
    }

    async fn fetch(&self, run: &mut Invocation, pointer: &ContentAddress) -> UpdateResult<PatientRecord> {
        run.enter(UpdateState::Fetching);
        let fetched = match &self.config.fetch_retry {
            Some(policy) => self.store.get_with_retry(pointer, policy).await,
            None => self.store.get(pointer).await,
        };
        fetched.map_err(|e| run.fail(e))
    }

    async fn store_and_commit(
        &self,
        run: &mut Invocation,
        identity: &Identity,
        record: &PatientRecord,
        prior: Option<ContentAddress>,
    ) -> UpdateResult<ContentAddress> {
        run.enter(UpdateState::Storing);
        let address = self.store.put(record).await.map_err(|e| run.fail(e))?;

        run.enter(UpdateState::Committing);
        let credential = self
            .session
            .credential_for(identity, &address)
            .await
            .map_err(|e| run.fail(e))?;
        let outcome = if self.config.expect_prior_pointer {
            self.ledger
                .commit_expecting(identity, prior, address, &credential)
                .await
        } else {
            self.ledger.commit(identity, address, &credential).await
        };

        match outcome {
            CommitResult::Accepted { seq } => {
                self.session.update_cache(identity, address);
                info!(identity = %identity, address = %address.short_hex(), seq, "pointer committed");
                run.finish();
                Ok(address)
            }
            CommitResult::Rejected(reason) => Err(run.fail(FailureReason::Rejected(reason))),
        }
    }
}
