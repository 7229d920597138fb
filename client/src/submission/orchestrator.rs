//! The submission state machine.
//!
//! One [`Orchestrator`] owns one source account and drives its transfers
//! sequentially through the transport it was given. Several orchestrators
//! may share a transport and a [`BroadcastRegistry`] behind `Arc`s and run
//! concurrently.
//!
//! ## Retry policy
//!
//! | Failure                               | Building / Broadcasting | Polling                       |
//! |---------------------------------------|-------------------------|-------------------------------|
//! | validation, signing, tick overflow    | fatal                   | n/a                           |
//! | connection refused, timeout           | backoff, bounded        | fixed interval, bounded       |
//! | remote code in transient allowlist    | backoff, bounded        | fixed interval, bounded       |
//! | any other remote code, malformed reply| fatal                   | fatal                         |
//!
//! Every network call and every sleep is raced against the cancel signal.

use std::future::Future;
use std::sync::Arc;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::cancel::CancelSignal;
use super::registry::{BroadcastRegistry, Claim};
use super::{Outcome, SubmissionError, SubmissionReport, SubmissionState};
use crate::config::{RetryPolicy, SubmissionConfig, MAX_SLOT_PROBES};
use crate::crypto::keys::SubSeed;
use crate::crypto::signer::{self, SignerError};
use crate::identity::Identity;
use crate::metrics::SubmissionMetrics;
use crate::tick::{assess, choose_target_tick, TickAssessment, TickError};
use crate::transaction::{
    sign_transaction, TickNumber, Transaction, TransactionBuilder, TransactionError, TxId,
    UnsignedTransaction,
};
use crate::transport::error::operation;
use crate::transport::{BroadcastReceipt, Transport, TransportError};

// ---------------------------------------------------------------------------
// SourceAccount
// ---------------------------------------------------------------------------

/// The sending side of a submission: a sub-seed and the identity it owns.
///
/// The seed string is consumed at construction and never stored.
#[derive(Debug)]
pub struct SourceAccount {
    subseed: SubSeed,
    identity: Identity,
}

impl SourceAccount {
    /// Derive the account from a 55-letter seed.
    pub fn from_seed(seed: &str) -> Result<Self, SignerError> {
        let subseed = signer::derive_subseed(seed)?;
        let identity = signer::identity(&subseed);
        Ok(Self { subseed, identity })
    }

    /// The source identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Sign a transfer originating from this account.
    pub fn sign(&self, unsigned: UnsignedTransaction) -> Result<Transaction, SignerError> {
        sign_transaction(unsigned, &self.subseed)
    }
}

// ---------------------------------------------------------------------------
// Internal plumbing
// ---------------------------------------------------------------------------

/// Why a phase stopped early.
enum Interrupt {
    Cancelled,
    Failed(SubmissionError),
}

impl From<SubmissionError> for Interrupt {
    fn from(error: SubmissionError) -> Self {
        Self::Failed(error)
    }
}

impl From<TransactionError> for Interrupt {
    fn from(error: TransactionError) -> Self {
        Self::Failed(error.into())
    }
}

impl From<SignerError> for Interrupt {
    fn from(error: SignerError) -> Self {
        Self::Failed(error.into())
    }
}

impl From<TickError> for Interrupt {
    fn from(error: TickError) -> Self {
        Self::Failed(error.into())
    }
}

fn settle(result: Result<Outcome, Interrupt>) -> Outcome {
    match result {
        Ok(outcome) => outcome,
        Err(Interrupt::Cancelled) => Outcome::Cancelled,
        Err(Interrupt::Failed(error)) => Outcome::Failed(error),
    }
}

/// Run `fut` unless cancellation wins first.
async fn cancellable<F: Future>(cancel: &CancelSignal, fut: F) -> Result<F::Output, Interrupt> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        output = fut => Ok(output),
    }
}

/// Bookkeeping for one submission.
struct Run {
    id: Uuid,
    started: Instant,
    states: Vec<SubmissionState>,
    tx_id: Option<TxId>,
    target_tick: Option<TickNumber>,
    receipt: Option<BroadcastReceipt>,
    slot_reserved: bool,
}

impl Run {
    fn start() -> Self {
        Self {
            id: Uuid::new_v4(),
            started: Instant::now(),
            states: Vec::new(),
            tx_id: None,
            target_tick: None,
            receipt: None,
            slot_reserved: false,
        }
    }

    fn enter(&mut self, state: SubmissionState) {
        info!(
            state = %state,
            tx_id = ?self.tx_id.map(|id| id.to_string()),
            target_tick = ?self.target_tick,
            "submission state"
        );
        self.states.push(state);
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives transfers from one source account to a terminal [`Outcome`].
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    registry: Arc<BroadcastRegistry>,
    account: SourceAccount,
    config: SubmissionConfig,
    metrics: Option<SubmissionMetrics>,
}

impl Orchestrator {
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: Arc<BroadcastRegistry>,
        account: SourceAccount,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            transport,
            registry,
            account,
            config,
            metrics: None,
        }
    }

    /// Record counters into `metrics`.
    pub fn with_metrics(mut self, metrics: SubmissionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The source account.
    pub fn account(&self) -> &SourceAccount {
        &self.account
    }

    /// The shared registry.
    pub fn registry(&self) -> &Arc<BroadcastRegistry> {
        &self.registry
    }

    /// Build, sign, broadcast and track a transfer of `amount` to
    /// `destination`.
    pub async fn submit(
        &self,
        destination: &str,
        amount: i64,
        cancel: &CancelSignal,
    ) -> SubmissionReport {
        let mut run = Run::start();
        let span = info_span!("submission", id = %run.id, destination);
        let outcome = async {
            match self.prepare(destination, amount, cancel, &mut run).await {
                Ok(tx) => settle(self.drive(&tx, cancel, &mut run).await),
                Err(interrupt) => settle(Err(interrupt)),
            }
        }
        .instrument(span)
        .await;

        if run.slot_reserved && matches!(outcome, Outcome::Failed(_) | Outcome::Cancelled) {
            let never_sent = run
                .tx_id
                .map_or(true, |id| self.registry.state(&id).is_none());
            if let (true, Some(tick)) = (never_sent, run.target_tick) {
                self.registry
                    .release_slot(self.account.identity().public_key(), tick);
            }
        }

        self.finish(run, outcome)
    }

    /// Broadcast and track an already signed transaction.
    ///
    /// The transaction is sent at most once per registry. A second call with
    /// the same transaction waits for the first broadcast to settle: if it
    /// was accepted it skips straight to polling, otherwise it broadcasts
    /// the transaction itself.
    pub async fn submit_signed(&self, tx: &Transaction, cancel: &CancelSignal) -> SubmissionReport {
        let mut run = Run::start();
        run.tx_id = Some(tx.id());
        run.target_tick = Some(tx.tick());
        let span = info_span!("submission", id = %run.id, tx_id = %tx.id());
        let outcome = settle(self.drive(tx, cancel, &mut run).instrument(span).await);
        self.finish(run, outcome)
    }

    // -- phases -------------------------------------------------------------

    async fn prepare(
        &self,
        destination: &str,
        amount: i64,
        cancel: &CancelSignal,
        run: &mut Run,
    ) -> Result<Transaction, Interrupt> {
        run.enter(SubmissionState::Building);
        let source = self.account.identity();
        // Validate before touching the network; the tick is filled in below.
        let unsigned = TransactionBuilder::new(source.as_str(), destination)
            .amount(amount)
            .build()?;

        let current = self
            .with_retry(
                operation::FETCH_LATEST_TICK,
                &self.config.tick_lookup_retry,
                cancel,
                || self.transport.fetch_latest_tick(),
            )
            .await?;
        let preferred = choose_target_tick(current, self.config.lead_ticks)?;

        self.registry.prune_slots_before(current);
        let target = self
            .registry
            .reserve_slot(source.public_key(), preferred, MAX_SLOT_PROBES, TxId::from_hash([0; 32]))
            .ok_or_else(|| SubmissionError::NoFreeSlot {
                identity: source.to_string(),
                first: preferred,
                last: preferred.saturating_add(MAX_SLOT_PROBES - 1),
            })?;
        run.target_tick = Some(target);
        run.slot_reserved = true;
        if target != preferred {
            info!(preferred, target, "tick slot taken, using next free tick");
        }

        run.enter(SubmissionState::Signing);
        let tx = self.account.sign(unsigned.with_tick(target))?;
        self.registry.bind_slot(source.public_key(), target, tx.id());
        run.tx_id = Some(tx.id());
        info!(
            tx_id = %tx.id(),
            current_tick = current,
            target_tick = target,
            amount,
            "transaction signed"
        );
        Ok(tx)
    }

    async fn drive(
        &self,
        tx: &Transaction,
        cancel: &CancelSignal,
        run: &mut Run,
    ) -> Result<Outcome, Interrupt> {
        self.broadcast(tx, cancel, run).await?;
        self.await_inclusion(tx, cancel, run).await
    }

    async fn broadcast(
        &self,
        tx: &Transaction,
        cancel: &CancelSignal,
        run: &mut Run,
    ) -> Result<(), Interrupt> {
        run.enter(SubmissionState::Broadcasting);
        let id = tx.id();

        loop {
            let waiter = match self.registry.claim(id) {
                Claim::Acquired => break,
                Claim::Done(receipt) => {
                    info!(tx_id = %id, "transaction already broadcast, not sending again");
                    self.metric(|m| m.broadcasts_deduplicated_total.inc());
                    run.receipt = Some(receipt);
                    return Ok(());
                }
                Claim::InFlight(waiter) => waiter,
            };
            info!(tx_id = %id, "identical broadcast in flight, waiting for it");
            match cancellable(cancel, waiter.settled()).await? {
                Some(receipt) => {
                    self.metric(|m| m.broadcasts_deduplicated_total.inc());
                    run.receipt = Some(receipt);
                    return Ok(());
                }
                None => info!(tx_id = %id, "in-flight broadcast was not accepted, claiming it"),
            }
        }

        let result = self
            .with_retry(
                operation::BROADCAST,
                &self.config.broadcast_retry,
                cancel,
                || self.transport.broadcast(tx),
            )
            .await;

        match result {
            Ok(receipt) => {
                self.registry.complete(id, receipt);
                self.metric(|m| m.broadcasts_total.inc());
                run.receipt = Some(receipt);
                info!(
                    tx_id = %id,
                    transport = self.transport.name(),
                    peers = receipt.peers_broadcasted,
                    "broadcast accepted"
                );
                Ok(())
            }
            Err(interrupt) => {
                self.registry.release(&id);
                Err(interrupt)
            }
        }
    }

    async fn await_inclusion(
        &self,
        tx: &Transaction,
        cancel: &CancelSignal,
        run: &mut Run,
    ) -> Result<Outcome, Interrupt> {
        run.enter(SubmissionState::AwaitingInclusion);
        let id = tx.id();
        let target = tx.tick();
        let poll = &self.config.poll;
        let started = Instant::now();
        let mut attempts = 0u32;
        let mut failures = 0u32;

        loop {
            if attempts >= poll.max_attempts || started.elapsed() >= poll.deadline {
                return Err(SubmissionError::PollExhausted {
                    target_tick: target,
                    attempts,
                    elapsed: started.elapsed(),
                }
                .into());
            }
            attempts += 1;
            self.metric(|m| m.poll_attempts_total.inc());

            match self.check_inclusion(id, target, cancel).await? {
                Ok(Some(outcome)) => return Ok(outcome),
                Ok(None) => failures = 0,
                Err(error) => {
                    failures += 1;
                    if !self.is_retryable(&error) || failures >= poll.max_consecutive_failures {
                        return Err(SubmissionError::Transport {
                            operation: error.operation(),
                            attempts: failures,
                            source: error,
                        }
                        .into());
                    }
                    warn!(
                        operation = error.operation(),
                        failures,
                        error = %error,
                        "poll failed, will retry"
                    );
                    self.metric(|m| m.record_retry(error.operation()));
                }
            }

            cancellable(cancel, sleep(poll.interval)).await?;
        }
    }

    /// One poll. `Ok(None)` means no verdict yet.
    async fn check_inclusion(
        &self,
        id: TxId,
        target: TickNumber,
        cancel: &CancelSignal,
    ) -> Result<Result<Option<Outcome>, TransportError>, Interrupt> {
        let status = match cancellable(cancel, self.transport.fetch_status()).await? {
            Ok(status) => status,
            Err(error) => return Ok(Err(error)),
        };
        let assessment = assess(target, &status);
        debug!(
            target_tick = target,
            last_processed = status.last_processed(),
            ?assessment,
            "polled status"
        );

        let abandoned = Outcome::Abandoned {
            tx_id: id,
            target_tick: target,
        };
        match assessment {
            TickAssessment::Pending => Ok(Ok(None)),
            TickAssessment::Skipped => Ok(Ok(Some(abandoned))),
            TickAssessment::Due | TickAssessment::Superseded => {
                let set = match cancellable(
                    cancel,
                    self.transport.fetch_tick_transactions(target, true),
                )
                .await?
                {
                    Ok(set) => set,
                    Err(error) => return Ok(Err(error)),
                };
                if set.contains(&id) {
                    Ok(Ok(Some(Outcome::Included {
                        tx_id: id,
                        tick: target,
                    })))
                } else if assessment == TickAssessment::Superseded {
                    Ok(Ok(Some(abandoned)))
                } else {
                    Ok(Ok(None))
                }
            }
        }
    }

    // -- helpers ------------------------------------------------------------

    async fn with_retry<T, F, Fut>(
        &self,
        op: &'static str,
        policy: &RetryPolicy,
        cancel: &CancelSignal,
        mut call: F,
    ) -> Result<T, Interrupt>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match cancellable(cancel, call()).await? {
                Ok(value) => return Ok(value),
                Err(error) if attempt < max_attempts && self.is_retryable(&error) => {
                    let delay = policy.backoff_after(attempt);
                    warn!(
                        operation = op,
                        attempt,
                        max_attempts,
                        ?delay,
                        error = %error,
                        "remote call failed, retrying"
                    );
                    self.metric(|m| m.record_retry(op));
                    cancellable(cancel, sleep(delay)).await?;
                }
                Err(error) => {
                    return Err(SubmissionError::Transport {
                        operation: op,
                        attempts: attempt,
                        source: error,
                    }
                    .into())
                }
            }
        }
    }

    fn is_retryable(&self, error: &TransportError) -> bool {
        error.is_retryable()
            || error
                .remote_code()
                .is_some_and(|code| self.config.is_transient_code(code))
    }

    fn metric(&self, record: impl FnOnce(&SubmissionMetrics)) {
        if let Some(metrics) = &self.metrics {
            record(metrics);
        }
    }

    fn finish(&self, mut run: Run, outcome: Outcome) -> SubmissionReport {
        run.enter(outcome.state());
        let elapsed = run.started.elapsed();
        match &outcome {
            Outcome::Included { tx_id, tick } => {
                info!(tx_id = %tx_id, tick, ?elapsed, "transaction included")
            }
            Outcome::Abandoned { tx_id, target_tick } => warn!(
                tx_id = %tx_id,
                target_tick,
                "target tick passed without inclusion, transaction abandoned"
            ),
            Outcome::Failed(error) => warn!(
                error = %error,
                cause = ?std::error::Error::source(error).map(|c| c.to_string()),
                "submission failed"
            ),
            Outcome::Cancelled => info!("submission cancelled"),
        }
        self.metric(|m| {
            m.record_outcome(outcome.label());
            m.submission_duration_seconds.observe(elapsed.as_secs_f64());
        });

        SubmissionReport {
            id: run.id,
            outcome,
            states: run.states,
            tx_id: run.tx_id,
            target_tick: run.target_tick,
            receipt: run.receipt,
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("transport", &self.transport.name())
            .field("endpoint", &self.transport.endpoint())
            .field("source", &self.account.identity().as_str())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    #[test]
    fn account_identity_matches_signer() {
        let account = SourceAccount::from_seed(SEED).unwrap();
        let subseed = signer::derive_subseed(SEED).unwrap();
        assert_eq!(account.identity(), &signer::identity(&subseed));
    }

    #[test]
    fn account_debug_hides_subseed() {
        let account = SourceAccount::from_seed(SEED).unwrap();
        let text = format!("{account:?}");
        assert!(text.contains("redacted"));
        assert!(!text.contains(SEED));
    }

    #[test]
    fn bad_seed_is_rejected() {
        assert!(matches!(
            SourceAccount::from_seed("short"),
            Err(SignerError::InvalidSeedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn cancellable_prefers_cancel() {
        let (handle, signal) = crate::submission::cancel_pair();
        handle.cancel();
        let result = cancellable(&signal, async { 1 }).await;
        assert!(matches!(result, Err(Interrupt::Cancelled)));
    }
}
