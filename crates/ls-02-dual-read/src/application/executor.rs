//! # Dual Read Executor
//!
//! Issues one logical read on the selected channels concurrently and hands
//! the results to the caller in arrival order, through a per-fetch
//! [`VerifiedGate`].
//!
//! The resolution policy only decides when `fetch` hands control back. The
//! branches of a raced fetch keep running in a [`Fetch`] remainder that the
//! caller settles before treating the read as finished.

use crate::algorithms::VerifiedGate;
use crate::config::DualReadConfig;
use crate::domain::{Delivered, FetchReport, Resolution};
use crate::ports::{DeliverySink, ReadProbe};
use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{BoxStream, FuturesUnordered, StreamExt};
use shared_types::{ReadChannel, RemoteError};
use std::sync::Arc;
use sync_telemetry::DUAL_READ_DROPPED_UNVERIFIED;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Gated deliveries of one fetch, in arrival order.
pub type DeliveryStream<T> = BoxStream<'static, Delivered<T>>;

type Branch<T> = BoxFuture<'static, (ReadChannel, Result<T, RemoteError>)>;

/// Runs dual-channel reads under a fixed policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DualReadExecutor {
    config: DualReadConfig,
}

impl DualReadExecutor {
    /// Create an executor.
    #[must_use]
    pub fn new(config: DualReadConfig) -> Self {
        Self { config }
    }

    /// The policy in use.
    #[must_use]
    pub fn config(&self) -> DualReadConfig {
        self.config
    }

    /// Launch the selected branches and return their gated deliveries.
    ///
    /// Branches only make progress while the stream is polled.
    pub fn stream<T, P>(&self, probe: Arc<P>) -> DeliveryStream<T>
    where
        T: Send + 'static,
        P: ReadProbe<T> + ?Sized + 'static,
    {
        let branches: FuturesUnordered<Branch<T>> = self
            .config
            .strategy
            .channels()
            .iter()
            .map(|&channel| {
                let probe = Arc::clone(&probe);
                async move {
                    let result = probe.read(channel).await;
                    (channel, result)
                }
                .boxed()
            })
            .collect();

        let mut gate = VerifiedGate::new();
        branches
            .filter_map(move |(channel, result)| {
                let admitted = gate.admit(channel);
                if !admitted {
                    DUAL_READ_DROPPED_UNVERIFIED.inc();
                    debug!(ok = result.is_ok(), "[ls-02] Unverified delivery dropped after verified");
                }
                future::ready(admitted.then(|| Delivered::from_branch(channel, result)))
            })
            .boxed()
    }

    /// Run one fetch, driving `sink` with every admitted delivery.
    ///
    /// Under [`Resolution::AllSettled`] this returns once every branch
    /// settled. Under [`Resolution::Race`] it returns after the first
    /// admitted delivery; the remaining branch keeps delivering to `sink`
    /// and is awaited through [`Fetch::settle`].
    pub async fn fetch<T, P, S>(&self, probe: Arc<P>, sink: Arc<S>) -> Fetch
    where
        T: Send + 'static,
        P: ReadProbe<T> + ?Sized + 'static,
        S: DeliverySink<T> + ?Sized + 'static,
    {
        let issued = self.config.strategy.channels().len();
        let mut stream = self.stream(probe);
        let mut report = FetchReport::default();

        match self.config.resolution {
            Resolution::AllSettled => {
                drain(&mut stream, sink.as_ref(), &mut report).await;
                report.complete = true;
                Fetch::settled(report)
            }
            Resolution::Race => {
                match stream.next().await {
                    Some(delivered) => {
                        report.record(&delivered);
                        dispatch(sink.as_ref(), delivered).await;
                    }
                    None => report.complete = true,
                }
                if report.complete || issued < 2 {
                    report.complete = true;
                    return Fetch::settled(report);
                }
                let remainder = tokio::spawn(async move {
                    let mut rest = FetchReport::default();
                    drain(&mut stream, sink.as_ref(), &mut rest).await;
                    rest
                });
                Fetch {
                    report,
                    remainder: Some(remainder),
                }
            }
        }
    }
}

/// A fetch whose first deliveries were handed to the sink.
///
/// Dropping an unsettled fetch detaches its remainder; the sink still sees
/// every admitted delivery.
#[derive(Debug)]
pub struct Fetch {
    report: FetchReport,
    remainder: Option<JoinHandle<FetchReport>>,
}

impl Fetch {
    fn settled(report: FetchReport) -> Self {
        Self {
            report,
            remainder: None,
        }
    }

    /// What was delivered before `fetch` returned.
    #[must_use]
    pub fn report(&self) -> &FetchReport {
        &self.report
    }

    /// Whether every issued branch has already been accounted for.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.remainder.is_none()
    }

    /// Wait for the remaining branches and return the report of the whole
    /// fetch, including a verified failure that arrived after the race.
    pub async fn settle(mut self) -> FetchReport {
        if let Some(remainder) = self.remainder.take() {
            match remainder.await {
                Ok(rest) => {
                    self.report.merge(rest);
                    self.report.complete = true;
                }
                Err(err) => warn!(error = %err, "[ls-02] Fetch remainder did not finish"),
            }
        }
        self.report
    }
}

async fn drain<T, S>(stream: &mut DeliveryStream<T>, sink: &S, report: &mut FetchReport)
where
    T: Send + 'static,
    S: DeliverySink<T> + ?Sized,
{
    while let Some(delivered) = stream.next().await {
        report.record(&delivered);
        dispatch(sink, delivered).await;
    }
}

async fn dispatch<T, S>(sink: &S, delivered: Delivered<T>)
where
    T: Send + 'static,
    S: DeliverySink<T> + ?Sized,
{
    match delivered {
        Delivered::Value(value) => {
            debug!(channel = %value.channel(), "[ls-02] Value delivered");
            sink.on_value(value).await;
        }
        Delivered::Failure(failure) => {
            sink.on_error(&failure).await;
            if failure.is_verified() {
                sink.on_verified_error(&failure).await;
            }
        }
    }
}
