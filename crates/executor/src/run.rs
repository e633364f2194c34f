use crate::error::{ErrorKind, Result};
use crate::item::{Completed, WorkItem};
use crate::policy::{Classification, RetryPolicy};
use crate::reauth::ReauthGate;
use crate::source::{Pull, Source};
use async_stream::stream;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How long a starved executor waits before asking its source again.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs actions from a [`Source`] with at most `concurrency` in flight.
#[derive(Clone)]
pub struct Executor {
    concurrency: usize,
    policy: RetryPolicy,
    reauth: Option<Arc<ReauthGate>>,
}

impl Executor {
    pub fn new(concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            exn::bail!(ErrorKind::InvalidConcurrency(concurrency));
        }
        Ok(Self {
            concurrency,
            policy: RetryPolicy::default(),
            reauth: None,
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Without a gate, `Unauthorized` failures are simply backed off.
    pub fn with_reauth(mut self, gate: Arc<ReauthGate>) -> Self {
        self.reauth = Some(gate);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Streams every completed action in completion order.
    ///
    /// The stream ends once the source is exhausted and nothing is left in
    /// flight, or right after yielding the first error. Dropping the stream
    /// cancels whatever is still in flight.
    pub fn stream<'a, T, S>(&'a self, mut source: S) -> impl Stream<Item = Result<Completed<T>>> + 'a
    where
        T: Send + 'static,
        S: Source<T> + 'a,
    {
        stream!({
            let mut in_flight = FuturesUnordered::new();
            let mut exhausted = false;
            loop {
                let mut starved = false;
                while !exhausted && in_flight.len() < self.concurrency {
                    match source.pull() {
                        Pull::Item(item) => in_flight.push(self.execute(item)),
                        Pull::Starved => {
                            starved = true;
                            break;
                        },
                        Pull::Exhausted => exhausted = true,
                    }
                }

                if in_flight.is_empty() {
                    if exhausted {
                        break;
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                    continue;
                }

                let settled = if starved {
                    tokio::select! {
                        settled = in_flight.next() => settled,
                        () = tokio::time::sleep(POLL_INTERVAL) => None,
                    }
                } else {
                    in_flight.next().await
                };

                match settled {
                    Some(Ok(done)) => {
                        yield Ok(done);
                    },
                    Some(Err(err)) => {
                        yield Err(err);
                        return;
                    },
                    None => {},
                }
            }
        })
    }

    /// Runs the source to completion and collects the results.
    pub async fn run<T, S>(&self, source: S) -> Result<Vec<Completed<T>>>
    where
        T: Send + 'static,
        S: Source<T>,
    {
        self.stream(source).try_collect().await
    }

    async fn execute<T>(&self, item: WorkItem<T>) -> Result<Completed<T>> {
        let mut attempt: u32 = 0;
        loop {
            let generation = self.reauth.as_ref().map(|gate| gate.generation());
            let err = match item.invoke().await {
                Ok(output) => {
                    return Ok(Completed {
                        key: item.into_key(),
                        output,
                        attempts: attempt + 1,
                    });
                },
                Err(err) => err,
            };

            let code = *err;
            match self.policy.classify(code) {
                Classification::Fatal => {
                    return Err(err.raise(ErrorKind::Rejected { key: item.into_key() }));
                },
                Classification::Reauth => {
                    if let (Some(gate), Some(observed)) = (&self.reauth, generation) {
                        gate.reauthorize(observed).await;
                    }
                },
                Classification::Backoff => {},
            }

            attempt += 1;
            let Some(delay) = self.policy.delay(attempt) else {
                return Err(err.raise(ErrorKind::RetriesExhausted { key: item.into_key(), attempts: attempt }));
            };
            warn!(key = item.key(), attempt, %code, ?delay, "action failed, retrying");
            tokio::time::sleep(delay).await;
            debug!(key = item.key(), attempt, "retrying action");
        }
    }
}
