//! Server-side timing of a request.
//!
//! The client connector is wrapped so every new connection (DNS, TCP, TLS)
//! reports how long it took. A [`RequestTrace`] spans one hop and subtracts
//! whatever connect time was spent inside it, leaving the interval the server
//! spent on the request. Attempts never overlap, so any connect that happens
//! during a hop belongs to that hop.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::time::Instant;
use tower::{Layer, Service};

/// Running totals of connections opened by one client.
#[derive(Clone, Debug, Default)]
pub struct ConnectClock {
    connects: Arc<AtomicU64>,
    nanos: Arc<AtomicU64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectTotals {
    pub connects: u64,
    pub time: Duration,
}

impl ConnectClock {
    pub fn totals(&self) -> ConnectTotals {
        ConnectTotals {
            connects: self.connects.load(Ordering::Acquire),
            time: Duration::from_nanos(self.nanos.load(Ordering::Acquire)),
        }
    }

    fn record(&self, spent: Duration) {
        let nanos = u64::try_from(spent.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::AcqRel);
        self.connects.fetch_add(1, Ordering::AcqRel);
    }
}

/// Connector layer feeding a [`ConnectClock`].
#[derive(Clone, Debug)]
pub struct ConnectTimerLayer {
    clock: ConnectClock,
}

impl ConnectTimerLayer {
    pub fn new(clock: ConnectClock) -> Self {
        Self { clock }
    }
}

impl<S> Layer<S> for ConnectTimerLayer {
    type Service = TimedConnect<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimedConnect {
            inner,
            clock: self.clock.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TimedConnect<S> {
    inner: S,
    clock: ConnectClock,
}

impl<S, R> Service<R> for TimedConnect<S>
where
    S: Service<R>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, target: R) -> Self::Future {
        Box::pin(timed(self.inner.call(target), self.clock.clone()))
    }
}

async fn timed<F: Future>(connect: F, clock: ConnectClock) -> F::Output {
    let started = Instant::now();
    let out = connect.await;
    clock.record(started.elapsed());
    out
}

/// One hop: begun just before the request is handed to the client, closed
/// when the response head arrives.
#[derive(Debug)]
pub struct RequestTrace {
    started: Instant,
    before: ConnectTotals,
    first_byte: Option<Instant>,
    after: ConnectTotals,
}

impl RequestTrace {
    pub fn begin(clock: &ConnectClock) -> Self {
        let before = clock.totals();
        Self {
            started: Instant::now(),
            before,
            first_byte: None,
            after: before,
        }
    }

    pub fn got_first_response_byte(&mut self, clock: &ConnectClock) {
        self.first_byte = Some(Instant::now());
        self.after = clock.totals();
    }

    pub fn new_connections(&self) -> u64 {
        self.after.connects.saturating_sub(self.before.connects)
    }

    pub fn connect_time(&self) -> Duration {
        self.after.time.saturating_sub(self.before.time)
    }

    pub fn server_processing_time(&self) -> Duration {
        match self.first_byte {
            Some(done) => done
                .saturating_duration_since(self.started)
                .saturating_sub(self.connect_time()),
            None => Duration::ZERO,
        }
    }
}
