//! Request coordinator binding transport, host snapshot and selection.
//!
//! An [`AnnouncementClient`] owns at most one in-flight call. Starting a new
//! request or calling [`AnnouncementClient::cancel`] aborts the previous one,
//! and an aborted call never reaches its callback.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::host::HostContextProvider;
use crate::selection::{CardSelector, StandardEligibility};
use crate::transport::{AnnouncementTransport, HttpTransport, TransportError, WikiSite};
use crate::types::card::Card;

/// Receives the outcome of one request.
pub trait FeedCallback: Send + Sync {
    fn success(&self, cards: Vec<Card>);
    fn error(&self, cause: TransportError);
}

impl<C> FeedCallback for Arc<C>
where
    C: FeedCallback + ?Sized,
{
    fn success(&self, cards: Vec<Card>) {
        (**self).success(cards)
    }

    fn error(&self, cause: TransportError) {
        (**self).error(cause)
    }
}

/// How a finished request reaches its callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Straight from the task that completed the fetch.
    Immediate,
    /// Handed back to the scheduler first and delivered after `delay`, so the
    /// feed can batch it with other cards.
    Posted { delay: Duration },
}

impl Delivery {
    pub fn from_config(config: &ClientConfig) -> Self {
        match config.post_delay_ms {
            Some(ms) => Delivery::Posted {
                delay: Duration::from_millis(ms),
            },
            None => Delivery::Immediate,
        }
    }
}

impl Default for Delivery {
    fn default() -> Self {
        Delivery::Posted {
            delay: Duration::ZERO,
        }
    }
}

struct InFlight {
    live: Arc<Mutex<bool>>,
    handle: JoinHandle<()>,
}

impl InFlight {
    fn cancel(self) {
        // The delivering task claims the call under the same lock, so once
        // this returns an unclaimed call can no longer call back.
        *lock(&self.live) = false;
        self.handle.abort();
    }
}

fn lock(live: &Mutex<bool>) -> MutexGuard<'_, bool> {
    live.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct AnnouncementClient<T, H> {
    transport: Arc<T>,
    host: Arc<H>,
    selector: Arc<CardSelector<StandardEligibility>>,
    delivery: Delivery,
    runtime: Option<Handle>,
    call: Option<InFlight>,
}

impl<H> AnnouncementClient<HttpTransport, H>
where
    H: HostContextProvider + 'static,
{
    /// An HTTP-backed client with platforms, delivery and timeout from
    /// `config`.
    pub fn from_config(config: &ClientConfig, host: H) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(transport, host)
            .with_selector(CardSelector::with_platforms(config.platforms.clone()))
            .with_delivery(Delivery::from_config(config)))
    }
}

impl<T, H> AnnouncementClient<T, H>
where
    T: AnnouncementTransport + 'static,
    H: HostContextProvider + 'static,
{
    pub fn new(transport: T, host: H) -> Self {
        Self {
            transport: Arc::new(transport),
            host: Arc::new(host),
            selector: Arc::new(CardSelector::default()),
            delivery: Delivery::default(),
            runtime: None,
            call: None,
        }
    }

    pub fn with_selector(mut self, selector: CardSelector<StandardEligibility>) -> Self {
        self.selector = Arc::new(selector);
        self
    }

    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    /// Spawn calls on `runtime` rather than the ambient one.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Fetch announcements for `wiki` and deliver the selected cards, or the
    /// transport error, to `callback`.
    ///
    /// Any call still in flight is cancelled first and its callback never
    /// fires. Without [`with_runtime`](Self::with_runtime) this must be
    /// called from within a Tokio runtime.
    pub fn request<C>(&mut self, wiki: WikiSite, callback: C)
    where
        C: FeedCallback + 'static,
    {
        if self.call.is_some() {
            debug!(wiki = wiki.authority(), "superseding in-flight announcement request");
        }
        self.cancel();

        let live = Arc::new(Mutex::new(true));
        let task = deliver(
            Arc::clone(&self.transport),
            Arc::clone(&self.host),
            Arc::clone(&self.selector),
            self.delivery,
            wiki,
            callback,
            Arc::clone(&live),
        );
        let handle = match &self.runtime {
            Some(runtime) => runtime.spawn(task),
            None => tokio::spawn(task),
        };

        self.call = Some(InFlight { live, handle });
    }

    /// Abort the in-flight call, if any. Idempotent.
    ///
    /// A call whose delivery has already begun finishes it; any other call
    /// never reaches its callback. Safe to call from inside a callback.
    pub fn cancel(&mut self) {
        if let Some(call) = self.call.take() {
            debug!("cancelling announcement request");
            call.cancel();
        }
    }

    /// Whether a call is still waiting to deliver.
    pub fn is_in_flight(&self) -> bool {
        self.call
            .as_ref()
            .is_some_and(|call| *lock(&call.live) && !call.handle.is_finished())
    }
}

impl<T, H> Drop for AnnouncementClient<T, H> {
    fn drop(&mut self) {
        if let Some(call) = self.call.take() {
            call.cancel();
        }
    }
}

async fn deliver<T, H, C>(
    transport: Arc<T>,
    host: Arc<H>,
    selector: Arc<CardSelector<StandardEligibility>>,
    delivery: Delivery,
    wiki: WikiSite,
    callback: C,
    live: Arc<Mutex<bool>>,
) where
    T: AnnouncementTransport,
    H: HostContextProvider,
    C: FeedCallback,
{
    let outcome = transport.fetch(&wiki).await.map(|list| {
        let ctx = host.snapshot();
        selector.select(list, &ctx)
    });

    if let Delivery::Posted { delay } = delivery {
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
    }

    // Claim the call under the lock, then release it before calling back so
    // the callback may cancel, re-request or drop its client.
    let claimed = std::mem::replace(&mut *lock(&live), false);
    if !claimed {
        debug!(wiki = wiki.authority(), "dropping result of cancelled announcement request");
        return;
    }

    match outcome {
        Ok(result) => {
            info!(
                wiki = wiki.authority(),
                considered = result.selection.announcements_considered,
                selected = result.selection.cards_selected,
                "delivering announcement cards"
            );
            callback.success(result.cards);
        }
        Err(e) => {
            warn!(wiki = wiki.authority(), error = %e, "announcement request failed");
            callback.error(e);
        }
    }
}
