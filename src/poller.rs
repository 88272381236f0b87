//! Invoice Status Poller
//!
//! Watches a pending invoice until it is paid. A poller is either idle or has
//! exactly one active subscription; each subscription is one task ticking at a
//! fixed interval. Ticks run one after another, so a slow fetch delays the
//! next tick rather than overlapping it.
//!
//! On each tick the invoice is fetched and merged into the last known
//! projection, which is then published. Failed fetches are logged and the
//! tick is skipped. When the invoice comes back paid the subscription ends
//! itself, clears the stored cart and publishes the final projection.

use std::{
    sync::{Arc, Mutex, PoisonError, Weak},
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, info, warn};

use crate::{
    api::CheckoutApi,
    cart::CartStore,
    invoices::{Invoice, InvoiceId, InvoiceUpdate},
};

/// Polling interval used unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Result of folding one fetched update into a [`PollState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The invoice is still pending; here is the merged projection.
    Updated(Invoice),

    /// The invoice just became paid; here is the final projection.
    Paid(Invoice),

    /// The invoice was already paid; the update was ignored.
    AlreadyPaid,
}

/// Last known projection of a watched invoice.
#[derive(Debug, Clone)]
pub struct PollState {
    invoice: Invoice,
    paid: bool,
}

impl PollState {
    /// Start from the projection returned by checkout.
    pub fn new(invoice: Invoice) -> Self {
        let paid = invoice.is_paid();

        Self { invoice, paid }
    }

    /// Merge a fetched update.
    ///
    /// The transition to paid is reported once; later updates are ignored.
    pub fn apply(&mut self, update: InvoiceUpdate) -> PollOutcome {
        if self.paid {
            return PollOutcome::AlreadyPaid;
        }

        self.invoice.merge(update);

        if self.invoice.is_paid() {
            self.paid = true;

            PollOutcome::Paid(self.invoice.clone())
        } else {
            PollOutcome::Updated(self.invoice.clone())
        }
    }

    /// Last known projection.
    pub fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    /// Whether the paid state has been reached.
    pub fn is_paid(&self) -> bool {
        self.paid
    }
}

#[derive(Debug, Default)]
struct Slot {
    next_generation: u64,
    current: Option<Subscription>,
}

#[derive(Debug)]
struct Subscription {
    generation: u64,
    invoice_id: InvoiceId,
    task: JoinHandle<()>,
}

impl Slot {
    /// Cancel the current subscription if it is `generation` (or any, if `None`).
    fn cancel(&mut self, generation: Option<u64>) -> bool {
        let matches = self
            .current
            .as_ref()
            .is_some_and(|sub| generation.is_none_or(|generation| sub.generation == generation));

        if !matches {
            return false;
        }

        if let Some(subscription) = self.current.take() {
            subscription.task.abort();

            debug!(invoice_id = %subscription.invoice_id, "invoice polling cancelled");
        }

        true
    }

    fn is_current(&self, generation: u64) -> bool {
        self.current
            .as_ref()
            .is_some_and(|sub| sub.generation == generation)
    }

    /// Forget the current subscription without aborting it, if it is `generation`.
    ///
    /// Returns `false` when `generation` has already been cancelled or replaced.
    fn release(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }

        self.current = None;

        true
    }
}

type SharedSlot = Arc<Mutex<Slot>>;

fn lock(slot: &Mutex<Slot>) -> std::sync::MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Polls invoices for payment. Dropping the poller cancels its subscription.
#[derive(Debug)]
pub struct InvoicePoller {
    api: Arc<dyn CheckoutApi>,
    carts: CartStore,
    interval: Duration,
    slot: SharedSlot,
}

impl InvoicePoller {
    /// Create an idle poller ticking every `interval`.
    pub fn new(api: Arc<dyn CheckoutApi>, carts: CartStore, interval: Duration) -> Self {
        Self {
            api,
            carts,
            interval,
            slot: SharedSlot::default(),
        }
    }

    /// Start watching `invoice`, replacing any current subscription.
    ///
    /// `on_update` receives every merged projection, the paid one last. An
    /// invoice that is already paid is finalised immediately without polling.
    /// Nothing is published once the subscription is cancelled or replaced.
    /// Pending updates are published while the poller's lock is held, so
    /// `on_update` must not call back into the poller.
    /// Must be called from within a Tokio runtime.
    pub fn subscribe<F>(&self, invoice: Invoice, on_update: F) -> PollHandle
    where
        F: Fn(Invoice) + Send + 'static,
    {
        let mut slot = lock(&self.slot);

        slot.cancel(None);

        let generation = slot.next_generation;
        slot.next_generation = slot.next_generation.wrapping_add(1);

        let handle = PollHandle {
            slot: Arc::downgrade(&self.slot),
            generation,
        };

        let state = PollState::new(invoice);

        if state.is_paid() {
            drop(slot);
            finish(&self.carts, state.invoice().id);
            on_update(state.invoice().clone());

            return handle;
        }

        let invoice_id = state.invoice().id;

        let task = tokio::spawn(poll(
            PollTask {
                api: Arc::clone(&self.api),
                carts: self.carts.clone(),
                interval: self.interval,
                slot: Arc::downgrade(&self.slot),
                generation,
            },
            state,
            on_update,
        ));

        slot.current = Some(Subscription {
            generation,
            invoice_id,
            task,
        });

        info!(%invoice_id, interval = ?self.interval, "invoice polling started");

        handle
    }

    /// Cancel the current subscription, if any. Safe to call repeatedly.
    pub fn cancel(&self) {
        lock(&self.slot).cancel(None);
    }

    /// Whether a subscription is live.
    pub fn is_active(&self) -> bool {
        lock(&self.slot).current.is_some()
    }

    /// Invoice being watched, if any.
    pub fn watching(&self) -> Option<InvoiceId> {
        lock(&self.slot).current.as_ref().map(|sub| sub.invoice_id)
    }
}

impl Drop for InvoicePoller {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Cancellation handle for one subscription.
///
/// Cancelling through a stale handle does not touch a newer subscription.
#[derive(Debug, Clone)]
pub struct PollHandle {
    slot: Weak<Mutex<Slot>>,
    generation: u64,
}

impl PollHandle {
    /// Cancel this subscription if it is still live. Safe to call repeatedly.
    pub fn cancel(&self) {
        if let Some(slot) = self.slot.upgrade() {
            lock(&slot).cancel(Some(self.generation));
        }
    }

    /// Whether this subscription is still live.
    pub fn is_active(&self) -> bool {
        self.slot.upgrade().is_some_and(|slot| {
            lock(&slot)
                .current
                .as_ref()
                .is_some_and(|sub| sub.generation == self.generation)
        })
    }
}

struct PollTask {
    api: Arc<dyn CheckoutApi>,
    carts: CartStore,
    interval: Duration,
    slot: Weak<Mutex<Slot>>,
    generation: u64,
}

async fn poll<F>(task: PollTask, mut state: PollState, on_update: F)
where
    F: Fn(Invoice) + Send + 'static,
{
    let invoice_id = state.invoice().id;
    let mut ticker = interval_at(Instant::now() + task.interval, task.interval);

    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let update = match task.api.get_invoice(invoice_id).await {
            Ok(update) => update,
            Err(error) => {
                warn!(%invoice_id, %error, "invoice poll failed, will retry");

                continue;
            }
        };

        // Abort only lands at an await point, so a fetch that was already in
        // flight when the subscription was replaced must not publish.
        match state.apply(update) {
            PollOutcome::Updated(invoice) => {
                let Some(shared) = task.slot.upgrade() else {
                    return;
                };

                let slot = lock(&shared);

                if !slot.is_current(task.generation) {
                    debug!(%invoice_id, "dropping update for superseded subscription");

                    return;
                }

                on_update(invoice);
            }
            PollOutcome::Paid(invoice) => {
                let released = task
                    .slot
                    .upgrade()
                    .is_some_and(|slot| lock(&slot).release(task.generation));

                if !released {
                    debug!(%invoice_id, "dropping payment for superseded subscription");

                    return;
                }

                finish(&task.carts, invoice_id);
                on_update(invoice);

                return;
            }
            PollOutcome::AlreadyPaid => return,
        }
    }
}

fn finish(carts: &CartStore, invoice_id: InvoiceId) {
    if let Err(error) = carts.clear() {
        warn!(%invoice_id, %error, "failed to clear cart after payment");
    }

    info!(%invoice_id, "invoice paid");
}
