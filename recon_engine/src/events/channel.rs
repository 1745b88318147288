//! Simple stateless pub-sub event handler
//!
//! This module provides a simple hook system that lets components of the system subscribe to reconciliation events
//! and react to them. The event handler is stateless, i.e. the handlers have no access to the internal state of the
//! engine. All that is received is the event itself.
//!
//! However, the handlers can be async.
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use log::*;
use tokio::sync::mpsc;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Fans one reconciliation event stream out to a single async handler function.
///
/// Each received event is dispatched on its own tokio task, so a slow subscriber never blocks the run that
/// published the event. The handler shuts down once every producer has been dropped and all dispatched events
/// have been handled.
pub struct EventHandler<E: Send + Sync + 'static> {
    inbox: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, inbox) = mpsc::channel(buffer_size);
        Self { inbox, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    pub async fn start_handler(mut self) {
        debug!("📬️ Reconciliation event handler listening");
        // drop the internal sender so the inbox closes when the last subscribed producer is dropped
        drop(self.sender);
        let in_flight = Arc::new(AtomicUsize::new(0));
        while let Some(event) = self.inbox.recv().await {
            trace!("📬️ Dispatching reconciliation event");
            let handler = Arc::clone(&self.handler);
            let gauge = Arc::clone(&in_flight);
            gauge.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                (handler)(event).await;
                gauge.fetch_sub(1, Ordering::SeqCst);
                trace!("📬️ Reconciliation event handled");
            });
        }
        // The stream is closed; wait for dispatched events to finish before shutting down.
        loop {
            let pending = in_flight.load(Ordering::SeqCst);
            if pending == 0 {
                break;
            }
            debug!("📬️ Waiting for {pending} in-flight event handlers to finish");
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
        debug!("📬️ Reconciliation event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Fire-and-forget: a closed channel is logged and swallowed, because no reconciliation run should ever fail
    /// over a subscriber that went away.
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to publish reconciliation event: {e}");
        }
    }
}
