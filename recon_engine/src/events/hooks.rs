use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    DiscrepancyResolvedEvent,
    EventHandler,
    EventProducer,
    Handler,
    ReconciliationCompletedEvent,
    ReconciliationFailedEvent,
    ReconciliationStartedEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub started_producer: Vec<EventProducer<ReconciliationStartedEvent>>,
    pub completed_producer: Vec<EventProducer<ReconciliationCompletedEvent>>,
    pub failed_producer: Vec<EventProducer<ReconciliationFailedEvent>>,
    pub resolved_producer: Vec<EventProducer<DiscrepancyResolvedEvent>>,
}

pub struct EventHandlers {
    pub on_started: Option<EventHandler<ReconciliationStartedEvent>>,
    pub on_completed: Option<EventHandler<ReconciliationCompletedEvent>>,
    pub on_failed: Option<EventHandler<ReconciliationFailedEvent>>,
    pub on_resolved: Option<EventHandler<DiscrepancyResolvedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_started = hooks.on_started.map(|f| EventHandler::new(buffer_size, f));
        let on_completed = hooks.on_completed.map(|f| EventHandler::new(buffer_size, f));
        let on_failed = hooks.on_failed.map(|f| EventHandler::new(buffer_size, f));
        let on_resolved = hooks.on_resolved.map(|f| EventHandler::new(buffer_size, f));
        Self { on_started, on_completed, on_failed, on_resolved }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_started {
            result.started_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_completed {
            result.completed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_failed {
            result.failed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_resolved {
            result.resolved_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_started {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_completed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_failed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_resolved {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_started: Option<Handler<ReconciliationStartedEvent>>,
    pub on_completed: Option<Handler<ReconciliationCompletedEvent>>,
    pub on_failed: Option<Handler<ReconciliationFailedEvent>>,
    pub on_resolved: Option<Handler<DiscrepancyResolvedEvent>>,
}

impl EventHooks {
    pub fn on_started<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ReconciliationStartedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static
    {
        self.on_started = Some(Arc::new(f));
        self
    }

    pub fn on_completed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ReconciliationCompletedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static
    {
        self.on_completed = Some(Arc::new(f));
        self
    }

    pub fn on_failed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ReconciliationFailedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_failed = Some(Arc::new(f));
        self
    }

    pub fn on_resolved<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(DiscrepancyResolvedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_resolved = Some(Arc::new(f));
        self
    }
}
