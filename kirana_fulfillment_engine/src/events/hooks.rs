use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderPlacedEvent,
    OrderStatusChangedEvent,
    RefillRequestedEvent,
    RefillStatusChangedEvent,
};

/// The producer ends of every subscribed event channel. Flow APIs hold one of these and
/// publish transition events into it; an empty set of producers means events are dropped on
/// the floor, which is fine for tests that do not care about notifications.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_placed_producer: Vec<EventProducer<OrderPlacedEvent>>,
    pub order_status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
    pub refill_requested_producer: Vec<EventProducer<RefillRequestedEvent>>,
    pub refill_status_changed_producer: Vec<EventProducer<RefillStatusChangedEvent>>,
}

pub struct EventHandlers {
    pub on_order_placed: Option<EventHandler<OrderPlacedEvent>>,
    pub on_order_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
    pub on_refill_requested: Option<EventHandler<RefillRequestedEvent>>,
    pub on_refill_status_changed: Option<EventHandler<RefillStatusChangedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_placed = hooks.on_order_placed.map(|f| EventHandler::new(buffer_size, f));
        let on_order_status_changed = hooks.on_order_status_changed.map(|f| EventHandler::new(buffer_size, f));
        let on_refill_requested = hooks.on_refill_requested.map(|f| EventHandler::new(buffer_size, f));
        let on_refill_status_changed = hooks.on_refill_status_changed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_placed, on_order_status_changed, on_refill_requested, on_refill_status_changed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_placed {
            result.order_placed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_status_changed {
            result.order_status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_refill_requested {
            result.refill_requested_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_refill_status_changed {
            result.refill_status_changed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_placed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_order_status_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_refill_requested {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_refill_status_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

/// Async callbacks to attach to fulfilment transitions.
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_placed: Option<Handler<OrderPlacedEvent>>,
    pub on_order_status_changed: Option<Handler<OrderStatusChangedEvent>>,
    pub on_refill_requested: Option<Handler<RefillRequestedEvent>>,
    pub on_refill_status_changed: Option<Handler<RefillStatusChangedEvent>>,
}

impl EventHooks {
    pub fn on_order_placed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPlacedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_placed = Some(Arc::new(f));
        self
    }

    pub fn on_order_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_refill_requested<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(RefillRequestedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_refill_requested = Some(Arc::new(f));
        self
    }

    pub fn on_refill_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(RefillStatusChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_refill_status_changed = Some(Arc::new(f));
        self
    }
}
