//! # Builder for [`Aggregator`].
//!
//! Collects the parts that stay fixed for the whole run (config, layout, sink,
//! subscribers) and wires the bus and the subscriber workers.

use std::sync::Arc;

use crate::{
    core::{Config, aggregator::Aggregator},
    events::Bus,
    render::Layout,
    sink::Sink,
    subscribers::{LogWriter, Subscribe, SubscriberSet},
};

/// Builder for constructing an [`Aggregator`].
pub struct AggregatorBuilder {
    cfg: Config,
    layout: Layout,
    sink: Arc<dyn Sink>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl AggregatorBuilder {
    /// Creates a new builder.
    pub fn new(cfg: Config, layout: Layout, sink: Arc<dyn Sink>) -> Self {
        Self {
            cfg,
            layout,
            sink,
            subscribers: Vec::new(),
        }
    }

    /// Sets additional event subscribers.
    ///
    /// Subscribers receive lifecycle events (restarts, renders, sink failures)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the aggregator.
    ///
    /// Installs [`LogWriter`] in front of the custom subscribers when
    /// `cfg.log_events` is set. Must be called inside a tokio runtime.
    pub fn build(self) -> Aggregator {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        let mut subscribers = self.subscribers;
        if self.cfg.log_events {
            subscribers.insert(0, Arc::new(LogWriter::default()));
        }
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));

        Aggregator::new_internal(self.cfg, bus, subs, Arc::new(self.layout), self.sink)
    }
}
