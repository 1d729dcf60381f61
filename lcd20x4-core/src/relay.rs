//! Button event relay
//!
//! The peripheral calls back from its own context. The registered handler
//! only appends to the edge queue and raises a signal; the relay drains that
//! queue and turns each edge into a switch update on the matching button
//! control point. Edges are forwarded one by one, in the order they arrived,
//! and none are dropped.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use lcd20x4_display::ButtonHandler;
use lcd20x4_protocol::ButtonEvent;

use crate::error::{SessionError, ValidationError};
use crate::host::{ControlPoint, HostPlatform};

struct EdgeQueue {
    edges: Mutex<CriticalSectionRawMutex, RefCell<VecDeque<ButtonEvent>>>,
    /// Raised whenever an edge is queued
    ready: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for EdgeQueue {
    fn default() -> Self {
        Self {
            edges: Mutex::new(RefCell::new(VecDeque::new())),
            ready: Signal::new(),
        }
    }
}

impl EdgeQueue {
    fn push(&self, event: ButtonEvent) {
        self.edges.lock(|edges| edges.borrow_mut().push_back(event));
        self.ready.signal(());
    }

    fn pop(&self) -> Option<ButtonEvent> {
        self.edges.lock(|edges| edges.borrow_mut().pop_front())
    }
}

/// Inbound button event queue and its consumer
#[derive(Clone, Default)]
pub struct EventRelay {
    queue: Arc<EdgeQueue>,
}

impl EventRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback to register with the peripheral
    ///
    /// Never blocks and never takes the session lock.
    pub fn handler(&self) -> ButtonHandler {
        let queue = Arc::clone(&self.queue);
        Box::new(move |event| queue.push(event))
    }

    /// Publish one edge to the host
    pub fn forward<H>(&self, event: ButtonEvent, host: &H) -> Result<(), SessionError>
    where
        H: HostPlatform + ?Sized,
    {
        if !event.is_valid() {
            return Err(ValidationError::Button(event.button).into());
        }
        host.update_switch(ControlPoint::Button(event.button), event.edge.is_on());
        Ok(())
    }

    /// Forward every queued edge without waiting
    ///
    /// Returns the number of edges forwarded.
    pub fn drain<H>(&self, host: &H) -> usize
    where
        H: HostPlatform + ?Sized,
    {
        let mut forwarded = 0;
        // Popped one at a time so the callback can keep queueing meanwhile
        while let Some(event) = self.queue.pop() {
            match self.forward(event, host) {
                Ok(()) => forwarded += 1,
                Err(error) => host.error(&format!("button event: {}", error)),
            }
        }
        forwarded
    }

    /// Forward edges as they arrive
    pub async fn run<H>(&self, host: &H)
    where
        H: HostPlatform + ?Sized,
    {
        loop {
            self.queue.ready.wait().await;
            let forwarded = self.drain(host);
            log::trace!("relayed {} button edges", forwarded);
        }
    }
}
