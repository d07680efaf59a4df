//! Tests for event subscription and delivery.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use tracing_test::traced_test;

use crate::client::{ClientEvent, events::EventHub};

fn counter(hub: &EventHub) -> (Arc<AtomicUsize>, crate::client::SubscriptionId) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    let id = hub.subscribe(Arc::new(move |_: &ClientEvent| {
        seen.fetch_add(1, Ordering::SeqCst);
    }));
    (count, id)
}

#[test]
fn delivers_to_every_subscriber() {
    let hub = EventHub::default();
    let (first, _) = counter(&hub);
    let (second, _) = counter(&hub);
    hub.emit(&ClientEvent::Connected);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn unsubscribed_handler_is_not_called() {
    let hub = EventHub::default();
    let (count, id) = counter(&hub);
    assert!(hub.unsubscribe(id));
    assert!(!hub.unsubscribe(id), "second removal finds nothing");
    hub.emit(&ClientEvent::Disconnected);
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[traced_test]
#[test]
fn panicking_handler_does_not_stop_delivery() {
    let hub = EventHub::default();
    hub.subscribe(Arc::new(|_: &ClientEvent| panic!("handler exploded")));
    let (count, _) = counter(&hub);

    hub.emit(&ClientEvent::Connected);
    hub.emit(&ClientEvent::Connected);

    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert!(logs_contain("event handler panicked"));
    assert!(logs_contain("handler exploded"));
}

#[test]
fn handler_may_unsubscribe_itself_during_emit() {
    let hub = Arc::new(EventHub::default());
    let count = Arc::new(AtomicUsize::new(0));
    let slot = Arc::new(parking_lot::Mutex::new(None));

    let handler_hub = Arc::clone(&hub);
    let handler_count = Arc::clone(&count);
    let handler_slot = Arc::clone(&slot);
    let id = hub.subscribe(Arc::new(move |_: &ClientEvent| {
        handler_count.fetch_add(1, Ordering::SeqCst);
        if let Some(id) = handler_slot.lock().take() {
            handler_hub.unsubscribe(id);
        }
    }));
    *slot.lock() = Some(id);

    hub.emit(&ClientEvent::Connected);
    hub.emit(&ClientEvent::Connected);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
