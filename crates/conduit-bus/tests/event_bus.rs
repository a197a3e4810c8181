//! Fan-out publishing across delivery queues.

use std::fmt;
use std::sync::Arc;

use conduit_bus::prelude::*;
use conduit_bus::{EVENT_DELIVER_POST, EVENT_DELIVER_PRE, EVENT_PUBLISH_POST, EVENT_PUBLISH_PRE};
use parking_lot::Mutex;
use serde_json::json;

#[derive(Debug)]
struct QueueOffline(String);

impl fmt::Display for QueueOffline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue '{}' is offline", self.0)
    }
}

impl std::error::Error for QueueOffline {}

type Deliveries = Arc<Mutex<Vec<(String, String)>>>;

fn queues(names: &[&str]) -> Vec<Queue> {
    names.iter().map(|name| Queue::new(*name).unwrap()).collect()
}

fn recording_dispatcher(fail_on: Option<&'static str>) -> (Deliveries, Arc<dyn MessageDispatcher>) {
    let deliveries: Deliveries = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&deliveries);
    let dispatcher = move |queue: &Queue, message: &Message| -> Result<(), BoxError> {
        if fail_on == Some(queue.name()) {
            return Err(QueueOffline(queue.name().to_owned()).into());
        }
        sink.lock()
            .push((queue.name().to_owned(), message.name().to_owned()));
        Ok(())
    };
    let dispatcher: Arc<dyn MessageDispatcher> = Arc::new(dispatcher);
    (deliveries, dispatcher)
}

fn user_registered() -> GenericEvent {
    GenericEvent::new("user-registered", json!({"id": 7})).unwrap()
}

#[test]
fn test_fanout_skips_stopped_queue() {
    let (deliveries, dispatcher) = recording_dispatcher(None);
    let bus = EventBus::new("events", dispatcher, queues(&["q1", "q2", "q3"])).unwrap();

    bus.event_emitter().attach(
        EVENT_DELIVER_PRE,
        |event| {
            if event.queue().map(Queue::name) == Some("q2") {
                event.stop_propagation(true);
            }
            Ok(())
        },
        0,
    );

    let posted = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&posted);
    bus.event_emitter().attach(
        EVENT_DELIVER_POST,
        move |event| {
            if let Some(queue) = event.queue() {
                sink.lock().push(queue.name().to_owned());
            }
            Ok(())
        },
        0,
    );

    bus.publish(user_registered()).unwrap();

    assert_eq!(
        deliveries.lock().as_slice(),
        [
            ("q1".to_owned(), "user-registered".to_owned()),
            ("q3".to_owned(), "user-registered".to_owned()),
        ]
    );
    assert_eq!(posted.lock().as_slice(), ["q1", "q3"]);
}

#[test]
fn test_fanout_dispatcher_error_propagates_unwrapped() {
    let (deliveries, dispatcher) = recording_dispatcher(Some("q2"));
    let bus = EventBus::new("events", dispatcher, queues(&["q1", "q2", "q3"])).unwrap();

    let finished = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&finished);
    bus.event_emitter().attach(
        EVENT_PUBLISH_POST,
        move |_| {
            *flag.lock() = true;
            Ok(())
        },
        0,
    );

    let error = bus.publish(user_registered()).unwrap_err();

    // No dispatch-failure wrapping on the fan-out path.
    assert!(error.downcast_ref::<DispatchFailure>().is_none());
    assert_eq!(error.to_string(), "queue 'q2' is offline");
    assert!(error.downcast_ref::<QueueOffline>().is_some());

    assert_eq!(deliveries.lock().len(), 1);
    assert!(!*finished.lock());
}

#[test]
fn test_lifecycle_order() {
    let (_, dispatcher) = recording_dispatcher(None);
    let bus = EventBus::new("events", dispatcher, queues(&["mail", "audit"])).unwrap();
    let hooks = Arc::new(Mutex::new(Vec::new()));

    for hook in [
        EVENT_PUBLISH_PRE,
        EVENT_DELIVER_PRE,
        EVENT_DELIVER_POST,
        EVENT_PUBLISH_POST,
    ] {
        let sink = Arc::clone(&hooks);
        bus.event_emitter().attach(
            hook,
            move |event| {
                let queue = event.queue().map(|queue| queue.name().to_owned());
                sink.lock().push(match queue {
                    Some(queue) => format!("{hook}:{queue}"),
                    None => hook.to_owned(),
                });
                Ok(())
            },
            0,
        );
    }

    bus.dispatch(user_registered()).unwrap();

    assert_eq!(
        hooks.lock().as_slice(),
        [
            "publish.pre",
            "deliver.pre:mail",
            "deliver.post:mail",
            "deliver.pre:audit",
            "deliver.post:audit",
            "publish.post",
        ]
    );
}

#[test]
fn test_custom_message_factory() {
    struct Renaming;

    impl MessageFactory for Renaming {
        fn from_event(
            &self,
            event: &dyn DomainEvent,
            bus_name: &str,
        ) -> Result<Message, ValidationError> {
            let header = MessageHeader::generate().with_sender(bus_name);
            Message::new(
                format!("integration.{}", event.event_name()),
                header,
                event.payload(),
            )
        }
    }

    let (deliveries, dispatcher) = recording_dispatcher(None);
    let mut bus = EventBus::new("events", dispatcher, queues(&["mail"])).unwrap();
    bus.set_message_factory(Arc::new(Renaming));

    bus.publish(user_registered()).unwrap();

    assert_eq!(
        deliveries.lock().as_slice(),
        [("mail".to_owned(), "integration.user-registered".to_owned())]
    );
}

#[test]
fn test_listener_error_aborts_publish() {
    let (deliveries, dispatcher) = recording_dispatcher(None);
    let bus = EventBus::new("events", dispatcher, queues(&["mail"])).unwrap();
    bus.event_emitter().attach(
        EVENT_PUBLISH_PRE,
        |_| Err("not allowed".into()),
        0,
    );

    let error = bus.publish(user_registered()).unwrap_err();

    assert_eq!(error.to_string(), "not allowed");
    assert!(deliveries.lock().is_empty());
}
