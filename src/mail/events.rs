//! Send notifications for transport listeners (plugins).
//!
//! Listeners are called in registration order. During `before_send_performed` a
//! listener may cancel the event, which aborts the send and hides the event from
//! any listener registered after it.

use std::sync::Arc;

use super::Message;

/// Outcome recorded on a [`SendEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendResult {
    Pending,
    Success,
    Failed,
}

/// Event passed to listeners around a single send.
#[derive(Debug)]
pub struct SendEvent<'a> {
    message: &'a Message,
    result: SendResult,
    failed_recipients: Vec<String>,
    bubble_cancelled: bool,
}

impl<'a> SendEvent<'a> {
    pub fn new(message: &'a Message) -> Self {
        Self {
            message,
            result: SendResult::Pending,
            failed_recipients: Vec::new(),
            bubble_cancelled: false,
        }
    }

    pub fn message(&self) -> &Message {
        self.message
    }

    pub fn result(&self) -> SendResult {
        self.result
    }

    pub fn set_result(&mut self, result: SendResult) {
        self.result = result;
    }

    pub fn failed_recipients(&self) -> &[String] {
        &self.failed_recipients
    }

    pub fn set_failed_recipients(&mut self, recipients: Vec<String>) {
        self.failed_recipients = recipients;
    }

    /// Stop the event from reaching further listeners. Cancelling a
    /// "before send" event also aborts the send.
    pub fn cancel_bubble(&mut self) {
        self.bubble_cancelled = true;
    }

    pub fn bubble_cancelled(&self) -> bool {
        self.bubble_cancelled
    }
}

/// Hooks invoked by a transport around each send.
pub trait SendListener: Send + Sync {
    fn before_send_performed(&self, _event: &mut SendEvent<'_>) {}

    fn send_performed(&self, _event: &SendEvent<'_>) {}
}

/// Ordered set of listeners bound to a transport.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    listeners: Vec<Arc<dyn SendListener>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_listener(&mut self, listener: Arc<dyn SendListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn create_send_event<'a>(&self, message: &'a Message) -> SendEvent<'a> {
        SendEvent::new(message)
    }

    pub fn dispatch_before_send(&self, event: &mut SendEvent<'_>) {
        for listener in &self.listeners {
            if event.bubble_cancelled() {
                break;
            }
            listener.before_send_performed(event);
        }
    }

    pub fn dispatch_send_performed(&self, event: &SendEvent<'_>) {
        for listener in &self.listeners {
            if event.bubble_cancelled() {
                break;
            }
            listener.send_performed(event);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Logs the outcome of every send.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl SendListener for TracingListener {
    fn send_performed(&self, event: &SendEvent<'_>) {
        let message = event.message();
        match event.result() {
            SendResult::Success => tracing::info!(
                subject = %message.subject(),
                recipients = message.recipient_count(),
                "Message sent"
            ),
            _ => tracing::warn!(
                subject = %message.subject(),
                failed = ?event.failed_recipients(),
                "Message not accepted"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        cancel: bool,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl SendListener for Recorder {
        fn before_send_performed(&self, event: &mut SendEvent<'_>) {
            self.calls.lock().unwrap().push(format!("{}:before", self.name));
            if self.cancel {
                event.cancel_bubble();
            }
        }

        fn send_performed(&self, event: &SendEvent<'_>) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:{:?}", self.name, event.result()));
        }
    }

    fn test_message() -> Message {
        Message::builder()
            .from("sender@example.com")
            .to("user@example.com")
            .subject("Hi")
            .build()
            .expect("Should build message")
    }

    #[test]
    fn test_listeners_called_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        for name in ["first", "second"] {
            dispatcher.bind_listener(Arc::new(Recorder {
                name,
                cancel: false,
                calls: calls.clone(),
            }));
        }

        let message = test_message();
        let mut event = dispatcher.create_send_event(&message);
        dispatcher.dispatch_before_send(&mut event);
        event.set_result(SendResult::Success);
        dispatcher.dispatch_send_performed(&event);

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["first:before", "second:before", "first:Success", "second:Success"]
        );
    }

    #[test]
    fn test_cancel_stops_later_listeners() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.bind_listener(Arc::new(Recorder {
            name: "veto",
            cancel: true,
            calls: calls.clone(),
        }));
        dispatcher.bind_listener(Arc::new(Recorder {
            name: "late",
            cancel: false,
            calls: calls.clone(),
        }));

        let message = test_message();
        let mut event = dispatcher.create_send_event(&message);
        dispatcher.dispatch_before_send(&mut event);

        assert!(event.bubble_cancelled());
        assert_eq!(*calls.lock().unwrap(), vec!["veto:before"]);
    }

    #[test]
    fn test_event_defaults() {
        let message = test_message();
        let event = SendEvent::new(&message);

        assert_eq!(event.result(), SendResult::Pending);
        assert!(event.failed_recipients().is_empty());
        assert!(!event.bubble_cancelled());
    }
}
