use std::collections::HashMap;

use crate::transport::events::Event;

type Handler<E> = Box<dyn FnMut(&E) + Send>;

/// Routes received events to the handlers registered for their kind.
pub struct Dispatcher<E: Event> {
    handlers: HashMap<E::Kind, Vec<Handler<E>>>,
}

impl<E: Event> Default for Dispatcher<E> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<E: Event> Dispatcher<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handlers for one kind run in registration order.
    pub fn on(&mut self, kind: E::Kind, handler: impl FnMut(&E) + Send + 'static) {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    pub fn handler_count(&self, kind: E::Kind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Returns how many handlers saw the event; zero means nobody listens for
    /// its kind.
    pub fn dispatch(&mut self, event: &E) -> usize {
        let Some(handlers) = self.handlers.get_mut(&event.kind()) else {
            return 0;
        };
        for handler in handlers.iter_mut() {
            handler(event);
        }
        handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::transport::events::{ToUi, ToUiKind};

    #[test]
    fn routes_by_kind_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::<ToUi>::new();

        let first = Arc::clone(&seen);
        dispatcher.on(ToUiKind::Message, move |event| {
            if let ToUi::Message { text } = event {
                first.lock().unwrap().push(format!("a:{}", text));
            }
        });
        let second = Arc::clone(&seen);
        dispatcher.on(ToUiKind::Message, move |_| second.lock().unwrap().push("b".to_string()));

        let handled = dispatcher.dispatch(&ToUi::Message {
            text: "hi".to_string(),
        });
        assert_eq!(handled, 2);
        assert_eq!(*seen.lock().unwrap(), vec!["a:hi".to_string(), "b".to_string()]);

        assert_eq!(dispatcher.dispatch(&ToUi::Saved { name: "x".into() }), 0);
        assert_eq!(dispatcher.handler_count(ToUiKind::Saved), 0);
    }
}
