use crate::event::{EventKind, UnknownEvent, WatchEvent};

pub type EventHandler = Box<dyn FnMut(&WatchEvent) + Send>;
pub type ErrorHandler = Box<dyn FnMut(&str) + Send>;
pub type UnknownHandler = Box<dyn FnMut(&UnknownEvent) + Send>;

/// Identifies one registration so it can be removed again with
/// [`Watcher::off`](super::Watcher::off).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registered callbacks: one list per [`EventKind`], one for stderr output and
/// one for names outside the event table.
///
/// `should_continue` is checked before each call so a handler that stops the
/// watcher also cuts off the handlers queued behind it.
pub struct Listeners {
    events: [Vec<(ListenerId, EventHandler)>; EventKind::COUNT],
    errors: Vec<(ListenerId, ErrorHandler)>,
    unknown: Vec<(ListenerId, UnknownHandler)>,
    next_id: u64,
}

impl Default for Listeners {
    fn default() -> Self {
        Self {
            events: std::array::from_fn(|_| Vec::new()),
            errors: Vec::new(),
            unknown: Vec::new(),
            next_id: 0,
        }
    }
}

impl Listeners {
    fn allocate(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    pub fn on_event(&mut self, kind: EventKind, handler: EventHandler) -> ListenerId {
        let id = self.allocate();
        self.events[kind.index()].push((id, handler));
        id
    }

    pub fn on_error(&mut self, handler: ErrorHandler) -> ListenerId {
        let id = self.allocate();
        self.errors.push((id, handler));
        id
    }

    pub fn on_unknown(&mut self, handler: UnknownHandler) -> ListenerId {
        let id = self.allocate();
        self.unknown.push((id, handler));
        id
    }

    /// Drop one registration. Returns `false` if `id` is not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        fn take<H>(handlers: &mut Vec<(ListenerId, H)>, id: ListenerId) -> bool {
            match handlers.iter().position(|(other, _)| *other == id) {
                Some(index) => {
                    handlers.remove(index);
                    true
                }
                None => false,
            }
        }

        self.events.iter_mut().any(|handlers| take(handlers, id))
            || take(&mut self.errors, id)
            || take(&mut self.unknown, id)
    }

    pub fn emit_event(&mut self, event: &WatchEvent, should_continue: impl Fn() -> bool) {
        for (_, handler) in &mut self.events[event.kind.index()] {
            if !should_continue() {
                return;
            }
            handler(event);
        }
    }

    pub fn emit_error(&mut self, message: &str, should_continue: impl Fn() -> bool) {
        for (_, handler) in &mut self.errors {
            if !should_continue() {
                return;
            }
            handler(message);
        }
    }

    pub fn emit_unknown(&mut self, event: &UnknownEvent, should_continue: impl Fn() -> bool) {
        for (_, handler) in &mut self.unknown {
            if !should_continue() {
                return;
            }
            handler(event);
        }
    }

    #[cfg(test)]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.events[kind.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.iter().all(Vec::is_empty) && self.errors.is_empty() && self.unknown.is_empty()
    }

    pub fn clear(&mut self) {
        for handlers in &mut self.events {
            handlers.clear();
        }
        self.errors.clear();
        self.unknown.clear();
    }
}
