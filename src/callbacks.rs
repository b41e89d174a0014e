//! Tree-wide notification registries, owned by the root.
//!
//! Callbacks run synchronously and in registration order. They must not
//! parse or invalidate the tree that is notifying them.

use crate::language::LanguageId;
use crate::range::{EditDelta, TextRange};
use crate::source::BufferId;
use crate::tree::LayerId;

pub type BytesCallback = Box<dyn FnMut(&EditDelta)>;
pub type ChangedTreeCallback = Box<dyn FnMut(LayerId, &[TextRange])>;
pub type ChildCallback = Box<dyn FnMut(&ChildEvent)>;
pub type DetachCallback = Box<dyn FnMut(BufferId)>;

/// A child layer was attached to or detached from `parent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEvent {
    pub parent: LayerId,
    pub child: LayerId,
    pub language: LanguageId,
}

/// A set of handlers to register in one go. Unset handlers are skipped.
#[derive(Default)]
pub struct Callbacks {
    bytes: Option<BytesCallback>,
    changedtree: Option<ChangedTreeCallback>,
    child_added: Option<ChildCallback>,
    child_removed: Option<ChildCallback>,
    detach: Option<DetachCallback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw edits, forwarded after the tree has re-parsed.
    pub fn on_bytes(mut self, f: impl FnMut(&EditDelta) + 'static) -> Self {
        self.bytes = Some(Box::new(f));
        self
    }

    /// Changed ranges of a completed parse, with the layer it started from.
    pub fn on_changedtree(mut self, f: impl FnMut(LayerId, &[TextRange]) + 'static) -> Self {
        self.changedtree = Some(Box::new(f));
        self
    }

    pub fn on_child_added(mut self, f: impl FnMut(&ChildEvent) + 'static) -> Self {
        self.child_added = Some(Box::new(f));
        self
    }

    pub fn on_child_removed(mut self, f: impl FnMut(&ChildEvent) + 'static) -> Self {
        self.child_removed = Some(Box::new(f));
        self
    }

    /// The host buffer is going away.
    pub fn on_detach(mut self, f: impl FnMut(BufferId) + 'static) -> Self {
        self.detach = Some(Box::new(f));
        self
    }
}

#[derive(Default)]
pub(crate) struct CallbackRegistry {
    bytes: Vec<BytesCallback>,
    changedtree: Vec<ChangedTreeCallback>,
    child_added: Vec<ChildCallback>,
    child_removed: Vec<ChildCallback>,
    detach: Vec<DetachCallback>,
}

impl CallbackRegistry {
    pub(crate) fn register(&mut self, callbacks: Callbacks) {
        let Callbacks {
            bytes,
            changedtree,
            child_added,
            child_removed,
            detach,
        } = callbacks;

        self.bytes.extend(bytes);
        self.changedtree.extend(changedtree);
        self.child_added.extend(child_added);
        self.child_removed.extend(child_removed);
        self.detach.extend(detach);
    }

    pub(crate) fn bytes(&mut self, delta: &EditDelta) {
        for f in &mut self.bytes {
            f(delta);
        }
    }

    pub(crate) fn changedtree(&mut self, layer: LayerId, ranges: &[TextRange]) {
        for f in &mut self.changedtree {
            f(layer, ranges);
        }
    }

    pub(crate) fn child_added(&mut self, event: &ChildEvent) {
        for f in &mut self.child_added {
            f(event);
        }
    }

    pub(crate) fn child_removed(&mut self, event: &ChildEvent) {
        for f in &mut self.child_removed {
            f(event);
        }
    }

    pub(crate) fn detach(&mut self, buffer: BufferId) {
        for f in &mut self.detach {
            f(buffer);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
            + self.changedtree.len()
            + self.child_added.len()
            + self.child_removed.len()
            + self.detach.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn handlers_fire_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CallbackRegistry::default();

        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            registry.register(Callbacks::new().on_changedtree(move |_, ranges| {
                log.borrow_mut().push((tag, ranges.len()));
            }));
        }

        registry.changedtree(LayerId::from_raw(0), &[TextRange::bytes(0, 1)]);
        assert_eq!(*log.borrow(), vec![("first", 1), ("second", 1)]);
    }

    #[test]
    fn unset_handlers_are_not_registered() {
        let mut registry = CallbackRegistry::default();
        registry.register(Callbacks::new());
        registry.register(Callbacks::new().on_bytes(|_| {}).on_child_added(|_| {}));
        assert_eq!(registry.len(), 2);
    }
}
