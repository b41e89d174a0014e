//! Shared handle to the text a [`LanguageTree`](crate::LanguageTree) parses.
//!
//! The buffer is owned by the host editor. Layers only ever read it; all
//! mutation goes through [`SourceBuffer::replace`], which reports the
//! [`EditDelta`] the host then forwards to
//! [`LanguageTree::on_bytes`](crate::LanguageTree::on_bytes).

use crate::range::{EditDelta, Point};
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::ops::Range;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of the buffer an edit originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        BufferId(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

struct BufferInner {
    id: BufferId,
    text: RefCell<String>,
    changedtick: Cell<u64>,
}

/// Cheaply clonable, single-threaded shared text buffer.
#[derive(Clone)]
pub struct SourceBuffer {
    inner: Rc<BufferInner>,
}

impl SourceBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(BufferInner {
                id: BufferId::next(),
                text: RefCell::new(text.into()),
                changedtick: Cell::new(0),
            }),
        }
    }

    pub fn id(&self) -> BufferId {
        self.inner.id
    }

    /// Number of edits applied so far.
    pub fn changedtick(&self) -> u64 {
        self.inner.changedtick.get()
    }

    /// Borrow the current text.
    ///
    /// The borrow must be released before the buffer is edited.
    pub fn text(&self) -> Ref<'_, str> {
        Ref::map(self.inner.text.borrow(), String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.text.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace `range` with `new_text` and describe the change.
    ///
    /// The range is clamped to the buffer and must fall on character
    /// boundaries.
    pub fn replace(&self, range: Range<usize>, new_text: &str) -> EditDelta {
        let mut text = self.inner.text.borrow_mut();
        let start_byte = range.start.min(text.len());
        let old_end_byte = range.end.clamp(start_byte, text.len());
        let start_point = Point::at_byte(&text, start_byte);
        let old_end_point = Point::at_byte(&text, old_end_byte);

        text.replace_range(start_byte..old_end_byte, new_text);

        let new_end_byte = start_byte + new_text.len();
        let new_end_point = Point::at_byte(&text, new_end_byte);
        let changedtick = self.inner.changedtick.get() + 1;
        self.inner.changedtick.set(changedtick);

        EditDelta {
            buffer: self.inner.id,
            changedtick,
            start_byte,
            start_point,
            old_end_byte,
            old_end_point,
            new_end_byte,
            new_end_point,
        }
    }

    /// Append `text` to the end of the buffer.
    pub fn append(&self, text: &str) -> EditDelta {
        let end = self.len();
        self.replace(end..end, text)
    }

    /// Whether two handles point at the same buffer.
    pub fn same_buffer(&self, other: &SourceBuffer) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SourceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceBuffer")
            .field("id", &self.inner.id)
            .field("changedtick", &self.inner.changedtick.get())
            .field("len", &self.len())
            .finish()
    }
}
