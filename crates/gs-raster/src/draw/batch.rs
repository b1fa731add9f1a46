use std::ops::Range;

/// The open batch: a vertex range in the active frame's storage.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub(super) struct Batch {
    start: u32,
    end: u32,
}

impl Batch {
    pub(super) fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub(super) fn len(&self) -> u32 {
        self.end - self.start
    }

    /// First free slot in vertex storage.
    pub(super) fn end(&self) -> u32 {
        self.end
    }

    pub(super) fn range(&self) -> Range<u32> {
        self.start..self.end
    }

    pub(super) fn grow(&mut self, count: u32) {
        self.end += count;
    }

    /// Starts the next batch right after this one.
    pub(super) fn close(&mut self) {
        self.start = self.end;
    }

    /// Empties the batch at the start of fresh frame storage.
    pub(super) fn reset(&mut self) {
        *self = Batch::default();
    }
}
