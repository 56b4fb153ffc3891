use std::cell::OnceCell;
use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::foundation::core::RgbBitmap;

/// One buffered line plus its lazily rasterized bitmap.
#[derive(Clone, Debug)]
pub struct ScrollEntry {
    text: String,
    bitmap: OnceCell<RgbBitmap>,
}

impl ScrollEntry {
    /// Entry with no bitmap yet.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bitmap: OnceCell::new(),
        }
    }

    /// Raw line text, before placeholder expansion.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The bitmap, once rasterized.
    pub fn bitmap(&self) -> Option<&RgbBitmap> {
        self.bitmap.get()
    }

    /// Return the bitmap, rasterizing it with `render` on first use only.
    pub fn bitmap_or_render(&self, render: impl FnOnce(&str) -> RgbBitmap) -> &RgbBitmap {
        self.bitmap.get_or_init(|| render(&self.text))
    }

    /// Bitmap width, 0 until rasterized.
    pub fn width(&self) -> usize {
        self.bitmap().map_or(0, |b| b.width)
    }

    /// Bitmap height, 0 until rasterized.
    pub fn height(&self) -> usize {
        self.bitmap().map_or(0, |b| b.height)
    }
}

/// Bounded FIFO of the most recent lines, shared by the poll thread and the compositor.
///
/// Every access goes through one mutex, so a frame never observes a half-applied push.
#[derive(Debug)]
pub struct LineBuffer {
    capacity: usize,
    entries: Mutex<VecDeque<ScrollEntry>>,
}

impl LineBuffer {
    /// Empty buffer holding at most `capacity` lines. Zero keeps the buffer empty.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a line, evicting the oldest entries to stay within capacity.
    pub fn push(&self, text: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        let entry = ScrollEntry::new(text);

        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Run `f` over the entries, oldest first, holding the lock for the whole pass.
    pub fn with_entries<R>(&self, f: impl FnOnce(&VecDeque<ScrollEntry>) -> R) -> R {
        let entries = self.entries.lock();
        f(&entries)
    }

    /// Visit each entry, oldest first, under the lock.
    pub fn for_each_entry(&self, mut f: impl FnMut(&ScrollEntry)) {
        self.with_entries(|entries| entries.iter().for_each(&mut f));
    }

    /// Text of the entry at `index` (0 = oldest).
    pub fn text_at(&self, index: usize) -> Option<String> {
        self.with_entries(|entries| entries.get(index).map(|e| e.text().to_string()))
    }

    /// Texts of all entries, oldest first.
    pub fn texts(&self) -> Vec<String> {
        self.with_entries(|entries| entries.iter().map(|e| e.text().to_string()).collect())
    }

    /// Number of buffered lines.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when no line is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every buffered line.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ticker/buffer.rs"]
mod tests;
