//! Ordered sequences of records with cursor navigation.
//!
//! A [`RecordSequence`] holds the items of a sequence attribute
//! together with a cursor,
//! which supports the usual "go to first, then next" style of traversal.
//! Every cursor operation either succeeds or fails with a [`CursorError`]:
//! invalid positions are never papered over with a default item.

use crate::record::Record;
use snafu::{ensure, Backtrace, OptionExt, Snafu};

/// An error raised by a cursor operation.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum CursorError {
    /// The requested position does not hold an item
    #[snafu(display("Cursor position {:?} out of range for sequence of {} items", index, len))]
    CursorOutOfRange {
        index: Option<usize>,
        len: usize,
        backtrace: Backtrace,
    },
}

/// The position of a sequence's cursor.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// The cursor does not reference any item
    #[default]
    None,
    /// The cursor references the item at this index
    At(usize),
    /// The cursor was advanced beyond the last item
    PastEnd,
}

impl Cursor {
    /// The index referenced by the cursor, if any.
    pub fn index(self) -> Option<usize> {
        match self {
            Cursor::At(i) => Some(i),
            Cursor::None | Cursor::PastEnd => None,
        }
    }
}

/// An ordered list of records with a cursor.
///
/// Equality only takes the items into account,
/// so that two sequences with the same content
/// are equal regardless of where they were being traversed.
#[derive(Debug, Default, Clone)]
pub struct RecordSequence {
    items: Vec<Record>,
    cursor: Cursor,
}

impl PartialEq for RecordSequence {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl From<Vec<Record>> for RecordSequence {
    fn from(items: Vec<Record>) -> Self {
        RecordSequence {
            items,
            cursor: Cursor::None,
        }
    }
}

impl FromIterator<Record> for RecordSequence {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        RecordSequence::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl IntoIterator for RecordSequence {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSequence {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl RecordSequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the sequence has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The current cursor state.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Get the item at the given index, regardless of the cursor.
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.items.get(index)
    }

    /// Get the item at the given index for modification.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Record> {
        self.items.get_mut(index)
    }

    /// Iterate over all items in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.items.iter()
    }

    /// Iterate over all items in order, for modification.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Record> {
        self.items.iter_mut()
    }

    /// View all items as a slice.
    pub fn as_slice(&self) -> &[Record] {
        &self.items
    }

    /// Move the cursor to the first item.
    ///
    /// Fails if the sequence is empty,
    /// in which case the cursor is left untouched.
    pub fn first(&mut self) -> Result<&mut Record, CursorError> {
        self.goto(0)
    }

    /// Move the cursor to the next item.
    ///
    /// Moving beyond the last item
    /// leaves the cursor [past the end](Cursor::PastEnd) and fails.
    /// Fails without moving if the cursor does not reference an item.
    pub fn next(&mut self) -> Result<&mut Record, CursorError> {
        let len = self.items.len();
        let index = self.cursor.index().context(CursorOutOfRangeSnafu {
            index: None::<usize>,
            len,
        })?;
        let next = index + 1;
        if next >= len {
            self.cursor = Cursor::PastEnd;
            return CursorOutOfRangeSnafu {
                index: Some(next),
                len,
            }
            .fail();
        }
        self.cursor = Cursor::At(next);
        Ok(&mut self.items[next])
    }

    /// Move the cursor to the item at the given index.
    ///
    /// Fails without moving if there is no such item.
    pub fn goto(&mut self, index: usize) -> Result<&mut Record, CursorError> {
        let len = self.items.len();
        ensure!(
            index < len,
            CursorOutOfRangeSnafu {
                index: Some(index),
                len
            }
        );
        self.cursor = Cursor::At(index);
        Ok(&mut self.items[index])
    }

    /// Get the item referenced by the cursor.
    pub fn current(&self) -> Result<&Record, CursorError> {
        let len = self.items.len();
        self.cursor
            .index()
            .and_then(|i| self.items.get(i))
            .context(CursorOutOfRangeSnafu {
                index: self.cursor.index(),
                len,
            })
    }

    /// Get the item referenced by the cursor for modification.
    pub fn current_mut(&mut self) -> Result<&mut Record, CursorError> {
        let len = self.items.len();
        let index = self.cursor.index();
        index
            .and_then(|i| self.items.get_mut(i))
            .context(CursorOutOfRangeSnafu { index, len })
    }

    /// Insert an item at the given index,
    /// shifting all items after it.
    ///
    /// An index equal to the length appends the item.
    /// If the cursor references an item at or after the index,
    /// it keeps referencing the same item.
    /// The cursor does not move to the new item.
    pub fn insert_at(&mut self, index: usize, record: Record) -> Result<(), CursorError> {
        let len = self.items.len();
        ensure!(
            index <= len,
            CursorOutOfRangeSnafu {
                index: Some(index),
                len
            }
        );
        self.items.insert(index, record);
        if let Cursor::At(current) = self.cursor {
            if index <= current {
                self.cursor = Cursor::At(current + 1);
            }
        }
        Ok(())
    }

    /// Remove and return the item at the given index.
    ///
    /// Removing the item referenced by the cursor
    /// resets the cursor to [`Cursor::None`].
    /// Removing an item before it shifts the cursor down,
    /// so that it keeps referencing the same item.
    pub fn remove_at(&mut self, index: usize) -> Result<Record, CursorError> {
        let len = self.items.len();
        ensure!(
            index < len,
            CursorOutOfRangeSnafu {
                index: Some(index),
                len
            }
        );
        let removed = self.items.remove(index);
        if let Cursor::At(current) = self.cursor {
            if index == current {
                self.cursor = Cursor::None;
            } else if index < current {
                self.cursor = Cursor::At(current - 1);
            }
        }
        Ok(removed)
    }

    /// Append an item at the end of the sequence.
    /// The cursor is not moved.
    pub fn append(&mut self, record: Record) {
        self.items.push(record);
    }

    /// Append a new empty item and move the cursor to it,
    /// returning it for modification.
    pub fn append_new(&mut self) -> &mut Record {
        self.items.push(Record::new());
        let index = self.items.len() - 1;
        self.cursor = Cursor::At(index);
        &mut self.items[index]
    }

    /// Keep only the first `len` items.
    ///
    /// A cursor referencing a removed item is reset to [`Cursor::None`].
    pub(crate) fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
        if let Cursor::At(current) = self.cursor {
            if current >= len {
                self.cursor = Cursor::None;
            }
        }
    }

    /// Remove all items and reset the cursor.
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = Cursor::None;
    }
}
