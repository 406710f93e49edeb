//! An append-only, binary-searchable index from uncompressed offsets to the compressed frame
//! that contains them.

/// A single entry in a [`JumpTable`]: the frame starting at `compressed_pos` in the compressed
/// stream contributes uncompressed bytes starting at `uncompressed_pos`.
///
/// The final record in any fully-initialized table is a sentinel carrying the stream's totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Record {
    pub(crate) compressed_pos: u64,
    pub(crate) uncompressed_pos: u64,
}

/// Ordered, append-only sequence of [`Record`]s, plus whether the table spans the whole stream.
#[derive(Debug, Default)]
pub(crate) struct JumpTable {
    records: Vec<Record>,
    fully_initialized: bool,
}

impl JumpTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn fully_initialized(&self) -> bool {
        self.fully_initialized
    }

    pub(crate) fn set_fully_initialized(&mut self, value: bool) {
        self.fully_initialized = value;
    }

    /// Appends a record. Callers are responsible for monotonicity; the builder only ever calls
    /// this with strictly increasing coordinates.
    pub(crate) fn append(&mut self, compressed_pos: u64, uncompressed_pos: u64) {
        self.records.push(Record {
            compressed_pos,
            uncompressed_pos,
        });
    }

    /// The uncompressed size of the stream as currently known, i.e. the tail record's
    /// `uncompressed_pos`, or 0 if the table is empty.
    pub(crate) fn last_known_uncompressed_size(&self) -> u64 {
        self.records.last().map_or(0, |r| r.uncompressed_pos)
    }

    pub(crate) fn last(&self) -> Option<Record> {
        self.records.last().copied()
    }

    pub(crate) fn records(&self) -> &[Record] {
        &self.records
    }

    /// Binary search for the greatest record with `uncompressed_pos <= uncompressed_pos`.
    ///
    /// An empty table returns the canonical zero coordinate rather than panicking (see the
    /// design notes on this being reachable only defensively: every real caller extends the
    /// table before locating in it).
    pub(crate) fn locate(&self, uncompressed_pos: u64) -> Record {
        if self.records.is_empty() {
            return Record::default();
        }

        // `records[0].uncompressed_pos` is always 0, so the predicate holds for index 0 and
        // `partition_point` never returns 0 here.
        let idx = self
            .records
            .partition_point(|r| r.uncompressed_pos <= uncompressed_pos);
        self.records[idx - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_on_empty_table_returns_zero_coordinate() {
        let jt = JumpTable::new();
        assert_eq!(jt.locate(42), Record::default());
    }

    #[test]
    fn locate_finds_greatest_record_not_exceeding_position() {
        let mut jt = JumpTable::new();
        jt.append(0, 0);
        jt.append(10, 4);
        jt.append(21, 8);
        jt.append(33, 12);
        jt.append(46, 16);

        assert_eq!(
            jt.locate(0),
            Record {
                compressed_pos: 0,
                uncompressed_pos: 0
            }
        );
        assert_eq!(
            jt.locate(7),
            Record {
                compressed_pos: 10,
                uncompressed_pos: 4
            }
        );
        assert_eq!(
            jt.locate(8),
            Record {
                compressed_pos: 21,
                uncompressed_pos: 8
            }
        );
        assert_eq!(
            jt.locate(16),
            Record {
                compressed_pos: 46,
                uncompressed_pos: 16
            }
        );
    }

    #[test]
    fn last_known_uncompressed_size_tracks_tail() {
        let mut jt = JumpTable::new();
        assert_eq!(jt.last_known_uncompressed_size(), 0);
        jt.append(0, 0);
        jt.append(10, 4);
        assert_eq!(jt.last_known_uncompressed_size(), 4);
    }
}
