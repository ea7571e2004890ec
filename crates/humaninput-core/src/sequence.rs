//! Bounded history of completed chords

use std::collections::VecDeque;

use crate::combo::{chord_forms, sort_names};
use crate::grammar::{CHORD_JOIN, SEQUENCE_JOIN};

/// Completed chords, oldest first.
#[derive(Debug, Clone)]
pub struct SequenceBuffer {
    entries: VecDeque<Vec<String>>,
    max_len: usize,
}

impl SequenceBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_len: max_len.max(1),
        }
    }

    /// Append a completed chord, evicting the oldest entry when full.
    pub fn record(&mut self, mut chord: Vec<String>) {
        sort_names(&mut chord);
        self.entries.push_back(chord);
        while self.entries.len() > self.max_len {
            self.entries.pop_front();
        }
        for entry in self.entries.iter_mut() {
            sort_names(entry);
        }
        tracing::debug!("Sequence buffer: {:?}", self.entries);
    }

    /// Every trailing slice of the buffer that spans at least two chords,
    /// longest first, in the specific spelling and then in the generic one.
    ///
    /// `[[a], [b], [c]]` yields `a b c` and `b c`. A two-chord prefix such
    /// as `a b` is never produced: it was already offered when `b` arrived.
    pub fn slices(&self) -> Vec<String> {
        if self.entries.len() < 2 {
            return Vec::new();
        }
        let (specific, generic): (Vec<String>, Vec<String>) = self
            .entries
            .iter()
            .map(|chord| chord_forms(chord, CHORD_JOIN))
            .unzip();

        let mut out = Vec::new();
        for steps in [specific, generic] {
            for start in 0..steps.len() - 1 {
                let slice = steps[start..].join(SEQUENCE_JOIN);
                if !out.contains(&slice) {
                    out.push(slice);
                }
            }
        }
        out
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn entries(&self) -> impl Iterator<Item = &[String]> {
        self.entries.iter().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_huge_limit_does_not_allocate_up_front() {
        let mut buffer = SequenceBuffer::new(usize::MAX);
        buffer.record(chord(&["a"]));
        buffer.record(chord(&["b"]));
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_single_entry_has_no_slices() {
        let mut buffer = SequenceBuffer::new(12);
        buffer.record(chord(&["a"]));
        assert!(buffer.slices().is_empty());
    }

    #[test]
    fn test_trailing_slices() {
        let mut buffer = SequenceBuffer::new(12);
        buffer.record(chord(&["a"]));
        buffer.record(chord(&["b"]));
        buffer.record(chord(&["c"]));
        assert_eq!(buffer.slices(), vec!["a b c".to_string(), "b c".to_string()]);
    }

    #[test]
    fn test_slices_include_generic_spelling() {
        let mut buffer = SequenceBuffer::new(12);
        buffer.record(chord(&["c", "ControlLeft"]));
        buffer.record(chord(&["a"]));
        assert_eq!(
            buffer.slices(),
            vec!["controlleft-c a".to_string(), "ctrl-c a".to_string()]
        );
    }

    #[test]
    fn test_fifo_eviction() {
        let mut buffer = SequenceBuffer::new(2);
        buffer.record(chord(&["a"]));
        buffer.record(chord(&["b"]));
        buffer.record(chord(&["c"]));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.slices(), vec!["b c".to_string()]);
    }

    #[test]
    fn test_entries_are_sorted() {
        let mut buffer = SequenceBuffer::new(4);
        buffer.record(chord(&["x", "AltLeft", "ShiftLeft"]));
        let entries: Vec<&[String]> = buffer.entries().collect();
        assert_eq!(entries[0], chord(&["ShiftLeft", "AltLeft", "x"]).as_slice());
    }

    #[test]
    fn test_clear() {
        let mut buffer = SequenceBuffer::new(4);
        buffer.record(chord(&["a"]));
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
