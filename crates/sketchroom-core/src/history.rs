//! Snapshot-based linear undo/redo.

/// Undo/redo stacks over serialized document snapshots.
///
/// `history[0]` is the state recorded at document load and is the floor:
/// undo never removes it. The redo stack is populated only by [`undo`]
/// and cleared by any other recorded mutation — including remote
/// snapshots, which are recorded like local edits.
///
/// The stacks hold opaque snapshot strings; applying one to a renderer,
/// broadcasting it, and recomputing layers are the session's concern.
///
/// [`undo`]: Self::undo
#[derive(Debug, Default)]
pub struct HistoryManager {
    history: Vec<String>,
    redo: Vec<String>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop both stacks and seed history with the freshly loaded state.
    pub fn reset(&mut self, initial: String) {
        self.history = vec![initial];
        self.redo.clear();
    }

    /// Record a committed mutation. Clears the redo stack.
    pub fn record(&mut self, snapshot: String) {
        self.history.push(snapshot);
        self.redo.clear();
    }

    /// Step back one state.
    ///
    /// Moves the current entry onto the redo stack and returns the
    /// previous state to re-apply, or `None` at the floor.
    pub fn undo(&mut self) -> Option<String> {
        if self.history.len() <= 1 {
            return None;
        }
        let current = self.history.pop()?;
        self.redo.push(current);
        self.history.last().cloned()
    }

    /// Step forward one previously undone state.
    ///
    /// Moves the entry back onto the history stack and returns it, or
    /// `None` when nothing was undone.
    pub fn redo(&mut self) -> Option<String> {
        let entry = self.redo.pop()?;
        self.history.push(entry.clone());
        Some(entry)
    }

    /// True when undo has nothing to step back to (UI affordance).
    pub fn is_history_empty(&self) -> bool {
        self.history.len() <= 1
    }

    /// True when redo has nothing to re-apply (UI affordance).
    pub fn is_redo_empty(&self) -> bool {
        self.redo.is_empty()
    }

    /// The snapshot describing the current state, if any.
    pub fn current(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    /// Number of recorded states, including the floor.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> HistoryManager {
        let mut history = HistoryManager::new();
        history.reset("s0".to_string());
        history
    }

    #[test]
    fn test_undo_below_floor_is_noop() {
        let mut history = loaded();
        assert!(history.is_history_empty());
        assert_eq!(history.undo(), None);
        assert_eq!(history.current(), Some("s0"));
    }

    #[test]
    fn test_k_undos_restore_loaded_state() {
        let mut history = loaded();
        for i in 1..=3 {
            history.record(format!("s{i}"));
        }
        assert_eq!(history.undo().as_deref(), Some("s2"));
        assert_eq!(history.undo().as_deref(), Some("s1"));
        assert_eq!(history.undo().as_deref(), Some("s0"));
        assert_eq!(history.undo(), None);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_redo_roundtrip() {
        let mut history = loaded();
        history.record("s1".to_string());
        assert_eq!(history.undo().as_deref(), Some("s0"));
        assert!(!history.is_redo_empty());
        assert_eq!(history.redo().as_deref(), Some("s1"));
        assert_eq!(history.current(), Some("s1"));
        assert!(history.is_redo_empty());
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = loaded();
        history.record("s1".to_string());
        history.undo();
        assert!(!history.is_redo_empty());
        history.record("s2".to_string());
        assert!(history.is_redo_empty());
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut history = loaded();
        history.record("s1".to_string());
        history.undo();
        history.reset("fresh".to_string());
        assert_eq!(history.len(), 1);
        assert!(history.is_redo_empty());
        assert_eq!(history.current(), Some("fresh"));
    }
}
