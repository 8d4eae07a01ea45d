use std::collections::BTreeSet;

use compact_str::CompactString;

/// Set of table names the user has marked as relevant for translation.
///
/// Toggling is its own inverse: selecting an absent table adds it, selecting
/// a present one removes it. Iteration is alphabetical so prompts built from
/// the selection are deterministic. The selection lives for one session and
/// is never persisted.
#[derive(Debug, Clone, Default)]
pub struct TableScope {
    selected: BTreeSet<CompactString>
}

impl TableScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle membership; returns `true` when the table is now selected.
    pub fn toggle(&mut self, table: &str) -> bool {
        if self.selected.remove(table) {
            false
        } else {
            self.selected.insert(CompactString::new(table));
            true
        }
    }

    pub fn contains(&self, table: &str) -> bool {
        self.selected.contains(table)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn clear(&mut self) {
        self.selected.clear()
    }

    /// Selected table names in alphabetical order.
    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(|name| name.as_str())
    }
}
