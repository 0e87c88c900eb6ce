//! Incremental search over display names.

use crate::tree::{NavigationMode, TreeView};

/// Longest search text accepted; further characters are ignored.
pub const MAX_SEARCH_LEN: usize = 255;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub active: bool,
    pub buffer: String,
}

/// Keystroke fed to an active search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKey {
    Char(char),
    Backspace,
    /// Re-run the scan without changing the text.
    Repeat,
}

impl TreeView {
    pub fn is_searching(&self) -> bool {
        self.search.active
    }

    pub fn search_text(&self) -> &str {
        &self.search.buffer
    }

    /// Enter search mode with an empty buffer.
    pub fn start_search(&mut self) {
        self.search.active = true;
        self.search.buffer.clear();
    }

    /// Leave search mode. The selection stays where the search put it.
    pub fn stop_search(&mut self) {
        self.search.active = false;
        self.search.buffer.clear();
    }

    /// Advance to the next match of the current text.
    ///
    /// The selection first moves one record forward with flat adjacency so
    /// the scan cannot stop on the current match again; from the last
    /// record it wraps to the top instead.
    pub fn search_next(&mut self) -> bool {
        let at_last = {
            let store = self.store().borrow();
            self.selected().is_some() && self.selected() == store.last()
        };
        if at_last {
            self.move_to_top();
        } else {
            self.move_forward_with(1, NavigationMode::Flat);
        }
        self.search_input(SearchKey::Repeat)
    }

    /// Apply one keystroke to the search text and scan for it. When a
    /// newly typed character leaves nothing matching, it is dropped again.
    pub fn search_input(&mut self, key: SearchKey) -> bool {
        let mut appended = false;
        match key {
            SearchKey::Char(c) => {
                if self.search.buffer.chars().count() < MAX_SEARCH_LEN {
                    self.search.buffer.push(c);
                    appended = true;
                }
            }
            SearchKey::Backspace => {
                self.search.buffer.pop();
            }
            SearchKey::Repeat => {}
        }
        let text = self.search.buffer.clone();
        let found = self.search_from_selection(&text);
        if !found && appended {
            self.search.buffer.pop();
        }
        found
    }

    /// Scan forward from the selection (inclusive), wrapping once to the
    /// first record, for a display name starting with `text`.
    fn search_from_selection(&mut self, text: &str) -> bool {
        let Some(start) = self.selected() else {
            return false;
        };
        let hit = {
            let store = self.store().borrow();
            let mut current = start;
            let mut wrapped = false;
            let mut steps = 0usize;
            loop {
                if wrapped && current == start {
                    break None;
                }
                if store.get(current).is_some_and(|e| e.name.starts_with(text)) {
                    break Some((current, steps));
                }
                current = match store.next_of(current) {
                    Some(next) => next,
                    None => match store.first() {
                        Some(first) => {
                            wrapped = true;
                            first
                        }
                        None => break None,
                    },
                };
                steps += 1;
            }
        };
        match hit {
            Some((id, steps)) => {
                self.set_selected(Some(id));
                self.scroll_offset += steps;
                self.focus_correction();
                true
            }
            None => false,
        }
    }
}
