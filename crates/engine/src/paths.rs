//! Module search path registry for the script-visible `require`.
//!
//! Controller calls only mark the set dirty; the worker rewrites the
//! interpreter's `package.path` from it immediately before compiling the
//! next submission. Changes made while a script is running therefore
//! never affect that run.

use parking_lot::Mutex;

/// Separator between entries of a Lua search path.
const PATH_SEPARATOR: &str = ";";

struct PathSet {
    fragments: Vec<String>,
    dirty: bool,
}

pub struct RequirePaths {
    state: Mutex<PathSet>,
}

impl RequirePaths {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PathSet {
                fragments: Vec::new(),
                dirty: false,
            }),
        }
    }

    /// Replace the whole path set. Fragments are Lua search patterns
    /// (e.g. `/home/user/scripts/?.lua`).
    pub fn set(&self, fragments: Vec<String>) {
        let mut state = self.state.lock();
        state.fragments = fragments;
        state.dirty = true;
    }

    /// Append one fragment to the set.
    pub fn add(&self, fragment: String) {
        let mut state = self.state.lock();
        state.fragments.push(fragment.trim().to_string());
        state.dirty = true;
    }

    /// Worker-side: the joined search path if it changed since the last
    /// call, clearing the dirty marker.
    pub fn take_if_dirty(&self) -> Option<String> {
        let mut state = self.state.lock();
        if !state.dirty {
            return None;
        }
        state.dirty = false;
        Some(state.fragments.join(PATH_SEPARATOR))
    }

    pub fn fragments(&self) -> Vec<String> {
        self.state.lock().fragments.clone()
    }
}

impl Default for RequirePaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_until_mutated() {
        let paths = RequirePaths::new();
        assert_eq!(paths.take_if_dirty(), None);
    }

    #[test]
    fn test_set_replaces_and_marks_dirty() {
        let paths = RequirePaths::new();
        paths.set(vec!["/a/?.lua".into()]);
        paths.set(vec!["/b/?.lua".into(), "/c/?.lua".into()]);
        assert_eq!(paths.take_if_dirty(), Some("/b/?.lua;/c/?.lua".to_string()));
        // Consumed: clean again until the next mutation.
        assert_eq!(paths.take_if_dirty(), None);
    }

    #[test]
    fn test_add_appends() {
        let paths = RequirePaths::new();
        paths.set(vec!["/a/?.lua".into()]);
        paths.add("  /b/?.lua ".into());
        assert_eq!(paths.take_if_dirty(), Some("/a/?.lua;/b/?.lua".to_string()));
        assert_eq!(paths.fragments().len(), 2);
    }

    #[test]
    fn test_set_empty_clears() {
        let paths = RequirePaths::new();
        paths.add("/a/?.lua".into());
        let _ = paths.take_if_dirty();
        paths.set(Vec::new());
        assert_eq!(paths.take_if_dirty(), Some(String::new()));
    }
}
