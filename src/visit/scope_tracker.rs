//! Stack of binding frames for scope-aware traversals.
//!
//! Each frame maps a bound name to a value recorded when it was bound (the
//! free-variable analyzer stores the span of the binding occurrence). Lookups
//! search innermost to outermost, so an inner frame shadows outer ones, and
//! popping a frame forgets everything bound in it.
//!
//! # Examples
//!
//! ```rust
//! use erlscope::visit::scope_tracker::ScopeTracker;
//!
//! let mut tracker = ScopeTracker::<u32>::with_initial_scope();
//! tracker.insert("X".to_string(), 1);
//!
//! // Enter a fun clause
//! tracker.push_scope();
//! tracker.insert("Y".to_string(), 2);
//! assert!(tracker.contains("X"));
//! assert_eq!(tracker.depth(), 2);
//!
//! // Leave it: Y is gone, X is still bound
//! tracker.pop_scope();
//! assert!(!tracker.contains("Y"));
//! assert!(tracker.contains("X"));
//! ```

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ScopeTracker<T> {
    scopes: Vec<HashMap<String, T>>,
}

impl<T> ScopeTracker<T> {
    /// Create a tracker holding one empty outermost frame.
    pub fn with_initial_scope() -> Self {
        Self { scopes: vec![HashMap::new()] }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost frame, forgetting its bindings.
    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Bind `name` in the innermost frame. With no frame on the stack an
    /// outermost one is created.
    pub fn insert(&mut self, name: String, value: T) {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.insert(name, value);
            }
            None => self.scopes.push(HashMap::from([(name, value)])),
        }
    }

    /// Look up a binding, searching from innermost to outermost frame.
    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Number of active frames.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}
