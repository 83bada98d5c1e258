//! Ordered, cyclable pool of backend models
//!
//! The pool never drops or reorders members. Its cursor is only a starting
//! point: a model that was rate limited or missing is tried later on the
//! next call, not excluded.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{IdentifyError, Result};

/// Opaque backend model identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Backend-specific model id
    pub id: String,
}

impl ModelDescriptor {
    /// Create a descriptor from a model id
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Model pool with a rotating cursor
#[derive(Debug)]
pub struct ModelPool {
    models: Vec<ModelDescriptor>,
    cursor: AtomicUsize,
}

impl ModelPool {
    /// Build a pool from model ids. Blank ids are skipped; an empty result is
    /// a configuration error.
    pub fn new<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models: Vec<ModelDescriptor> = ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &String| !id.trim().is_empty())
            .map(|id| ModelDescriptor::new(id.trim()))
            .collect();

        if models.is_empty() {
            return Err(IdentifyError::configuration("Model pool must not be empty"));
        }

        Ok(Self {
            models,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Number of models in the pool
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Always false; construction rejects empty pools
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Current cursor position
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Descriptor at `(cursor + offset) mod len`
    pub fn current(&self, offset: usize) -> &ModelDescriptor {
        let index = (self.cursor() + offset) % self.models.len();
        &self.models[index]
    }

    /// Move the cursor forward by one, wrapping
    pub fn advance(&self) {
        let len = self.models.len();
        // fetch_update only fails when the closure returns None
        let _ = self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| Some((c + 1) % len));
    }

    /// Point the cursor at the model after `model`, wrapping, wherever the
    /// cursor was. No-op for a model that is not in the pool.
    pub fn advance_past(&self, model: &ModelDescriptor) {
        let len = self.models.len();
        if let Some(index) = self.models.iter().position(|m| m == model) {
            let _ = self
                .cursor
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |_| Some((index + 1) % len));
        }
    }

    /// Every model once, starting at the cursor. Taken once per call so that
    /// cursor moves during the call do not skip or repeat models.
    pub fn rotation(&self) -> Vec<ModelDescriptor> {
        (0..self.models.len())
            .map(|offset| self.current(offset).clone())
            .collect()
    }

    /// Models in configured order
    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> ModelPool {
        ModelPool::new(["a", "b", "c"]).unwrap()
    }

    #[test]
    fn test_current_wraps() {
        let pool = pool();
        assert_eq!(pool.current(0).id, "a");
        assert_eq!(pool.current(2).id, "c");
        assert_eq!(pool.current(3).id, "a");
    }

    #[test]
    fn test_advance_wraps() {
        let pool = pool();
        pool.advance();
        assert_eq!(pool.cursor(), 1);
        assert_eq!(pool.current(0).id, "b");
        pool.advance();
        pool.advance();
        assert_eq!(pool.cursor(), 0);
    }

    #[test]
    fn test_advance_past_wraps() {
        let pool = pool();
        pool.advance_past(&ModelDescriptor::new("a"));
        assert_eq!(pool.cursor(), 1);
        assert_eq!(pool.current(0).id, "b");
        pool.advance_past(&ModelDescriptor::new("c"));
        assert_eq!(pool.cursor(), 0);
    }

    #[test]
    fn test_advance_past_ignores_cursor_position() {
        let pool = pool();
        // the cursor still points at "a" when "b" is skipped
        pool.advance_past(&ModelDescriptor::new("b"));
        assert_eq!(pool.current(0).id, "c");

        pool.advance_past(&ModelDescriptor::new("unknown"));
        assert_eq!(pool.cursor(), 2);
    }

    #[test]
    fn test_rotation_starts_at_cursor() {
        let pool = pool();
        pool.advance_past(&ModelDescriptor::new("a"));
        let ids: Vec<_> = pool.rotation().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        // members are never reordered
        let ids: Vec<_> = pool.models().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_pool_rejected() {
        let err = ModelPool::new(Vec::<String>::new()).unwrap_err();
        assert!(err.is_configuration());
        assert!(ModelPool::new(["  ", ""]).is_err());
    }
}
