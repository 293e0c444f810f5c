use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

/// Load state of a cached clip key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipStatus {
    Missing,
    Pending,
    Ready,
    Failed,
}

/// Per-model clip cache keyed by name (`"{group}_{index}"` for motions,
/// the expression name for expressions).
///
/// Besides loaded clips it remembers which keys have a fetch in flight and
/// which fetches failed, so queue entries referring to a pending clip can be
/// resolved later.
pub struct ClipCache<C> {
    clips: FxHashMap<String, Rc<C>>,
    order: Vec<String>,
    pending: FxHashSet<String>,
    failed: FxHashSet<String>,
}

impl<C> Default for ClipCache<C> {
    fn default() -> Self {
        Self {
            clips: FxHashMap::default(),
            order: Vec::new(),
            pending: FxHashSet::default(),
            failed: FxHashSet::default(),
        }
    }
}

impl<C> ClipCache<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Rc<C>> {
        self.clips.get(key).cloned()
    }

    /// Stores a clip, replacing any previous one under the same key.
    pub fn insert(&mut self, key: impl Into<String>, clip: C) -> Rc<C> {
        let key = key.into();
        self.pending.remove(&key);
        self.failed.remove(&key);
        let clip = Rc::new(clip);
        if self.clips.insert(key.clone(), clip.clone()).is_none() {
            self.order.push(key);
        }
        clip
    }

    /// Marks a fetch as in flight. Returns false if one already is.
    pub fn mark_pending(&mut self, key: &str) -> bool {
        self.failed.remove(key);
        self.pending.insert(key.to_string())
    }

    pub fn mark_failed(&mut self, key: &str) {
        self.pending.remove(key);
        self.failed.insert(key.to_string());
    }

    #[must_use]
    pub fn status(&self, key: &str) -> ClipStatus {
        if self.clips.contains_key(key) {
            ClipStatus::Ready
        } else if self.pending.contains(key) {
            ClipStatus::Pending
        } else if self.failed.contains(key) {
            ClipStatus::Failed
        } else {
            ClipStatus::Missing
        }
    }

    /// Key of the `index`-th clip in insertion order.
    #[must_use]
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.order.get(index).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn clear(&mut self) {
        self.clips.clear();
        self.order.clear();
        self.pending.clear();
        self.failed.clear();
    }
}
