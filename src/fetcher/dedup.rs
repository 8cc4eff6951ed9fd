//! First-seen-wins deduplication by post key.

use crate::models::Post;
use std::collections::HashSet;

/// Accumulates posts, keeping only the first record for each key.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
    posts: Vec<Post>,
    dropped: usize,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a post under `key`. Returns false if the key was already seen.
    pub fn insert(&mut self, key: &str, post: Post) -> bool {
        if self.seen.contains(key) {
            self.dropped += 1;
            return false;
        }
        self.seen.insert(key.to_string());
        self.posts.push(post);
        true
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// Consume the accumulator, returning the unique posts and drop count.
    pub fn finish(self) -> (Vec<Post>, usize) {
        (self.posts, self.dropped)
    }
}
