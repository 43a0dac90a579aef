//! Where raw dictionary payloads come from.
//!
//! The resolver only needs one operation: give me the raw payload for a word
//! in a language. [`DictionarySource`] captures that, and an empty
//! [`RawDictionaryPayload`] is the "not found" answer. Errors are reserved for
//! transport problems such as unreadable files or corrupt JSON.
//!
//! Three implementations ship here:
//! - [`JsonDirSource`] reads payloads saved as `<dir>/<word>.json` (optionally
//!   under a per-language subdirectory).
//! - [`MemorySource`] holds payloads in a map, handy for tests and embedding.
//! - [`CachedSource`] wraps any source with a concurrent read-through cache so
//!   several resolutions can share lookups.
//!
//! # Example
//! ```no_run
//! use lemmacard_source::{CachedSource, DictionarySource, JsonDirSource};
//!
//! # fn main() -> Result<(), lemmacard_source::SourceError> {
//! let source = CachedSource::new(JsonDirSource::open("data")?);
//! let payload = source.fetch("идти", "russian")?;
//! println!("{} entries", payload.entries().len());
//! # Ok(()) }
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use lemmacard_types::RawDictionaryPayload;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid dictionary payload in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A provider of raw dictionary payloads.
///
/// Implementations take `&self` so one source can serve concurrent
/// resolutions.
pub trait DictionarySource {
    /// Fetch the payload for `word`. A word without data yields an empty
    /// payload, not an error.
    fn fetch(&self, word: &str, language: &str) -> Result<RawDictionaryPayload, SourceError>;

    fn name(&self) -> &str;
}

impl<T: DictionarySource + ?Sized> DictionarySource for &T {
    fn fetch(&self, word: &str, language: &str) -> Result<RawDictionaryPayload, SourceError> {
        (**self).fetch(word, language)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: DictionarySource + ?Sized> DictionarySource for Arc<T> {
    fn fetch(&self, word: &str, language: &str) -> Result<RawDictionaryPayload, SourceError> {
        (**self).fetch(word, language)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: DictionarySource + ?Sized> DictionarySource for Box<T> {
    fn fetch(&self, word: &str, language: &str) -> Result<RawDictionaryPayload, SourceError> {
        (**self).fetch(word, language)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Payloads stored one file per word.
///
/// `<dir>/<language>/<word>.json` is preferred when that language directory
/// exists; otherwise `<dir>/<word>.json`. A missing file means "not found".
#[derive(Clone, Debug)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SourceError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(SourceError::Io {
                source: io::Error::new(io::ErrorKind::NotFound, "dictionary directory missing"),
                path: dir,
            });
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, word: &str, language: &str) -> PathBuf {
        let file_name = format!("{word}.json");
        let language_dir = self.dir.join(language);
        if !language.is_empty() && is_plain_name(language) && language_dir.is_dir() {
            language_dir.join(file_name)
        } else {
            self.dir.join(file_name)
        }
    }
}

impl DictionarySource for JsonDirSource {
    fn fetch(&self, word: &str, language: &str) -> Result<RawDictionaryPayload, SourceError> {
        if !is_plain_name(word) {
            debug!("refusing to look up {word:?} on disk");
            return Ok(RawDictionaryPayload::default());
        }
        let path = self.path_for(word, language);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no payload file for {word} at {}", path.display());
                return Ok(RawDictionaryPayload::default());
            }
            Err(source) => return Err(SourceError::Io { path, source }),
        };
        serde_json::from_str(&raw).map_err(|source| SourceError::Json { path, source })
    }

    fn name(&self) -> &str {
        "JsonDirSource"
    }
}

fn is_plain_name(word: &str) -> bool {
    !word.is_empty()
        && word != "."
        && word != ".."
        && !word.contains(['/', '\\', '\0'])
}

/// Payloads held in memory, keyed by word. The language is ignored.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    entries: HashMap<String, RawDictionaryPayload>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: impl Into<String>, payload: RawDictionaryPayload) {
        self.entries.insert(word.into(), payload);
    }

    pub fn with_entry(mut self, word: impl Into<String>, payload: RawDictionaryPayload) -> Self {
        self.insert(word, payload);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DictionarySource for MemorySource {
    fn fetch(&self, word: &str, _language: &str) -> Result<RawDictionaryPayload, SourceError> {
        Ok(self.entries.get(word).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "MemorySource"
    }
}

/// Entries a [`CachedSource`] keeps unless told otherwise.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Read-through cache in front of another source.
///
/// Successful lookups, including "not found", are cached per
/// `(language, word)`. Errors are passed through and never cached. Once the
/// cache holds `capacity` entries, an arbitrary entry is evicted before each
/// insert, so memory stays bounded whatever words callers ask for.
pub struct CachedSource<S> {
    inner: S,
    cache: DashMap<(String, String), RawDictionaryPayload>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// Cache counters since construction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl<S: DictionarySource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    /// A cache holding at most `capacity` payloads (at least one).
    pub fn with_capacity(inner: S, capacity: usize) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.cache.len(),
        }
    }

    fn make_room(&self) {
        while self.cache.len() >= self.capacity {
            // The shard guard from `iter` must be gone before `remove`.
            let victim = self.cache.iter().next().map(|entry| entry.key().clone());
            let Some(key) = victim else { break };
            if self.cache.remove(&key).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("evicted {} ({}) from cache", key.1, key.0);
            }
        }
    }
}

impl<S: DictionarySource> DictionarySource for CachedSource<S> {
    fn fetch(&self, word: &str, language: &str) -> Result<RawDictionaryPayload, SourceError> {
        let key = (language.to_string(), word.to_string());
        if let Some(hit) = self.cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit.value().clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let payload = self.inner.fetch(word, language)?;
        self.make_room();
        self.cache.insert(key, payload.clone());
        Ok(payload)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use lemmacard_types::{RawDefinition, RawEntry};

    fn payload(headword: &str, gloss: &str) -> RawDictionaryPayload {
        RawDictionaryPayload(vec![RawEntry {
            definitions: vec![RawDefinition {
                part_of_speech: Some("verb".into()),
                text: Some(vec![headword.into(), gloss.into()]),
                examples: Vec::new(),
            }],
            ..RawEntry::default()
        }])
    }

    struct CountingSource {
        calls: Cell<usize>,
    }

    impl DictionarySource for CountingSource {
        fn fetch(&self, word: &str, _: &str) -> Result<RawDictionaryPayload, SourceError> {
            self.calls.set(self.calls.get() + 1);
            Ok(if word == "идти" {
                payload("идти́", "to go")
            } else {
                RawDictionaryPayload::default()
            })
        }

        fn name(&self) -> &str {
            "CountingSource"
        }
    }

    #[test]
    fn memory_source_returns_empty_payload_for_unknown_words() {
        let source = MemorySource::new().with_entry("идти", payload("идти́", "to go"));
        assert!(!source.fetch("идти", "russian").unwrap().is_empty());
        assert!(source.fetch("ходить", "russian").unwrap().is_empty());
    }

    #[test]
    fn cache_serves_repeat_lookups() {
        let source = CachedSource::new(CountingSource {
            calls: Cell::new(0),
        });
        for _ in 0..3 {
            source.fetch("идти", "russian").unwrap();
        }
        source.fetch("измочить", "russian").unwrap();
        source.fetch("измочить", "russian").unwrap();

        assert_eq!(source.inner().calls.get(), 2);
        assert_eq!(
            source.stats(),
            CacheStats {
                hits: 3,
                misses: 2,
                evictions: 0,
                entries: 2,
            }
        );
    }

    #[test]
    fn cache_stays_within_capacity_for_unknown_words() {
        let source = CachedSource::with_capacity(MemorySource::new(), 64);
        for i in 0..10_000 {
            let word = format!("слово{i}");
            assert!(source.fetch(&word, "russian").unwrap().is_empty());
        }

        let stats = source.stats();
        assert!(stats.entries <= 64, "{} entries cached", stats.entries);
        assert_eq!(stats.misses, 10_000);
        assert_eq!(stats.evictions, 10_000 - stats.entries as u64);
    }

    #[test]
    fn eviction_keeps_serving_recent_words() {
        let source = CachedSource::with_capacity(
            CountingSource {
                calls: Cell::new(0),
            },
            1,
        );
        source.fetch("идти", "russian").unwrap();
        source.fetch("идти", "russian").unwrap();
        assert_eq!(source.inner().calls.get(), 1);

        source.fetch("измочить", "russian").unwrap();
        assert_eq!(source.stats().entries, 1);
        assert!(!source.fetch("идти", "russian").unwrap().is_empty());
        assert_eq!(source.inner().calls.get(), 3);
        assert_eq!(source.stats().evictions, 2);
    }

    #[test]
    fn zero_capacity_still_caches_one_payload() {
        let source = CachedSource::with_capacity(MemorySource::new(), 0);
        assert_eq!(source.capacity(), 1);
        source.fetch("идти", "russian").unwrap();
        source.fetch("идти", "russian").unwrap();
        assert_eq!(source.stats().hits, 1);
    }

    #[test]
    fn plain_names_reject_paths() {
        assert!(is_plain_name("идти"));
        assert!(!is_plain_name("../etc/passwd"));
        assert!(!is_plain_name(".."));
        assert!(!is_plain_name(""));
    }
}
