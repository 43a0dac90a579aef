//! Shared types for dictionary lookups and lemma resolution.
//!
//! Two layers live here. The raw layer ([`RawDictionaryPayload`] and friends)
//! mirrors the JSON emitted by a Wiktionary parser for one word: a list of
//! etymology sections, each with definition records and pronunciations. The
//! parsed layer ([`WordSense`], [`WordEntrySet`], [`AudioReference`]) is what
//! the resolver builds from it and what the rest of the workspace consumes.
//!
//! ```rust
//! use lemmacard_types::{WordEntrySet, WordSense};
//!
//! let mut sense = WordSense::new("пугаться", "verb");
//! sense.glosses.push("to be frightened".into());
//! sense.add_base_word_ref("пугать");
//! sense.add_base_word_ref("пугать");
//!
//! let set = WordEntrySet::new("пугаться", vec![sense]);
//! assert_eq!(set.base_word_refs, vec!["пугать".to_string()]);
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Raw payload for one queried word, as produced by the dictionary source.
///
/// An empty list is the "word not found" signal.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct RawDictionaryPayload(pub Vec<RawEntry>);

impl RawDictionaryPayload {
    /// True when no entry carries an etymology or any definition record.
    pub fn is_empty(&self) -> bool {
        self.0
            .iter()
            .all(|entry| entry.etymology.trim().is_empty() && entry.definitions.is_empty())
    }

    pub fn entries(&self) -> &[RawEntry] {
        &self.0
    }
}

/// One etymology section of a raw payload.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RawEntry {
    pub etymology: String,
    pub definitions: Vec<RawDefinition>,
    pub pronunciations: RawPronunciations,
}

/// One definition record. `text[0]` repeats the headword line; the remaining
/// lines are glosses. Missing fields are kept as `None` so malformed records
/// can be reported and skipped instead of failing the whole payload.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RawDefinition {
    #[serde(rename = "partOfSpeech")]
    pub part_of_speech: Option<String>,
    pub text: Option<Vec<String>>,
    pub examples: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RawPronunciations {
    pub text: Vec<String>,
    pub audio: Vec<String>,
}

/// Pronunciation attached to a sense. `local_file` is only set once an audio
/// localizer has downloaded and converted `source_url`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct AudioReference {
    pub source_url: String,
    pub local_file: Option<PathBuf>,
}

impl AudioReference {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            source_url: url.into(),
            local_file: None,
        }
    }

    pub fn has_source(&self) -> bool {
        !self.source_url.is_empty()
    }
}

/// A single part-of-speech tagged sense of a word.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct WordSense {
    /// Lemma as written on the sense's headword line, accents stripped.
    /// Empty for the not-found sense.
    pub headword: String,
    pub part_of_speech: String,
    pub glosses: Vec<String>,
    /// Lemmas referenced from gloss text ("... of <word> (...)"), unique.
    pub base_word_refs: Vec<String>,
    pub examples: Vec<String>,
    pub audio: AudioReference,
}

impl WordSense {
    pub fn new(headword: impl Into<String>, part_of_speech: impl Into<String>) -> Self {
        Self {
            headword: headword.into(),
            part_of_speech: part_of_speech.into(),
            ..Self::default()
        }
    }

    /// The terminal "nothing found" result: an empty headword and no glosses.
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn is_found(&self) -> bool {
        !self.headword.is_empty()
    }

    pub fn has_glosses(&self) -> bool {
        !self.glosses.is_empty()
    }

    /// Record a base-word reference unless this sense already holds it.
    /// Returns whether the reference was new.
    pub fn add_base_word_ref(&mut self, lemma: impl Into<String>) -> bool {
        let lemma = lemma.into();
        if lemma.is_empty() || self.base_word_refs.contains(&lemma) {
            return false;
        }
        self.base_word_refs.push(lemma);
        true
    }
}

impl fmt::Display for WordSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.part_of_speech.is_empty() {
            writeln!(f, "{}", self.headword)?;
        } else {
            writeln!(f, "{}: {}", self.headword, self.part_of_speech)?;
        }
        for (i, gloss) in self.glosses.iter().enumerate() {
            writeln!(f, "\t{}. {}", i + 1, gloss)?;
        }
        for example in &self.examples {
            writeln!(f, "\t\t- {example}")?;
        }
        Ok(())
    }
}

/// Every sense found for one queried word string.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct WordEntrySet {
    pub queried_word: String,
    pub senses: Vec<WordSense>,
    /// Concatenation of each sense's references in sense order. Duplicates
    /// across senses are kept.
    pub base_word_refs: Vec<String>,
}

impl WordEntrySet {
    pub fn new(queried_word: impl Into<String>, senses: Vec<WordSense>) -> Self {
        let base_word_refs = senses
            .iter()
            .flat_map(|sense| sense.base_word_refs.iter().cloned())
            .collect();
        Self {
            queried_word: queried_word.into(),
            senses,
            base_word_refs,
        }
    }

    pub fn empty(queried_word: impl Into<String>) -> Self {
        Self::new(queried_word, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.senses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.senses.len()
    }

    /// True when at least one sense carries gloss text.
    pub fn has_glosses(&self) -> bool {
        self.senses.iter().any(WordSense::has_glosses)
    }
}

impl fmt::Display for WordEntrySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sense) in self.senses.iter().enumerate() {
            write!(f, "{}) {}", i + 1, sense)?;
        }
        Ok(())
    }
}
