//! Turn raw definition records into [`WordSense`]s.

use std::sync::LazyLock;

use lemmacard_morph::strip_accents;
use lemmacard_types::{
    AudioReference, RawDefinition, RawDictionaryPayload, RawEntry, WordEntrySet, WordSense,
};
use regex::Regex;
use tracing::{debug, info, warn};

// "feminine singular past indicative imperfective of зубри́ть (zubritʹ)"
static BASE_WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)of\s+(.+?)\s+\(.+\)").expect("base word pattern is valid")
});

/// How a definition record's text lines split into a headword and glosses.
pub trait HeadwordConvention {
    /// Returns the headword (accents stripped) and the gloss lines, or `None`
    /// when the lines carry no headword at all.
    fn split<'a>(&self, lines: &'a [String]) -> Option<(String, &'a [String])>;
}

/// Wiktionary layout: the first line repeats the lemma ("идти́ • (idtí)
/// impf") and every following line is a gloss.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstLineHeadword;

impl HeadwordConvention for FirstLineHeadword {
    fn split<'a>(&self, lines: &'a [String]) -> Option<(String, &'a [String])> {
        let (first, glosses) = lines.split_first()?;
        let token = first.split_whitespace().next()?;
        Some((strip_accents(token), glosses))
    }
}

/// Extract the lemma a gloss points at, if any.
///
/// ```rust
/// use lemmacard_resolve::find_base_word;
///
/// assert_eq!(
///     find_base_word("passive of пуга́ть (pugatʹ)").as_deref(),
///     Some("пугать")
/// );
/// assert_eq!(find_base_word("(of precipitation) to fall"), None);
/// ```
pub fn find_base_word(gloss: &str) -> Option<String> {
    let caps = BASE_WORD_PATTERN.captures(gloss)?;
    let lemma = strip_accents(caps.get(1)?.as_str().trim());
    debug!("base word {lemma} found in {gloss:?}");
    (!lemma.is_empty()).then_some(lemma)
}

/// Builds [`WordEntrySet`]s from raw payloads.
#[derive(Clone, Debug, Default)]
pub struct Resolver<C = FirstLineHeadword> {
    convention: C,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: HeadwordConvention> Resolver<C> {
    pub fn with_convention(convention: C) -> Self {
        Self { convention }
    }

    /// Parse every definition record of `payload`. Malformed records are
    /// skipped; an empty payload yields an empty set.
    pub fn resolve(&self, word: &str, payload: &RawDictionaryPayload) -> WordEntrySet {
        if payload.is_empty() {
            info!("no data found for word {word}");
            return WordEntrySet::empty(word);
        }

        let mut senses = Vec::new();
        for entry in payload.entries() {
            let audio = entry_audio(word, entry);
            for (i, definition) in entry.definitions.iter().enumerate() {
                match self.parse_sense(definition, &audio) {
                    Some(sense) => senses.push(sense),
                    None => warn!("skipping malformed definition {} for {word}", i + 1),
                }
            }
        }

        let set = WordEntrySet::new(word, senses);
        debug!(
            "{word}: {} senses, base words {:?}",
            set.len(),
            set.base_word_refs
        );
        set
    }

    /// Parse a single definition record. `None` when it has no text lines.
    pub fn parse_sense(
        &self,
        definition: &RawDefinition,
        audio: &AudioReference,
    ) -> Option<WordSense> {
        let lines = definition.text.as_deref()?;
        let (headword, gloss_lines) = self.convention.split(lines)?;

        let mut sense = WordSense::new(
            headword,
            definition.part_of_speech.clone().unwrap_or_default(),
        );
        for line in gloss_lines {
            debug!("parsing line {line}");
            if let Some(lemma) = find_base_word(line) {
                sense.add_base_word_ref(lemma);
            }
            sense.glosses.push(line.clone());
        }
        sense.examples = definition.examples.clone();
        sense.audio = audio.clone();
        Some(sense)
    }
}

/// Shorthand for [`Resolver::resolve`] with the Wiktionary layout.
pub fn resolve(word: &str, payload: &RawDictionaryPayload) -> WordEntrySet {
    Resolver::new().resolve(word, payload)
}

fn entry_audio(word: &str, entry: &RawEntry) -> AudioReference {
    let urls = &entry.pronunciations.audio;
    if urls.len() > 1 {
        info!(
            "{} audio URLs found for word {word}, only using the first",
            urls.len()
        );
    }
    urls.first()
        .map(AudioReference::from_url)
        .unwrap_or_default()
}
