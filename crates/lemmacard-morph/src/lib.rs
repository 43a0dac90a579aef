//! Heuristic lemma guessing for Russian word forms.
//!
//! When a dictionary has no usable entry for an inflected form, the resolver
//! falls back to rewriting the form into plausible dictionary forms and
//! querying those instead. The rules are deliberately small:
//!
//! 1. Adjective case/gender/number endings are replaced by each of the three
//!    masculine nominative endings (`ой`, `ый`, `ий`).
//! 2. Past tense verb endings are replaced by the infinitive ending `ть`.
//! 3. Reflexive past tense endings are replaced by `ться`.
//!
//! Candidates are emitted in that order, table order within each group, and
//! are not deduplicated. Nothing here checks that a candidate exists; that is
//! the caller's job.
//!
//! # Example
//! ```rust
//! use lemmacard_morph::{MatchMode, candidate_base_words, candidates};
//!
//! assert_eq!(candidate_base_words("сказал"), vec!["сказать"]);
//!
//! // Endings match anywhere in the word unless anchored.
//! assert_eq!(candidate_base_words("поле"), vec!["потье"]);
//! assert!(candidates("поле", MatchMode::Suffix).is_empty());
//! ```

mod accents;

pub use accents::strip_accents;

use tracing::debug;

const ADJECTIVE_ENDINGS: [&str; 11] = [
    "ое", "ая", "ые", "ого", "ой", "ых", "ому", "ым", "ою", "ыми", "ом",
];
const ADJECTIVE_LEMMA_ENDINGS: [&str; 3] = ["ой", "ый", "ий"];
const VERB_PAST_ENDINGS: [&str; 4] = ["л", "ла", "ло", "ли"];
const VERB_INFINITIVE: &str = "ть";
const REFLEXIVE_PAST_ENDINGS: [&str; 4] = ["лся", "лась", "лось", "лись"];
const REFLEXIVE_INFINITIVE: &str = "ться";

/// Which rule table produced a candidate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CandidateSource {
    Adjective {
        ending: &'static str,
        replacement: &'static str,
    },
    Verb {
        ending: &'static str,
        replacement: &'static str,
    },
    ReflexiveVerb {
        ending: &'static str,
        replacement: &'static str,
    },
}

/// A guessed dictionary form paired with the rule that produced it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LemmaCandidate {
    pub lemma: String,
    pub source: CandidateSource,
}

/// Where an ending has to occur for a rule to fire.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MatchMode {
    /// Anywhere in the word; the first occurrence is rewritten.
    #[default]
    Substring,
    /// Only at the end of the word.
    Suffix,
}

/// Guess base words for `inflected` using substring matching.
pub fn candidate_base_words(inflected: &str) -> Vec<String> {
    candidates(inflected, MatchMode::Substring)
        .into_iter()
        .map(|cand| cand.lemma)
        .collect()
}

/// Guess base words for `inflected`, keeping the rule that produced each one.
pub fn candidates(inflected: &str, mode: MatchMode) -> Vec<LemmaCandidate> {
    let mut out = Vec::new();

    for ending in ADJECTIVE_ENDINGS {
        for replacement in ADJECTIVE_LEMMA_ENDINGS {
            if let Some(lemma) = apply_rule(inflected, ending, replacement, mode) {
                out.push(LemmaCandidate {
                    lemma,
                    source: CandidateSource::Adjective {
                        ending,
                        replacement,
                    },
                });
            }
        }
    }

    for ending in VERB_PAST_ENDINGS {
        if let Some(lemma) = apply_rule(inflected, ending, VERB_INFINITIVE, mode) {
            out.push(LemmaCandidate {
                lemma,
                source: CandidateSource::Verb {
                    ending,
                    replacement: VERB_INFINITIVE,
                },
            });
        }
    }

    for ending in REFLEXIVE_PAST_ENDINGS {
        if let Some(lemma) = apply_rule(inflected, ending, REFLEXIVE_INFINITIVE, mode) {
            out.push(LemmaCandidate {
                lemma,
                source: CandidateSource::ReflexiveVerb {
                    ending,
                    replacement: REFLEXIVE_INFINITIVE,
                },
            });
        }
    }

    for cand in &out {
        debug!("candidate {} from {:?}", cand.lemma, cand.source);
    }
    out
}

fn apply_rule(word: &str, ending: &str, replacement: &str, mode: MatchMode) -> Option<String> {
    match mode {
        MatchMode::Substring => word
            .contains(ending)
            .then(|| word.replacen(ending, replacement, 1)),
        MatchMode::Suffix => word
            .strip_suffix(ending)
            .map(|stem| format!("{stem}{replacement}")),
    }
}
