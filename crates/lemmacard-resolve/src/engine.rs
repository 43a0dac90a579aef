//! The resolution loop: query, pick a sense, follow base-word references.

use std::collections::HashMap;
use std::fmt::Write as _;

use lemmacard_morph::{MatchMode, candidates};
use lemmacard_source::DictionarySource;
use lemmacard_types::{WordEntrySet, WordSense};
use tracing::{debug, info, warn};

use crate::error::ResolveError;
use crate::policy::DisambiguationPolicy;
use crate::resolver::{FirstLineHeadword, HeadwordConvention, Resolver};

pub const DEFAULT_LANGUAGE: &str = "russian";

/// Outcome of a resolution together with the chain of words it went through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// The final sense; [`WordSense::not_found`] when nothing matched.
    pub sense: WordSense,
    /// Queried words in the order they were used, starting with the input.
    /// A fallback candidate that produced data is included.
    pub path: Vec<String>,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        self.sense.is_found()
    }
}

/// Resolves word forms to a single sense using a dictionary source and a
/// disambiguation policy supplied per call.
///
/// The engine holds no per-resolution state, so one instance can serve
/// concurrent resolutions as long as the source allows it.
pub struct Engine<S, C = FirstLineHeadword> {
    source: S,
    resolver: Resolver<C>,
    language: String,
    match_mode: MatchMode,
}

impl<S: DictionarySource> Engine<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            resolver: Resolver::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            match_mode: MatchMode::default(),
        }
    }
}

impl<S: DictionarySource, C: HeadwordConvention> Engine<S, C> {
    pub fn with_resolver<C2: HeadwordConvention>(self, resolver: Resolver<C2>) -> Engine<S, C2> {
        Engine {
            source: self.source,
            resolver,
            language: self.language,
            match_mode: self.match_mode,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// How fallback candidates match inflectional endings.
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Query and parse `word` without any disambiguation or fallback.
    pub fn entries(&self, word: &str) -> Result<WordEntrySet, ResolveError> {
        let payload = self.source.fetch(word, &self.language)?;
        Ok(self.resolver.resolve(word, &payload))
    }

    pub fn resolve_to_word<P>(&self, word: &str, policy: &mut P) -> Result<WordSense, ResolveError>
    where
        P: DisambiguationPolicy + ?Sized,
    {
        self.resolve_traced(word, None, policy)
            .map(|resolution| resolution.sense)
    }

    /// Like [`resolve_to_word`](Self::resolve_to_word), with a 0-based sense
    /// index to use instead of asking when the input word has several senses.
    pub fn resolve_with_selection<P>(
        &self,
        word: &str,
        selection: Option<usize>,
        policy: &mut P,
    ) -> Result<WordSense, ResolveError>
    where
        P: DisambiguationPolicy + ?Sized,
    {
        self.resolve_traced(word, selection, policy)
            .map(|resolution| resolution.sense)
    }

    /// Resolve `word`, reporting the chain of words that was followed.
    ///
    /// `selection` only applies to the input word; later hops always consult
    /// the policy. Following a base word that was already visited fails with
    /// [`ResolveError::CycleDetected`].
    pub fn resolve_traced<P>(
        &self,
        word: &str,
        selection: Option<usize>,
        policy: &mut P,
    ) -> Result<Resolution, ResolveError>
    where
        P: DisambiguationPolicy + ?Sized,
    {
        let mut walk = Walk::default();
        let mut selection = selection;
        let mut current = word.to_string();

        loop {
            let first_hop = walk.path.is_empty();
            let preselected = selection.take();
            walk.query(self, &current)?;
            walk.path.push(current.clone());

            if !walk.arena[&current].has_glosses() {
                let fallback = if first_hop {
                    self.fallback(&current, &mut walk)?
                } else {
                    None
                };
                match fallback {
                    Some(found) => {
                        walk.path.push(found.clone());
                        current = found;
                    }
                    None if walk.arena[&current].is_empty() => {
                        info!("no definition found for {current}");
                        return Ok(walk.finish(WordSense::not_found()));
                    }
                    None => {}
                }
            }

            let set = &walk.arena[&current];
            let index = match preselected {
                _ if set.len() == 1 => 0,
                Some(index) if index < set.len() => index,
                Some(index) => {
                    warn!(
                        "selection {} out of range for {current} ({} senses)",
                        index + 1,
                        set.len()
                    );
                    select_sense(set, policy)?
                }
                None => select_sense(set, policy)?,
            };
            let sense = &set.senses[index];

            let next = match sense.base_word_refs.as_slice() {
                [] => {
                    debug!("{} has no base word", sense.headword);
                    let sense = sense.clone();
                    return Ok(walk.finish(sense));
                }
                [only] if sense.glosses.len() == 1 => {
                    info!("replacing {current} with base word {only}");
                    only.clone()
                }
                [only] => {
                    let prompt = format!("{sense}Use base word {only}?");
                    if policy.confirm(&prompt)? {
                        info!("replacing {current} with base word {only}");
                        only.clone()
                    } else {
                        let sense = sense.clone();
                        return Ok(walk.finish(sense));
                    }
                }
                refs => {
                    let prompt = numbered(
                        &format!("Multiple base words found for {}:", sense.headword),
                        refs.iter(),
                    );
                    let choice = checked(policy.select_one(1, refs.len(), &prompt)?, refs.len());
                    info!("replacing {current} with base word {}", refs[choice - 1]);
                    refs[choice - 1].clone()
                }
            };

            if next == current {
                debug!("{current} refers to itself, keeping it");
                let sense = walk.arena[&current].senses[index].clone();
                return Ok(walk.finish(sense));
            }
            if walk.path.contains(&next) {
                let mut path = walk.path;
                path.push(next.clone());
                return Err(ResolveError::CycleDetected { word: next, path });
            }
            current = next;
        }
    }

    /// Try generated base-word candidates until one has glosses.
    fn fallback(&self, word: &str, walk: &mut Walk) -> Result<Option<String>, ResolveError> {
        debug!("text empty for word {word}, trying candidate base words");
        for cand in candidates(word, self.match_mode) {
            if walk.arena.contains_key(&cand.lemma) {
                continue;
            }
            walk.query(self, &cand.lemma)?;
            if walk.arena[&cand.lemma].has_glosses() {
                info!(
                    "using candidate {} for {word} ({:?})",
                    cand.lemma, cand.source
                );
                return Ok(Some(cand.lemma));
            }
        }
        Ok(None)
    }
}

/// Per-resolution bookkeeping: every entry set queried so far, keyed by word,
/// and the chain of words used.
#[derive(Default)]
struct Walk {
    arena: HashMap<String, WordEntrySet>,
    path: Vec<String>,
}

impl Walk {
    fn query<S, C>(&mut self, engine: &Engine<S, C>, word: &str) -> Result<(), ResolveError>
    where
        S: DictionarySource,
        C: HeadwordConvention,
    {
        if !self.arena.contains_key(word) {
            let set = engine.entries(word)?;
            self.arena.insert(word.to_string(), set);
        }
        Ok(())
    }

    fn finish(self, sense: WordSense) -> Resolution {
        Resolution {
            sense,
            path: self.path,
        }
    }
}

fn select_sense<P>(set: &WordEntrySet, policy: &mut P) -> Result<usize, ResolveError>
where
    P: DisambiguationPolicy + ?Sized,
{
    let prompt = format!(
        "Multiple senses found for {} ({}):\n{set}",
        set.queried_word,
        set.len()
    );
    let choice = checked(policy.select_one(1, set.len(), &prompt)?, set.len());
    Ok(choice - 1)
}

/// Clamp a policy answer into `1..=max`.
fn checked(choice: usize, max: usize) -> usize {
    if !(1..=max).contains(&choice) {
        warn!("policy answered {choice}, expected 1-{max}");
    }
    choice.clamp(1, max)
}

fn numbered<'a>(title: &str, items: impl Iterator<Item = &'a String>) -> String {
    let mut out = format!("{title}\n");
    for (i, item) in items.enumerate() {
        let _ = writeln!(out, "{}) {item}", i + 1);
    }
    out
}
