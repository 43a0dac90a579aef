//! Word list in, deck out.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use lemmacard_resolve::{DisambiguationPolicy, Engine, HeadwordConvention, ResolveError};
use lemmacard_source::DictionarySource;
use tracing::{info, warn};

use crate::audio::{AudioLocalizer, attach_audio};
use crate::deck::Deck;

/// Trimmed, lower-cased words; blank lines skipped.
pub fn parse_word_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_lowercase)
        .collect()
}

pub fn read_word_list(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    fs::read_to_string(path).map(|text| parse_word_list(&text))
}

/// What a batch run could not do.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub added: usize,
    pub not_found: Vec<String>,
    /// Only tracked when audio was requested.
    pub no_audio: Vec<String>,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.not_found.is_empty() {
            writeln!(f, "Definitions found for all words!")?;
        } else {
            writeln!(f, "No definition found for the following words:")?;
            for word in &self.not_found {
                writeln!(f, "\t{word}")?;
            }
        }
        if self.no_audio.is_empty() {
            writeln!(f, "Audio found for all words!")
        } else {
            writeln!(f, "No audio found for the following words:")?;
            for word in &self.no_audio {
                writeln!(f, "\t{word}")?;
            }
            Ok(())
        }
    }
}

/// Resolve every word and add the result to `deck`.
///
/// Words without a definition, including those whose lookup failed, are
/// reported instead of aborting the run. Only a failed prompt stops it.
pub fn build_deck<S, C, P>(
    engine: &Engine<S, C>,
    words: &[String],
    policy: &mut P,
    localizer: Option<&dyn AudioLocalizer>,
    deck: &mut Deck,
) -> Result<BuildReport, ResolveError>
where
    S: DictionarySource,
    C: HeadwordConvention,
    P: DisambiguationPolicy + ?Sized,
{
    let mut report = BuildReport::default();
    for word in words {
        info!("*** generating card for word {word} ***");
        let resolution = match engine.resolve_traced(word, None, policy) {
            Ok(resolution) => resolution,
            Err(err @ ResolveError::Prompt(_)) => return Err(err),
            Err(err) => {
                warn!("lookup of {word} failed: {err}");
                report.not_found.push(word.clone());
                continue;
            }
        };
        if !resolution.is_found() {
            report.not_found.push(word.clone());
            continue;
        }
        if resolution.path.len() > 1 {
            info!("{word} resolved via {}", resolution.path.join(" -> "));
        }

        let mut sense = resolution.sense;
        if let Some(localizer) = localizer {
            if !attach_audio(&mut sense, localizer) {
                report.no_audio.push(word.clone());
            }
        }
        deck.add_sense(&sense);
        report.added += 1;
    }
    Ok(report)
}
