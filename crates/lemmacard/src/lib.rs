pub mod audio;
pub mod batch;
pub mod deck;
pub mod handlers;

use std::path::Path;

use lemmacard_morph::MatchMode;
use lemmacard_resolve::Engine;
use lemmacard_source::{CachedSource, JsonDirSource, SourceError};

pub use audio::{AudioError, AudioLocalizer, CommandLocalizer, attach_audio, url_to_file_name};
pub use batch::{BuildReport, build_deck, parse_word_list, read_word_list};
pub use deck::{Deck, DeckError, Note};
pub use handlers::{AppState, SharedEngine, router};

/// Engine over a JSON dictionary directory behind a cache of at most
/// `cache_capacity` payloads.
pub fn open_engine(
    dict_dir: impl AsRef<Path>,
    language: &str,
    match_mode: MatchMode,
    cache_capacity: usize,
) -> Result<Engine<CachedSource<JsonDirSource>>, SourceError> {
    let source = CachedSource::with_capacity(JsonDirSource::open(dict_dir)?, cache_capacity);
    Ok(Engine::new(source)
        .with_language(language)
        .with_match_mode(match_mode))
}
