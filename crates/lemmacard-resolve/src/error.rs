use std::io;

use lemmacard_source::SourceError;
use thiserror::Error;

/// Hard failures of a single resolution. "Not found" is not an error; it is
/// reported as a sense with an empty headword.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("base word cycle at {word} (path: {})", .path.join(" -> "))]
    CycleDetected { word: String, path: Vec<String> },
    #[error("disambiguation prompt failed: {0}")]
    Prompt(#[from] io::Error),
}
