//! Resolve an inflected word form to the dictionary sense a learner wants.
//!
//! A lookup for "сказал" finds a sense whose only gloss says it is the past
//! tense "of сказа́ть (skazátʹ)". The engine notices that reference, looks up
//! the base word instead, and keeps going until it reaches a sense that does
//! not point anywhere else. Choices it cannot make alone are delegated to a
//! [`DisambiguationPolicy`]:
//!
//! - several senses for one word: [`DisambiguationPolicy::select_one`];
//! - one base word next to real glosses: [`DisambiguationPolicy::confirm`];
//! - several base words in one sense: [`DisambiguationPolicy::select_one`].
//!
//! When a word has no data at all, [`lemmacard_morph`] guesses base forms from
//! its endings and the first candidate with glosses is used.
//!
//! # Example
//! ```no_run
//! use lemmacard_resolve::{Automatic, Engine};
//! use lemmacard_source::JsonDirSource;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::new(JsonDirSource::open("data")?);
//! let sense = engine.resolve_to_word("сказал", &mut Automatic::new())?;
//! if sense.is_found() {
//!     print!("{sense}");
//! }
//! # Ok(()) }
//! ```

mod engine;
mod error;
mod policy;
mod resolver;

pub use engine::{DEFAULT_LANGUAGE, Engine, Resolution};
pub use error::ResolveError;
pub use policy::{Automatic, DisambiguationPolicy, Interactive};
pub use resolver::{FirstLineHeadword, HeadwordConvention, Resolver, find_base_word, resolve};
