//! Flashcard notes and deck export.
//!
//! Every note uses the "Auto Vocab" note type: fields `Front`, `Back` and
//! `Audio`, with a listening card (audio first) and a reading card (back
//! first). Two output formats exist:
//!
//! - `.apkg`: a self-contained Anki package carrying the note type, both card
//!   templates and the audio files.
//! - anything else: Anki's text import format. The header names the note type
//!   with `#notetype:`, which must already exist in the collection with the
//!   three fields above, and the caller copies the files returned by
//!   [`Deck::export`] into the collection's media folder.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use lemmacard_types::WordSense;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_DECK_NAME: &str = "Auto Generated Vocab";
pub const DECK_ID: i64 = 205940011;
pub const NOTE_TYPE_ID: i64 = 1607392312;
pub const NOTE_TYPE_NAME: &str = "Auto Vocab";
pub const FIELDS: [&str; 3] = ["Front", "Back", "Audio"];

const LISTENING_FRONT: &str = "Listen...<br>{{Audio}}";
const LISTENING_BACK: &str = r#"{{Front}}<hr id="answer">{{Back}}"#;
const READING_FRONT: &str = "{{Back}}";
const READING_BACK: &str = r#"{{FrontSide}}<hr id="answer">{{Front}}{{Audio}}"#;

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("failed to write deck {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to package deck {}: {source}", .path.display())]
    Package {
        path: PathBuf,
        #[source]
        source: genanki_rs::Error,
    },
    #[error("deck path {} is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),
}

/// Output format, chosen from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeckFormat {
    Package,
    Text,
}

impl DeckFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("apkg") => DeckFormat::Package,
            _ => DeckFormat::Text,
        }
    }
}

/// One flashcard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub front: String,
    /// HTML.
    pub back: String,
    pub audio: Option<PathBuf>,
}

impl Note {
    pub fn from_sense(sense: &WordSense) -> Self {
        Self {
            front: sense.headword.clone(),
            back: back_html(sense),
            audio: sense.audio.local_file.clone(),
        }
    }

    /// `[sound:name.mp3]`, or empty without audio.
    pub fn audio_field(&self) -> String {
        self.audio
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| format!("[sound:{}]", name.to_string_lossy()))
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct Deck {
    name: String,
    notes: Vec<Note>,
}

impl Deck {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn add_note(&mut self, note: Note) {
        debug!("adding note {}", note.front);
        self.notes.push(note);
    }

    pub fn add_sense(&mut self, sense: &WordSense) {
        self.add_note(Note::from_sense(sense));
    }

    /// Local audio files referenced by the notes, in note order.
    pub fn media_files(&self) -> Vec<PathBuf> {
        self.notes
            .iter()
            .filter_map(|note| note.audio.clone())
            .collect()
    }

    /// Anki text import format.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "#separator:tab")?;
        writeln!(out, "#html:true")?;
        writeln!(out, "#notetype:{NOTE_TYPE_NAME}")?;
        writeln!(out, "#deck:{}", field(&self.name))?;
        writeln!(out, "#columns:{}", FIELDS.join("\t"))?;
        for note in &self.notes {
            writeln!(
                out,
                "{}\t{}\t{}",
                field(&note.front),
                field(&note.back),
                field(&note.audio_field())
            )?;
        }
        out.flush()
    }

    /// Write the deck to `path` in the format its extension asks for and
    /// return the media files it references. A package already contains them.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>, DeckError> {
        let path = path.as_ref();
        match DeckFormat::for_path(path) {
            DeckFormat::Package => self.write_package(path)?,
            DeckFormat::Text => {
                let io_err = |source| DeckError::Io {
                    path: path.to_path_buf(),
                    source,
                };
                let file = File::create(path).map_err(io_err)?;
                self.write_to(BufWriter::new(file)).map_err(io_err)?;
            }
        }
        info!("wrote {} notes to {}", self.len(), path.display());
        Ok(self.media_files())
    }

    fn write_package(&self, path: &Path) -> Result<(), DeckError> {
        let out = path
            .to_str()
            .ok_or_else(|| DeckError::NonUtf8Path(path.to_path_buf()))?;
        let package_err = |source| DeckError::Package {
            path: path.to_path_buf(),
            source,
        };

        let model = note_type();
        let mut deck = genanki_rs::Deck::new(DECK_ID, &self.name, "");
        for note in &self.notes {
            let audio = note.audio_field();
            let fields = vec![note.front.as_str(), note.back.as_str(), audio.as_str()];
            deck.add_note(genanki_rs::Note::new(model.clone(), fields).map_err(package_err)?);
        }

        let media: Vec<String> = self
            .media_files()
            .iter()
            .map(|file| file.to_string_lossy().into_owned())
            .collect();
        let mut package =
            genanki_rs::Package::new(vec![deck], media.iter().map(String::as_str).collect())
                .map_err(package_err)?;
        package.write_to_file(out).map_err(package_err)?;
        debug!("packaged {} media files", media.len());
        Ok(())
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new(DEFAULT_DECK_NAME)
    }
}

/// The "Auto Vocab" note type with its listening and reading cards.
pub fn note_type() -> genanki_rs::Model {
    genanki_rs::Model::new(
        NOTE_TYPE_ID,
        NOTE_TYPE_NAME,
        FIELDS.iter().map(|name| genanki_rs::Field::new(name)).collect(),
        vec![
            genanki_rs::Template::new("Card 1")
                .qfmt(LISTENING_FRONT)
                .afmt(LISTENING_BACK),
            genanki_rs::Template::new("Card 2")
                .qfmt(READING_FRONT)
                .afmt(READING_BACK),
        ],
    )
}

/// `<b>pos</b><br><ol><li>gloss</li>…</ol>`
pub fn back_html(sense: &WordSense) -> String {
    let mut html = String::new();
    if !sense.part_of_speech.is_empty() {
        html.push_str(&format!("<b>{}</b><br>", escape(&sense.part_of_speech)));
    }
    html.push_str("<ol>");
    for gloss in &sense.glosses {
        html.push_str(&format!("<li>{}</li>", escape(gloss)));
    }
    html.push_str("</ol>");
    html
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// Tabs and newlines would break the row structure.
fn field(text: &str) -> String {
    text.replace('\t', " ").replace("\r\n", "<br>").replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use lemmacard_types::AudioReference;

    use super::*;

    fn pit(audio: PathBuf) -> WordSense {
        let mut sense = WordSense::new("пить", "verb");
        sense.glosses.push("to drink".into());
        sense.glosses.push("to drink alcohol, to booze".into());
        sense.audio = AudioReference {
            source_url: "//x/Ru-%D0%BF%D0%B8%D1%82%D1%8C.ogg".into(),
            local_file: Some(audio),
        };
        sense
    }

    #[test]
    fn back_lists_glosses() {
        assert_eq!(
            back_html(&pit(PathBuf::from("vocab/Ru-пить.mp3"))),
            "<b>verb</b><br><ol><li>to drink</li><li>to drink alcohol, to booze</li></ol>"
        );
    }

    #[test]
    fn back_without_part_of_speech_and_markup_in_glosses() {
        let mut sense = WordSense::new("ход", "");
        sense.glosses.push("move <chess> & turn".into());
        assert_eq!(
            back_html(&sense),
            "<ol><li>move &lt;chess&gt; &amp; turn</li></ol>"
        );
    }

    #[test]
    fn audio_field_uses_the_file_name() {
        let note = Note::from_sense(&pit(PathBuf::from("vocab/Ru-пить.mp3")));
        assert_eq!(note.front, "пить");
        assert_eq!(note.audio_field(), "[sound:Ru-пить.mp3]");

        let silent = Note::from_sense(&WordSense::new("колотить", "verb"));
        assert_eq!(silent.audio_field(), "");
    }

    #[test]
    fn format_follows_the_extension() {
        assert_eq!(DeckFormat::for_path(Path::new("deck.apkg")), DeckFormat::Package);
        assert_eq!(DeckFormat::for_path(Path::new("out/Deck.APKG")), DeckFormat::Package);
        assert_eq!(DeckFormat::for_path(Path::new("deck.tsv")), DeckFormat::Text);
        assert_eq!(DeckFormat::for_path(Path::new("deck")), DeckFormat::Text);
    }

    #[test]
    fn text_export_names_the_three_field_note_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.tsv");

        let mut deck = Deck::default();
        deck.add_sense(&pit(PathBuf::from("vocab/Ru-пить.mp3")));
        let mut kolotit = WordSense::new("колотить", "verb");
        kolotit.glosses.push("to beat\tto thrash".into());
        deck.add_sense(&kolotit);

        let media = deck.export(&path).unwrap();
        assert_eq!(media, vec![PathBuf::from("vocab/Ru-пить.mp3")]);

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines[..5],
            [
                "#separator:tab",
                "#html:true",
                "#notetype:Auto Vocab",
                "#deck:Auto Generated Vocab",
                "#columns:Front\tBack\tAudio",
            ]
        );
        assert_eq!(lines.len(), 7);
        assert_eq!(
            lines[5],
            "пить\t<b>verb</b><br><ol><li>to drink</li><li>to drink alcohol, to booze</li></ol>\t[sound:Ru-пить.mp3]"
        );
        assert_eq!(
            lines[6],
            "колотить\t<b>verb</b><br><ol><li>to beat to thrash</li></ol>\t"
        );
    }

    #[test]
    fn package_export_writes_an_anki_archive() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("Ru-пить.mp3");
        std::fs::write(&audio, b"ID3\x03\x00\x00\x00\x00\x00\x00").unwrap();
        let path = dir.path().join("deck.apkg");

        let mut deck = Deck::new("Russian");
        deck.add_sense(&pit(audio.clone()));
        deck.add_sense(&WordSense::new("колотить", "verb"));

        let media = deck.export(&path).unwrap();
        assert_eq!(media, vec![audio]);

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"), "an .apkg is a zip archive");
    }

    #[test]
    fn note_type_has_listening_and_reading_cards() {
        assert_eq!(FIELDS, ["Front", "Back", "Audio"]);
        assert!(LISTENING_FRONT.contains("{{Audio}}"));
        assert!(READING_BACK.contains("{{Audio}}"));
        let _model = note_type();
    }

    #[test]
    fn export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Deck::default()
            .export(dir.path().join("missing").join("deck.tsv"))
            .unwrap_err();
        assert!(err.to_string().contains("deck.tsv"));
    }
}
