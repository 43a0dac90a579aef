use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::{decompose_canonical, is_combining_mark};

/// Short i. Canonically it decomposes to `и` + U+0306, so it has to bypass the
/// mark filter or it would come out as a plain `и`.
const SHORT_I: char = 'й';

/// Remove stress marks and other combining diacritics from `text`.
///
/// The input is composed first so that a decomposed `и` + breve is recognised
/// as `й` as well. Every other character is decomposed and its combining
/// marks dropped, which also turns `ё` into `е`.
///
/// ```rust
/// use lemmacard_morph::strip_accents;
///
/// assert_eq!(strip_accents("пожа́луй"), "пожалуй");
/// assert_eq!(strip_accents(""), "");
/// ```
pub fn strip_accents(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.nfc() {
        if ch == SHORT_I {
            out.push(ch);
            continue;
        }
        decompose_canonical(ch, |part| {
            if !is_combining_mark(part) {
                out.push(part);
            }
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "пожа́луй",
        "идти́ • (idtí) impf",
        "ска́зывать",
        "йо́гурт",
        "ёлка",
        "краси́вый",
        "plain ascii",
        "café",
    ];

    #[test]
    fn strips_stress_marks() {
        assert_eq!(strip_accents("пожа́луй"), "пожалуй");
        assert_eq!(strip_accents("пуга́ть"), "пугать");
        assert_eq!(strip_accents("зубри́ть"), "зубрить");
    }

    #[test]
    fn keeps_short_i_in_place() {
        let stripped = strip_accents("йо́гурт мо́й");
        assert_eq!(stripped, "йогурт мой");
        assert_eq!(stripped.chars().position(|c| c == 'й'), Some(0));
        assert_eq!(stripped.chars().filter(|c| *c == 'й').count(), 2);
    }

    #[test]
    fn decomposed_short_i_is_recomposed() {
        assert_eq!(strip_accents("мои\u{306}"), "мой");
    }

    #[test]
    fn yo_loses_its_diaeresis() {
        assert_eq!(strip_accents("ёлка"), "елка");
    }

    #[test]
    fn leaves_no_combining_marks() {
        for sample in SAMPLES {
            let stripped = strip_accents(sample);
            assert!(
                !stripped.chars().any(is_combining_mark),
                "marks left in {stripped:?}"
            );
        }
    }

    #[test]
    fn is_idempotent() {
        for sample in SAMPLES {
            let once = strip_accents(sample);
            assert_eq!(strip_accents(&once), once);
        }
    }
}
