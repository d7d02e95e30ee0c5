//! Script-based language tagging.

use crate::model::Language;

/// Whether a character is a Hangul syllable or jamo.
pub fn is_hangul(c: char) -> bool {
    matches!(c,
        '\u{AC00}'..='\u{D7A3}'   // Hangul syllables
        | '\u{1100}'..='\u{11FF}' // Hangul jamo
        | '\u{3130}'..='\u{318F}' // Hangul compatibility jamo
        | '\u{A960}'..='\u{A97F}' // Hangul jamo extended-A
        | '\u{D7B0}'..='\u{D7FF}' // Hangul jamo extended-B
    )
}

/// Tag text as Korean if it contains any Hangul code point, English otherwise.
pub fn detect_language(text: &str) -> Language {
    if text.chars().any(is_hangul) {
        Language::Ko
    } else {
        Language::En
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_korean_text() {
        assert_eq!(detect_language("안녕하세요 Report"), Language::Ko);
    }

    #[test]
    fn test_latin_text() {
        assert_eq!(detect_language("Quarterly Outlook"), Language::En);
        assert_eq!(detect_language(""), Language::En);
        assert_eq!(detect_language("Café 3.5%"), Language::En);
    }

    #[test]
    fn test_single_jamo() {
        assert_eq!(detect_language("ㅋ"), Language::Ko);
        assert_eq!(detect_language("\u{1100}"), Language::Ko);
    }

    #[test]
    fn test_cjk_ideographs_are_not_hangul() {
        assert!(!is_hangul('漢'));
        assert!(is_hangul('한'));
    }
}
