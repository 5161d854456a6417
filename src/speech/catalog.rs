//! Prebuilt voices and supported languages for speech generation.

/// Prebuilt voice names with their character.
pub const VOICES: [(&str, &str); 30] = [
    ("Zephyr", "Bright"),
    ("Puck", "Upbeat"),
    ("Charon", "Informative"),
    ("Kore", "Firm"),
    ("Fenrir", "Excitable"),
    ("Leda", "Youthful"),
    ("Orus", "Firm"),
    ("Aoede", "Breezy"),
    ("Callirrhoe", "Easy-going"),
    ("Autonoe", "Bright"),
    ("Enceladus", "Breathy"),
    ("Iapetus", "Clear"),
    ("Umbriel", "Easy-going"),
    ("Algieba", "Smooth"),
    ("Despina", "Smooth"),
    ("Erinome", "Clear"),
    ("Algenib", "Gravelly"),
    ("Rasalgethi", "Informative"),
    ("Laomedeia", "Upbeat"),
    ("Achernar", "Soft"),
    ("Alnilam", "Firm"),
    ("Schedar", "Even"),
    ("Gacrux", "Mature"),
    ("Pulcherrima", "Forward"),
    ("Achird", "Friendly"),
    ("Zubenelgenubi", "Casual"),
    ("Vindemiatrix", "Gentle"),
    ("Sadachbia", "Lively"),
    ("Sadaltager", "Knowledgeable"),
    ("Sulafat", "Warm"),
];

/// Language names with their BCP-47 codes.
pub const LANGUAGES: [(&str, &str); 24] = [
    ("Arabic (Egyptian)", "ar-EG"),
    ("German (Germany)", "de-DE"),
    ("English (US)", "en-US"),
    ("Spanish (US)", "es-US"),
    ("French (France)", "fr-FR"),
    ("Hindi (India)", "hi-IN"),
    ("Indonesian (Indonesia)", "id-ID"),
    ("Italian (Italy)", "it-IT"),
    ("Japanese (Japan)", "ja-JP"),
    ("Korean (Korea)", "ko-KR"),
    ("Portuguese (Brazil)", "pt-BR"),
    ("Russian (Russia)", "ru-RU"),
    ("Dutch (Netherlands)", "nl-NL"),
    ("Polish (Poland)", "pl-PL"),
    ("Thai (Thailand)", "th-TH"),
    ("Turkish (Turkey)", "tr-TR"),
    ("Vietnamese (Vietnam)", "vi-VN"),
    ("Romanian (Romania)", "ro-RO"),
    ("Ukrainian (Ukraine)", "uk-UA"),
    ("Bengali (Bangladesh)", "bn-BD"),
    ("English (India)", "en-IN"),
    ("Marathi (India)", "mr-IN"),
    ("Tamil (India)", "ta-IN"),
    ("Telugu (India)", "te-IN"),
];

pub fn is_voice(name: &str) -> bool {
    VOICES.iter().any(|(voice, _)| *voice == name)
}

pub fn is_language_code(code: &str) -> bool {
    LANGUAGES.iter().any(|(_, c)| *c == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups() {
        assert!(is_voice("Kore"));
        assert!(is_voice("Sulafat"));
        assert!(!is_voice("kore"));
        assert!(is_language_code("en-US"));
        assert!(is_language_code("te-IN"));
        assert!(!is_language_code("English (US)"));
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = VOICES.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), VOICES.len());

        let mut codes: Vec<_> = LANGUAGES.iter().map(|(_, c)| *c).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), LANGUAGES.len());
    }
}
