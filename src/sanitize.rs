//! Text normalization for speech synthesis.
//!
//! The synthesis voice reads text verbatim, so emoji and decorative
//! symbols have to go before a job is submitted. The result keeps
//! letters, digits, whitespace, and basic sentence punctuation only.

/// Normalize `text` for the synthesis voice: strip emoji, drop
/// non-speech symbols, collapse whitespace runs, and trim.
///
/// Idempotent: sanitizing already-sanitized text is a no-op.
pub fn sanitize_for_speech(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if is_emoji(c) || !is_retained(c) {
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
        } else {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        }
    }

    out
}

/// Unicode emoji blocks, variation selectors, and the joiners that
/// glue emoji sequences together.
fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F600..=0x1F64F // emoticons
            | 0x1F300..=0x1F5FF // symbols & pictographs
            | 0x1F680..=0x1F6FF // transport & map
            | 0x1F1E0..=0x1F1FF // regional indicators
            | 0x2600..=0x26FF // misc symbols
            | 0x2700..=0x27BF // dingbats
            | 0xFE00..=0xFE0F // variation selectors
            | 0x1F900..=0x1F9FF // supplemental symbols
            | 0x1FA00..=0x1FA6F // chess symbols
            | 0x1FA70..=0x1FAFF // symbols extended-A
            | 0x200D // zero-width joiner
            | 0x20E3 // combining enclosing keycap
            | 0xE0020..=0xE007F // tag characters
    )
}

/// Characters the voice can actually speak: alphanumerics, whitespace,
/// and basic sentence punctuation including quotes and dashes.
fn is_retained(c: char) -> bool {
    c.is_alphanumeric()
        || c == '_'
        || c.is_whitespace()
        || matches!(
            c,
            '.' | ',' | '!' | '?' | ';' | ':' | '\'' | '"' | '(' | ')' | '-' | '\u{2013}' | '\u{2014}'
        )
}
