//! Free-text normalization.
//!
//! Payload lengths count bytes and scanners assume one byte per character,
//! so every text value is reduced to printable ASCII before it is encoded.
//! Accented Latin letters fold to their base letter; anything else outside
//! `0x20..=0x7E` is rejected.

/// Folds accented Latin letters to ASCII and rejects what remains unprintable.
///
/// Returns the first character that could not be represented.
pub fn to_ascii(input: &str) -> Result<String, char> {
    input
        .chars()
        .map(|c| {
            if is_printable_ascii(c) {
                Ok(c)
            } else {
                fold(c).ok_or(c)
            }
        })
        .collect()
}

/// Checks that `input` is printable ASCII without rewriting it.
pub fn require_ascii(input: &str) -> Result<(), char> {
    match input.chars().find(|c| !is_printable_ascii(*c)) {
        Some(c) => Err(c),
        None => Ok(()),
    }
}

/// Keeps at most `max` characters.
pub fn truncate(input: &str, max: usize) -> &str {
    match input.char_indices().nth(max) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

fn is_printable_ascii(c: char) -> bool {
    matches!(c, ' '..='~')
}

fn fold(c: char) -> Option<char> {
    let folded = match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'Ç' => 'C',
        'ç' => 'c',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ý' => 'Y',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(folded)
}
