use std::collections::BTreeMap;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Canonical form for names typed on different platforms: compatibility
/// decomposition, combining marks removed, then recomposed. Hangul typed as
/// separate jamo comes out as precomposed syllables.
pub fn normalize(s: &str) -> String {
    s.nfkd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

/// `"+1::skin-tone-3"` becomes `"+1"`.
pub fn remove_skin_tone(name: &str) -> &str {
    name.split("::").next().unwrap_or(name)
}

/// Normalizes every key. Later keys win when two normalize to the same name.
pub fn normalize_keys<V>(map: BTreeMap<String, V>) -> BTreeMap<String, V> {
    map.into_iter().map(|(k, v)| (normalize(&k), v)).collect()
}
