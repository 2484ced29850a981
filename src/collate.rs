//! Defines the [`Collator`] type, which orders human-readable strings (tag
//! names, mostly) according to a locale. A [`Collator`] is an ordinary value
//! that is handed to the code that sorts; nothing here touches process-wide
//! locale state.

use std::cmp::Ordering;

/// The Turkish alphabet plus the Latin letters it borrows, in dictionary
/// order.
const TURKISH_ALPHABET: &str = "abcçdefgğhıijklmnoöpqrsştuüvwxyz";

/// The basic Latin alphabet.
const LATIN_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Rules {
    /// Plain Unicode scalar value order (the `C`/`POSIX` locale).
    Codepoint,

    /// Dictionary order over `letters`, ignoring case at the primary level.
    /// `turkic` selects the dotted/dotless `i` case mapping.
    Alphabet {
        letters: &'static str,
        turkic: bool,
    },
}

/// Compares strings the way a given locale would for display purposes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collator {
    locale: String,
    rules: Rules,
}

impl Collator {
    /// Builds a collator from a POSIX-style locale identifier such as `tr_TR`,
    /// `tr_TR.utf8`, `en_US.UTF-8` or `C`. Only the language part of the
    /// identifier matters: `tr` and `az` get Turkish rules, `C`, `POSIX` and
    /// the empty string get code-point order, and everything else falls back
    /// to case-insensitive Latin order.
    pub fn for_locale(locale: &str) -> Collator {
        let language = locale
            .split(|c: char| c == '.' || c == '@')
            .next()
            .unwrap_or_default()
            .split(|c: char| c == '_' || c == '-')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        let rules = match language.as_str() {
            "" | "c" | "posix" => Rules::Codepoint,
            "tr" | "az" => Rules::Alphabet {
                letters: TURKISH_ALPHABET,
                turkic: true,
            },
            _ => Rules::Alphabet {
                letters: LATIN_ALPHABET,
                turkic: false,
            },
        };

        Collator {
            locale: locale.to_owned(),
            rules,
        }
    }

    /// The identifier this collator was built from.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Compares two strings. Letters are compared by their position in the
    /// alphabet first; only if two strings are equal at that level does case
    /// (lower before upper) and then the raw code points break the tie.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.rules {
            Rules::Codepoint => a.cmp(b),
            Rules::Alphabet { letters, turkic } => {
                weights(a, letters, *turkic)
                    .cmp(weights(b, letters, *turkic))
                    .then_with(|| {
                        a.chars()
                            .map(char::is_uppercase)
                            .cmp(b.chars().map(char::is_uppercase))
                    })
                    .then_with(|| a.cmp(b))
            }
        }
    }

    /// Sorts `items` in place. The sort is stable. Each item's weights are
    /// computed once rather than on every comparison.
    pub fn sort<T: AsRef<str>>(&self, items: &mut [T]) {
        match &self.rules {
            Rules::Codepoint => items.sort_by(|a, b| a.as_ref().cmp(b.as_ref())),
            Rules::Alphabet { letters, turkic } => items.sort_by_cached_key(|item| {
                let s = item.as_ref();
                let primary: Vec<(u8, u32)> = weights(s, letters, *turkic).collect();
                let case: Vec<bool> = s.chars().map(char::is_uppercase).collect();
                (primary, case, s.to_owned())
            }),
        }
    }
}

impl Default for Collator {
    fn default() -> Self {
        Collator::for_locale("C")
    }
}

/// Lower-cases a single character. Turkish maps `I` to dotless `ı` and `İ` to
/// `i`; `to_lowercase` would do neither.
fn fold(c: char, turkic: bool) -> char {
    match (c, turkic) {
        ('I', true) => 'ı',
        ('İ', true) => 'i',
        _ => c.to_lowercase().next().unwrap_or(c),
    }
}

/// The primary weights of `s`, one per character.
fn weights<'a>(s: &'a str, letters: &'a str, turkic: bool) -> impl Iterator<Item = (u8, u32)> + 'a {
    s.chars().map(move |c| weight(letters, fold(c, turkic)))
}

/// The primary weight of an already folded character: a class (punctuation
/// and spaces, digits, alphabet letters, everything else) and a rank within
/// the class.
fn weight(letters: &str, c: char) -> (u8, u32) {
    if let Some(rank) = letters.chars().position(|l| l == c) {
        (2, rank as u32)
    } else if let Some(digit) = c.to_digit(10) {
        (1, digit)
    } else if c.is_alphanumeric() {
        (3, c as u32)
    } else {
        (0, c as u32)
    }
}
