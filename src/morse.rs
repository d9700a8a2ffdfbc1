//! Morse transcoder.
//!
//! Converts plaintext over the fixed alphabet (A-Z, 0-9 and space) into
//! Morse tokens and back. Tokens are separated by a single space and the
//! word-space is written as `/`.
//!
//! Neither direction fails: characters outside the alphabet are dropped when
//! encoding, and unknown tokens become [`UNKNOWN_CHAR`] when decoding.
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Token used for the space between words.
pub const WORD_SPACE: &str = "/";

/// Placeholder emitted for every token that does not decode.
pub const UNKNOWN_CHAR: char = '?';

/// Separator between tokens in a Morse string.
const TOKEN_SEPARATOR: &str = " ";

/// Forward table, character to pattern.
const ALPHABET: [(char, &str); 37] = [
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    (' ', WORD_SPACE),
];

// Both directions are derived from `ALPHABET` so they cannot drift apart.
static FORWARD: LazyLock<HashMap<char, &'static str>> =
    LazyLock::new(|| ALPHABET.iter().copied().collect());

static INVERSE: LazyLock<HashMap<&'static str, char>> = LazyLock::new(|| {
    ALPHABET
        .iter()
        .map(|&(symbol, pattern)| (pattern, symbol))
        .collect()
});

/// A single keyed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol
{
    /// Short element, written `.`
    Dot,
    /// Long element, written `-`
    Dash,
}

impl Symbol
{
    /// Returns the character this symbol is written as.
    #[must_use]
    pub const fn as_char(self) -> char
    {
        match self
        {
            Self::Dot => '.',
            Self::Dash => '-',
        }
    }
}

impl fmt::Display for Symbol
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(formatter, "{}", self.as_char())
    }
}

/// Looks up the Morse pattern of a single character.
///
/// The lookup is exact: callers that want case folding should uppercase
/// first, as [`encode`] does.
///
/// # Returns
///
/// The pattern, or `None` if the character is not in the alphabet.
#[must_use]
pub fn pattern_for(symbol: char) -> Option<&'static str>
{
    FORWARD.get(&symbol).copied()
}

/// Looks up the character a single Morse token stands for.
///
/// # Returns
///
/// The character (a space for [`WORD_SPACE`]), or `None` for an unknown
/// token.
#[must_use]
pub fn char_for(token: &str) -> Option<char>
{
    INVERSE.get(token).copied()
}

/// Encodes plaintext into a Morse string.
///
/// The input is uppercased, every character becomes one token, and tokens
/// are joined with a single space. Characters outside the alphabet produce
/// an empty token, so they disappear from the output instead of failing.
///
/// # Arguments
///
/// * `text` - The plaintext to encode
///
/// # Returns
///
/// The Morse string with surrounding whitespace trimmed.
#[must_use]
pub fn encode(text: &str) -> String
{
    let tokens: Vec<&str> = text
        .to_uppercase()
        .chars()
        .map(|symbol| pattern_for(symbol).unwrap_or_default())
        .collect();

    tokens
        .join(TOKEN_SEPARATOR)
        .trim()
        .to_owned()
}

/// Decodes a Morse string into plaintext.
///
/// Surrounding whitespace is ignored and the rest is split on single spaces.
/// Each token yields exactly one character: its letter, a space for `/`, or
/// [`UNKNOWN_CHAR`] when the token is not recognized (an empty token between
/// two adjacent spaces included).
///
/// # Arguments
///
/// * `morse` - The Morse string to decode
///
/// # Returns
///
/// The decoded text. Empty input decodes to an empty string.
#[must_use]
pub fn decode(morse: &str) -> String
{
    let morse = morse.trim();

    if morse.is_empty()
    {
        return String::new();
    }

    morse
        .split(TOKEN_SEPARATOR)
        .map(|token| char_for(token).unwrap_or(UNKNOWN_CHAR))
        .collect()
}
