//! Token types for the composition notation lexer.

/// A token produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: usize,
    pub col: usize,
}

/// The kind of token.
///
/// Whitespace and comments are real tokens: the scanner never drops input,
/// the parser decides what to filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Illegal,
    Eof,
    Whitespace,
    Comment,

    Identifier,
    Number,
    Float,
    Str,
    Semicolon,
    BraceOpen,
    BraceClose,

    // Keywords
    Project,
    Track,
    Bar,
    Beat,
    On,
    Play,
    Bpm,
    Time,
    Instrument,
    Copyright,
    Text,
    Lyric,
    Marker,
    Cue,
    Note,
    Chord,
    Percussion,
    Velocity,
    Whole,
    Half,
    Quarter,
    Th,
    Nd,
    Repeat,
    Times,
}

impl TokenKind {
    /// Match an identifier against the keyword table, case-insensitively.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident.to_ascii_uppercase().as_str() {
            "PROJECT" => Self::Project,
            "TRACK" => Self::Track,
            "BAR" => Self::Bar,
            "BEAT" => Self::Beat,
            "ON" => Self::On,
            "PLAY" => Self::Play,
            "BPM" => Self::Bpm,
            "TIME" => Self::Time,
            "INSTRUMENT" => Self::Instrument,
            "COPYRIGHT" => Self::Copyright,
            "TEXT" => Self::Text,
            "LYRIC" => Self::Lyric,
            "MARKER" => Self::Marker,
            "CUE" => Self::Cue,
            "NOTE" => Self::Note,
            "CHORD" => Self::Chord,
            "PERCUSSION" => Self::Percussion,
            "VELOCITY" => Self::Velocity,
            "WHOLE" => Self::Whole,
            "HALF" => Self::Half,
            "QUARTER" => Self::Quarter,
            "TH" => Self::Th,
            "ND" => Self::Nd,
            "REPEAT" => Self::Repeat,
            "TIMES" => Self::Times,
            _ => return None,
        };
        Some(kind)
    }

    /// True for tokens the parser filters out between meaningful tokens.
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment)
    }
}
