//! Recursive-descent parser for the composition notation.
//!
//! Single-token lookahead over the scanner, with whitespace and comments
//! filtered here rather than in the scanner. Builds a validated
//! [`Composition`]: beat ranges, duration codes, instrument/pitch names and
//! same-pitch overlaps are all checked during the parse, and the first error
//! aborts the whole thing.

use std::collections::HashMap;

use crate::midi::instrument;
use crate::pitch;
use crate::tick::{self, Duration, Signature};

use super::ast::{
    Bar, Composition, MetaEvent, PlayEvent, Tickable, Track, DEFAULT_VELOCITY,
};
use super::error::ParseError;
use super::lexer::Scanner;
use super::token::{Token, TokenKind};

/// Instrument assumed when a track declares none.
const DEFAULT_INSTRUMENT: &str = "acoustic grand piano";

/// A pitch currently sounding, used for overlap detection. Tracked per
/// track and keyed by MIDI pitch; reset when a new track begins.
struct ActivePitch {
    name: String,
    start: u32,
    end: u32,
}

pub struct Parser {
    scanner: Scanner,
    pushback: Option<Token>,
    active: HashMap<u8, ActivePitch>,
    track_percussive: bool,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self {
            scanner: Scanner::new(source),
            pushback: None,
            active: HashMap::new(),
            track_percussive: false,
        }
    }

    /// Parse a complete composition. Consumes the parser.
    pub fn parse(mut self) -> Result<Composition, ParseError> {
        self.parse_project()
    }

    // --- token plumbing ---

    fn scan(&mut self) -> Token {
        self.pushback.take().unwrap_or_else(|| self.scanner.scan())
    }

    fn unscan(&mut self, token: Token) {
        self.pushback = Some(token);
    }

    /// Next non-trivia token. Illegal characters are a hard error here,
    /// never skipped.
    fn next(&mut self) -> Result<Token, ParseError> {
        loop {
            let token = self.scan();
            if token.kind.is_trivia() {
                continue;
            }
            if token.kind == TokenKind::Illegal {
                let message = if token.literal.starts_with('"') || token.literal.starts_with('\'') {
                    "unterminated string".to_string()
                } else {
                    format!("illegal character '{}'", token.literal)
                };
                return Err(ParseError::lex(message, token.line, token.col));
            }
            return Ok(token);
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        let token = self.next()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(unexpected(&token, expected))
        }
    }

    /// A name is either a bare identifier or a quoted string.
    fn expect_name(&mut self, expected: &str) -> Result<Token, ParseError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Identifier | TokenKind::Str => Ok(token),
            _ => Err(unexpected(&token, expected)),
        }
    }

    // --- grammar productions ---

    fn parse_project(&mut self) -> Result<Composition, ParseError> {
        self.expect(TokenKind::Project, "project")?;
        let name = self.expect_name("project name")?;

        let mut composition = Composition {
            name: name.literal,
            bpm: 120.0,
            signature: Signature::common(),
            tracks: Vec::new(),
            texts: Vec::new(),
            copyright: None,
        };

        self.expect(TokenKind::BraceOpen, "'{'")?;
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::BraceClose => break,
                TokenKind::Bpm => composition.bpm = self.parse_bpm()?,
                TokenKind::Time => composition.signature = self.parse_time_signature()?,
                TokenKind::Track => {
                    let track = self.parse_track(composition.bpm, composition.signature)?;
                    composition.tracks.push(track);
                }
                TokenKind::Copyright => {
                    composition.copyright = Some(self.parse_string_statement()?);
                }
                TokenKind::Text => composition.texts.push(self.parse_string_statement()?),
                _ => return Err(unexpected(&token, "bpm, time, track, copyright or '}'")),
            }
        }

        let token = self.next()?;
        if token.kind != TokenKind::Eof {
            return Err(unexpected(&token, "end of input"));
        }
        Ok(composition)
    }

    fn parse_bpm(&mut self) -> Result<f64, ParseError> {
        let token = self.next()?;
        let bpm = match token.kind {
            TokenKind::Number | TokenKind::Float => token
                .literal
                .parse::<f64>()
                .map_err(|_| unexpected(&token, "number"))?,
            _ => return Err(unexpected(&token, "number")),
        };
        if bpm <= 0.0 {
            return Err(ParseError::semantic(
                format!("bpm must be positive, got {bpm}"),
                token.line,
                token.col,
            ));
        }
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(bpm)
    }

    fn parse_time_signature(&mut self) -> Result<Signature, ParseError> {
        let beats_token = self.expect(TokenKind::Number, "number")?;
        let beats: u8 = beats_token
            .literal
            .parse()
            .map_err(|_| unexpected(&beats_token, "number"))?;
        let unit_token = self.expect(TokenKind::Number, "number")?;
        let unit: u8 = unit_token
            .literal
            .parse()
            .map_err(|_| unexpected(&unit_token, "number"))?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Signature::new(beats, unit).ok_or_else(|| {
            ParseError::semantic(
                format!("invalid time signature {beats}/{unit}"),
                beats_token.line,
                beats_token.col,
            )
        })
    }

    /// `text "..."` and friends: one string followed by a semicolon.
    fn parse_string_statement(&mut self) -> Result<String, ParseError> {
        let token = self.expect_name("string")?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(token.literal)
    }

    fn parse_track(
        &mut self,
        project_bpm: f64,
        project_signature: Signature,
    ) -> Result<Track, ParseError> {
        // Overlap tracking is per track.
        self.active.clear();
        self.track_percussive = false;

        let name = self.expect_name("track name")?;
        let mut track = Track {
            name: name.literal,
            instrument: String::new(),
            bpm: None,
            signature: None,
            bars: Vec::new(),
            texts: Vec::new(),
            percussive: false,
        };

        self.expect(TokenKind::BraceOpen, "'{'")?;
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::BraceClose => break,
                TokenKind::Bpm => track.bpm = Some(self.parse_bpm()?),
                TokenKind::Time => track.signature = Some(self.parse_time_signature()?),
                TokenKind::Instrument => track.instrument = self.parse_instrument()?,
                TokenKind::Text => track.texts.push(self.parse_string_statement()?),
                TokenKind::Bar => {
                    let bar = self.parse_bar(
                        track.resolved_bpm(project_bpm),
                        track.resolved_signature(project_signature),
                    )?;
                    self.append_bar(&mut track, bar, token.line, token.col)?;
                }
                TokenKind::Repeat => {
                    let bars = self.parse_repeat(
                        track.resolved_bpm(project_bpm),
                        track.resolved_signature(project_signature),
                    )?;
                    for bar in bars {
                        self.append_bar(&mut track, bar, token.line, token.col)?;
                    }
                }
                _ => {
                    return Err(unexpected(
                        &token,
                        "bpm, time, instrument, bar, repeat or '}'",
                    ))
                }
            }
        }

        if track.instrument.is_empty() {
            track.instrument = DEFAULT_INSTRUMENT.to_string();
        }
        track.percussive = self.track_percussive;
        Ok(track)
    }

    fn parse_instrument(&mut self) -> Result<String, ParseError> {
        let token = self.expect_name("instrument name")?;
        self.expect(TokenKind::Semicolon, "';'")?;
        if instrument::program(&token.literal).is_none() {
            return Err(ParseError::semantic(
                format!("unknown instrument \"{}\"", token.literal),
                token.line,
                token.col,
            ));
        }
        Ok(token.literal)
    }

    /// `repeat N times (bar | { bar* repeat* })`. Returns the expanded,
    /// index-less bar copies; the repeat group itself never survives.
    fn parse_repeat(&mut self, bpm: f64, signature: Signature) -> Result<Vec<Bar>, ParseError> {
        let count_token = self.expect(TokenKind::Number, "repeat count")?;
        let count: u32 = count_token
            .literal
            .parse()
            .map_err(|_| unexpected(&count_token, "repeat count"))?;
        if count == 0 {
            return Err(ParseError::semantic(
                "repeat count must be at least 1",
                count_token.line,
                count_token.col,
            ));
        }
        self.expect(TokenKind::Times, "times")?;

        let token = self.next()?;
        let body = match token.kind {
            TokenKind::Bar => vec![self.parse_bar(bpm, signature)?],
            TokenKind::BraceOpen => {
                let mut bars = Vec::new();
                loop {
                    let token = self.next()?;
                    match token.kind {
                        TokenKind::BraceClose => break,
                        TokenKind::Bar => bars.push(self.parse_bar(bpm, signature)?),
                        TokenKind::Repeat => bars.extend(self.parse_repeat(bpm, signature)?),
                        _ => return Err(unexpected(&token, "bar, repeat or '}'")),
                    }
                }
                bars
            }
            _ => return Err(unexpected(&token, "bar or '{'")),
        };

        let mut expanded = Vec::with_capacity(body.len() * count as usize);
        for _ in 0..count {
            expanded.extend(body.iter().cloned());
        }
        Ok(expanded)
    }

    fn parse_bar(&mut self, bpm: f64, signature: Signature) -> Result<Bar, ParseError> {
        let mut bar = Bar {
            index: 0, // assigned when the bar is appended to its track
            bpm,
            signature,
            tickables: Vec::new(),
        };

        self.expect(TokenKind::BraceOpen, "'{'")?;
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::BraceClose => break,
                TokenKind::Bpm => bar.bpm = self.parse_bpm()?,
                TokenKind::Time => bar.signature = self.parse_time_signature()?,
                TokenKind::On => self.parse_on(&mut bar)?,
                _ => return Err(unexpected(&token, "bpm, time, on or '}'")),
            }
        }
        Ok(bar)
    }

    fn parse_on(&mut self, bar: &mut Bar) -> Result<(), ParseError> {
        self.expect(TokenKind::Beat, "beat")?;

        let token = self.next()?;
        let (beat, fraction) = match token.kind {
            TokenKind::Number => {
                let beat: u8 = token
                    .literal
                    .parse()
                    .map_err(|_| unexpected(&token, "beat position"))?;
                (beat, 0.0)
            }
            TokenKind::Float => {
                let value: f64 = token
                    .literal
                    .parse()
                    .map_err(|_| unexpected(&token, "beat position"))?;
                (value.trunc() as u8, value.fract())
            }
            _ => return Err(unexpected(&token, "beat position")),
        };
        if beat == 0 || beat > bar.signature.beats {
            return Err(ParseError::semantic(
                format!("no such beat: {}", token.literal),
                token.line,
                token.col,
            ));
        }
        let event_tick = tick::ticks_for_beat(bar.signature, beat, fraction);

        let token = self.next()?;
        match token.kind {
            TokenKind::Play => self.parse_play(bar, event_tick),
            TokenKind::Text => {
                let text = self.parse_string_statement()?;
                bar.tickables.push(Tickable::Text(MetaEvent {
                    tick: event_tick,
                    text,
                }));
                Ok(())
            }
            TokenKind::Lyric => {
                let text = self.parse_string_statement()?;
                bar.tickables.push(Tickable::Lyric(MetaEvent {
                    tick: event_tick,
                    text,
                }));
                Ok(())
            }
            TokenKind::Marker => {
                let text = self.parse_string_statement()?;
                bar.tickables.push(Tickable::Marker(MetaEvent {
                    tick: event_tick,
                    text,
                }));
                Ok(())
            }
            TokenKind::Cue => {
                let text = self.parse_string_statement()?;
                bar.tickables.push(Tickable::Cue(MetaEvent {
                    tick: event_tick,
                    text,
                }));
                Ok(())
            }
            _ => Err(unexpected(&token, "play, text, lyric, marker or cue")),
        }
    }

    fn parse_play(&mut self, bar: &mut Bar, event_tick: u32) -> Result<(), ParseError> {
        let duration = self.parse_duration(bar.signature)?;
        let duration_ticks = tick::ticks_for_duration(bar.signature, duration);

        let mut parsed_any = false;
        loop {
            let token = self.next()?;
            // (pitch, display name, default velocity) per resolved key
            let resolved: Vec<(u8, String)> = match token.kind {
                TokenKind::Semicolon => {
                    if !parsed_any {
                        return Err(unexpected(&token, "note, chord or percussion"));
                    }
                    break;
                }
                TokenKind::Note => {
                    let name = self.expect_name("note name")?;
                    let pitch = pitch::parse_note(&name.literal).ok_or_else(|| {
                        ParseError::semantic(
                            format!("unknown note \"{}\"", name.literal),
                            name.line,
                            name.col,
                        )
                    })?;
                    vec![(pitch, name.literal)]
                }
                TokenKind::Chord => {
                    let name = self.expect_name("chord name")?;
                    let pitches = pitch::parse_chord(&name.literal).ok_or_else(|| {
                        ParseError::semantic(
                            format!("unknown chord \"{}\"", name.literal),
                            name.line,
                            name.col,
                        )
                    })?;
                    pitches
                        .into_iter()
                        .map(|p| (p, pitch::note_name(p)))
                        .collect()
                }
                TokenKind::Percussion => {
                    let name = self.expect_name("percussion name")?;
                    let key = pitch::percussion_key(&name.literal).ok_or_else(|| {
                        ParseError::semantic(
                            format!("unknown percussion \"{}\"", name.literal),
                            name.line,
                            name.col,
                        )
                    })?;
                    self.track_percussive = true;
                    vec![(key, name.literal)]
                }
                _ => return Err(unexpected(&token, "note, chord, percussion or ';'")),
            };

            let default_velocity = if token.kind == TokenKind::Percussion {
                pitch::DEFAULT_KEY_VELOCITY
            } else {
                DEFAULT_VELOCITY
            };
            let velocity = self.parse_velocity(default_velocity)?;

            for (p, name) in resolved {
                bar.tickables.push(Tickable::Play(PlayEvent {
                    tick: event_tick,
                    pitch: p,
                    name,
                    duration,
                    duration_ticks,
                    velocity,
                }));
            }
            parsed_any = true;
        }
        Ok(())
    }

    fn parse_duration(&mut self, _signature: Signature) -> Result<Duration, ParseError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Whole => Ok(Duration::Whole),
            TokenKind::Half => Ok(Duration::Half),
            TokenKind::Quarter => Ok(Duration::Quarter),
            TokenKind::Number => {
                let value: u16 = token
                    .literal
                    .parse()
                    .map_err(|_| unexpected(&token, "duration"))?;
                // 32nd takes the ND suffix, the others TH.
                match value {
                    8 | 16 | 64 | 128 => {
                        self.expect(TokenKind::Th, "th")?;
                    }
                    32 => {
                        self.expect(TokenKind::Nd, "nd")?;
                    }
                    _ => {
                        return Err(ParseError::semantic(
                            format!("unsupported duration: {value}"),
                            token.line,
                            token.col,
                        ))
                    }
                }
                Duration::from_code(value).ok_or_else(|| {
                    ParseError::semantic(
                        format!("unsupported duration: {value}"),
                        token.line,
                        token.col,
                    )
                })
            }
            _ => Err(unexpected(&token, "duration")),
        }
    }

    /// Optional trailing `velocity N` after an event.
    fn parse_velocity(&mut self, default: u8) -> Result<u8, ParseError> {
        let token = self.next()?;
        if token.kind != TokenKind::Velocity {
            self.unscan(token);
            return Ok(default);
        }
        let value_token = self.expect(TokenKind::Number, "number")?;
        let velocity: u8 = value_token
            .literal
            .parse()
            .map_err(|_| unexpected(&value_token, "number"))?;
        if velocity > 127 {
            return Err(ParseError::semantic(
                format!("velocity out of range: {velocity}"),
                value_token.line,
                value_token.col,
            ));
        }
        Ok(velocity)
    }

    /// Assign the bar its index, then check every pitched event against the
    /// track's active-pitch map using absolute ticks. Expanded repeat copies
    /// go through here one at a time, so each copy is checked at its own
    /// bar offset.
    fn append_bar(
        &mut self,
        track: &mut Track,
        mut bar: Bar,
        line: usize,
        col: usize,
    ) -> Result<(), ParseError> {
        bar.index = track.bars.len() as u32;
        let base = bar.offset_ticks();

        for tickable in &bar.tickables {
            let Tickable::Play(event) = tickable else {
                continue;
            };
            let start = base + event.tick;
            let end = start + event.duration_ticks;
            if let Some(active) = self.active.get(&event.pitch) {
                if active.end > start {
                    return Err(ParseError::overlap(
                        format!(
                            "pitch overlap: {} (tick {}) / {} (tick {})",
                            active.name, active.start, event.name, start
                        ),
                        line,
                        col,
                    ));
                }
            }
            self.active.insert(
                event.pitch,
                ActivePitch {
                    name: event.name.clone(),
                    start,
                    end,
                },
            );
        }

        track.bars.push(bar);
        Ok(())
    }
}

fn unexpected(token: &Token, expected: &str) -> ParseError {
    let found = if token.kind == TokenKind::Eof {
        "end of input".to_string()
    } else {
        format!("\"{}\"", token.literal)
    };
    ParseError::syntax(
        format!("found {found}, expected {expected}"),
        token.line,
        token.col,
    )
}
