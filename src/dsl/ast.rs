//! The composition tree built by the parser.
//!
//! Built bottom-up during the parse and never mutated afterward; the emitter
//! only reads it. Repeat groups are a parse-time construct and never appear
//! here — they expand into independent [`Bar`] copies before being appended.

use std::fmt;

use crate::tick::{self, Duration, Signature};

/// Default velocity for notes and chords when the source gives none.
pub const DEFAULT_VELOCITY: u8 = 120;

/// A parsed project: the root of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub name: String,
    pub bpm: f64,
    pub signature: Signature,
    pub tracks: Vec<Track>,
    pub texts: Vec<String>,
    pub copyright: Option<String>,
}

/// One instrument line of the project.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    pub instrument: String,
    /// Tempo override; `None` inherits the project tempo.
    pub bpm: Option<f64>,
    /// Signature override; `None` inherits the project signature.
    pub signature: Option<Signature>,
    pub bars: Vec<Bar>,
    pub texts: Vec<String>,
    /// Set when the track plays percussion names; forces the drum channel.
    pub percussive: bool,
}

/// A measure. Its index in the owning track fixes its absolute tick offset
/// (index x ticks-per-bar under this bar's signature).
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub index: u32,
    pub bpm: f64,
    pub signature: Signature,
    pub tickables: Vec<Tickable>,
}

/// Any tick-addressed event inside a bar. Ticks are relative to the bar
/// start; the emitter adds the bar offset.
#[derive(Debug, Clone, PartialEq)]
pub enum Tickable {
    Play(PlayEvent),
    Text(MetaEvent),
    Lyric(MetaEvent),
    Marker(MetaEvent),
    Cue(MetaEvent),
}

impl Tickable {
    /// Bar-relative tick of this event.
    pub fn tick(&self) -> u32 {
        match self {
            Self::Play(event) => event.tick,
            Self::Text(event)
            | Self::Lyric(event)
            | Self::Marker(event)
            | Self::Cue(event) => event.tick,
        }
    }
}

/// A single resolved pitch with its timing. Chords expand into one
/// `PlayEvent` per constituent pitch at the same tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayEvent {
    pub tick: u32,
    pub pitch: u8,
    /// Display name of the pitch, kept for diagnostics and printing.
    pub name: String,
    pub duration: Duration,
    pub duration_ticks: u32,
    pub velocity: u8,
}

/// A textual meta event (text, lyric, marker or cue).
#[derive(Debug, Clone, PartialEq)]
pub struct MetaEvent {
    pub tick: u32,
    pub text: String,
}

impl Bar {
    /// Absolute tick of this bar's first beat.
    pub fn offset_ticks(&self) -> u32 {
        self.index * tick::ticks_per_bar(self.signature)
    }
}

impl Track {
    /// The tempo this track's bars inherit.
    pub fn resolved_bpm(&self, project_bpm: f64) -> f64 {
        self.bpm.unwrap_or(project_bpm)
    }

    /// The signature this track's bars inherit.
    pub fn resolved_signature(&self, project_signature: Signature) -> Signature {
        self.signature.unwrap_or(project_signature)
    }
}

impl fmt::Display for Composition {
    /// Renders the tree back to source-shaped text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "project \"{}\" {{", self.name)?;
        writeln!(f, "\tbpm {:.2};", self.bpm)?;
        writeln!(f, "\ttime {} {};", self.signature.beats, self.signature.unit)?;
        if let Some(copyright) = &self.copyright {
            writeln!(f, "\tcopyright \"{copyright}\";")?;
        }
        for text in &self.texts {
            writeln!(f, "\ttext \"{text}\";")?;
        }
        for track in &self.tracks {
            writeln!(f, "\n\ttrack \"{}\" {{", track.name)?;
            writeln!(f, "\t\tinstrument \"{}\";", track.instrument)?;
            if let Some(bpm) = track.bpm {
                writeln!(f, "\t\tbpm {bpm:.2};")?;
            }
            if let Some(signature) = track.signature {
                writeln!(f, "\t\ttime {} {};", signature.beats, signature.unit)?;
            }
            for bar in &track.bars {
                writeln!(f, "\t\tbar {{")?;
                for tickable in &bar.tickables {
                    write_tickable(f, bar, tickable)?;
                }
                writeln!(f, "\t\t}}")?;
            }
            writeln!(f, "\t}}")?;
        }
        writeln!(f, "}}")
    }
}

fn write_tickable(f: &mut fmt::Formatter<'_>, bar: &Bar, tickable: &Tickable) -> fmt::Result {
    let beat_text = |tick: u32| {
        let beat = tick / tick::TICKS_PER_QUARTER + 1;
        let subdivision = tick::TICKS_PER_QUARTER / u32::from(bar.signature.unit);
        let rest = tick % tick::TICKS_PER_QUARTER;
        if rest == 0 {
            format!("{beat}")
        } else {
            format!("{}", f64::from(beat) + f64::from(rest) / f64::from(subdivision))
        }
    };
    match tickable {
        Tickable::Play(event) => writeln!(
            f,
            "\t\t\ton beat {} play {} note {} velocity {};",
            beat_text(event.tick),
            event.duration,
            event.name,
            event.velocity
        ),
        Tickable::Text(event) => writeln!(
            f,
            "\t\t\ton beat {} text \"{}\";",
            beat_text(event.tick),
            event.text
        ),
        Tickable::Lyric(event) => writeln!(
            f,
            "\t\t\ton beat {} lyric \"{}\";",
            beat_text(event.tick),
            event.text
        ),
        Tickable::Marker(event) => writeln!(
            f,
            "\t\t\ton beat {} marker \"{}\";",
            beat_text(event.tick),
            event.text
        ),
        Tickable::Cue(event) => writeln!(
            f,
            "\t\t\ton beat {} cue \"{}\";",
            beat_text(event.tick),
            event.text
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter_c4(tick: u32) -> Tickable {
        Tickable::Play(PlayEvent {
            tick,
            pitch: 60,
            name: "C4".to_string(),
            duration: Duration::Quarter,
            duration_ticks: 960,
            velocity: DEFAULT_VELOCITY,
        })
    }

    #[test]
    fn tick_accessor_covers_all_variants() {
        let meta = MetaEvent {
            tick: 480,
            text: "x".to_string(),
        };
        assert_eq!(quarter_c4(960).tick(), 960);
        assert_eq!(Tickable::Text(meta.clone()).tick(), 480);
        assert_eq!(Tickable::Lyric(meta.clone()).tick(), 480);
        assert_eq!(Tickable::Marker(meta.clone()).tick(), 480);
        assert_eq!(Tickable::Cue(meta).tick(), 480);
    }

    #[test]
    fn bar_offset_scales_with_index_and_signature() {
        let bar = Bar {
            index: 2,
            bpm: 120.0,
            signature: Signature::new(3, 4).unwrap(),
            tickables: vec![],
        };
        assert_eq!(bar.offset_ticks(), 2 * 3 * 960);
    }

    #[test]
    fn track_resolution_prefers_overrides() {
        let track = Track {
            name: "t".to_string(),
            instrument: "acoustic grand piano".to_string(),
            bpm: Some(90.0),
            signature: Some(Signature::new(6, 8).unwrap()),
            bars: vec![],
            texts: vec![],
            percussive: false,
        };
        assert_eq!(track.resolved_bpm(120.0), 90.0);
        assert_eq!(
            track.resolved_signature(Signature::common()),
            Signature::new(6, 8).unwrap()
        );
    }

    #[test]
    fn display_round_trips_shape() {
        let composition = Composition {
            name: "demo".to_string(),
            bpm: 120.0,
            signature: Signature::common(),
            tracks: vec![Track {
                name: "piano".to_string(),
                instrument: "acoustic grand piano".to_string(),
                bpm: None,
                signature: None,
                bars: vec![Bar {
                    index: 0,
                    bpm: 120.0,
                    signature: Signature::common(),
                    tickables: vec![quarter_c4(0)],
                }],
                texts: vec![],
                percussive: false,
            }],
            texts: vec![],
            copyright: None,
        };
        let rendered = composition.to_string();
        assert!(rendered.contains("project \"demo\""));
        assert!(rendered.contains("bpm 120.00;"));
        assert!(rendered.contains("on beat 1 play quarter note C4"));
    }
}
