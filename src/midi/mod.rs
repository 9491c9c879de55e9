//! Standard MIDI File rendering.
//!
//! Turns a parsed [`Composition`] into SMF bytes: one MIDI track per
//! composition track, format 1 when there is more than one. The first track
//! doubles as the conductor track and carries the project tempo and time
//! signature; the project copyright and texts go on every track. Later
//! tracks only emit tempo or signature metas where their bars diverge from
//! the project values.

pub mod instrument;

use std::io;

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
};

use crate::dsl::ast::{Composition, Tickable, Track};
use crate::tick;

/// The drum kit channel (zero-based, channel 10 on the wire).
const DRUM_CHANNEL: u8 = 9;

// Sort ranks for events sharing a tick. Offs come first so an immediately
// repeated pitch releases before it re-strikes.
const RANK_NOTE_OFF: u8 = 0;
const RANK_META: u8 = 1;
const RANK_NOTE_ON: u8 = 2;

/// An event at an absolute tick, before delta encoding.
struct Record<'a> {
    tick: u32,
    rank: u8,
    key: u8,
    kind: TrackEventKind<'a>,
}

/// Channel for each track: the track index, except that percussive tracks
/// always get the drum channel and melodic tracks never do, shifting up by
/// one past it (also after wrapping at sixteen channels).
pub fn channels(composition: &Composition) -> Vec<u8> {
    composition
        .tracks
        .iter()
        .enumerate()
        .map(|(index, track)| {
            let program = instrument::program(&track.instrument).unwrap_or(1);
            if track.percussive || instrument::is_percussive(program) {
                DRUM_CHANNEL
            } else {
                let mut channel = index as u8;
                if channel >= DRUM_CHANNEL {
                    channel += 1;
                }
                channel %= 16;
                if channel == DRUM_CHANNEL {
                    channel += 1;
                }
                channel
            }
        })
        .collect()
}

/// Render a composition to Standard MIDI File bytes.
pub fn render(composition: &Composition) -> io::Result<Vec<u8>> {
    let mut tracks = Vec::new();

    if composition.tracks.is_empty() {
        let mut records = conductor_records(composition);
        records.extend(project_text_records(composition));
        tracks.push(finish(records));
    } else {
        let plan = channels(composition);
        for (index, track) in composition.tracks.iter().enumerate() {
            let mut records = Vec::new();
            if index == 0 {
                records.extend(conductor_records(composition));
            }
            records.extend(project_text_records(composition));
            let program = instrument::program(&track.instrument).unwrap_or(1);
            track_records(composition, track, plan[index], program, &mut records);
            tracks.push(finish(records));
        }
    }

    let format = if tracks.len() > 1 {
        Format::Parallel
    } else {
        Format::SingleTrack
    };
    let smf = Smf {
        header: Header {
            format,
            timing: Timing::Metrical((tick::TICKS_PER_QUARTER as u16).into()),
        },
        tracks,
    };

    let mut out = Vec::new();
    smf.write(&mut out).map_err(io::Error::other)?;
    Ok(out)
}

/// Tempo map metas, first track only.
fn conductor_records(composition: &Composition) -> Vec<Record<'_>> {
    vec![
        meta(0, signature_meta(composition.signature)),
        meta(0, tempo_meta(composition.bpm)),
    ]
}

/// Project copyright and texts, repeated on every track.
fn project_text_records(composition: &Composition) -> Vec<Record<'_>> {
    let mut records = Vec::new();
    if let Some(copyright) = &composition.copyright {
        records.push(meta(0, MetaMessage::Copyright(copyright.as_bytes())));
    }
    for text in &composition.texts {
        records.push(meta(0, MetaMessage::Text(text.as_bytes())));
    }
    records
}

fn track_records<'a>(
    composition: &Composition,
    track: &'a Track,
    channel: u8,
    program: u8,
    records: &mut Vec<Record<'a>>,
) {
    records.push(meta(0, MetaMessage::TrackName(track.name.as_bytes())));
    records.push(meta(0, MetaMessage::InstrumentName(track.instrument.as_bytes())));
    for text in &track.texts {
        records.push(meta(0, MetaMessage::Text(text.as_bytes())));
    }
    // GM programs are 1-based, the wire byte is not.
    records.push(Record {
        tick: 0,
        rank: RANK_META,
        key: 0,
        kind: TrackEventKind::Midi {
            channel: channel.into(),
            message: MidiMessage::ProgramChange {
                program: (program - 1).into(),
            },
        },
    });

    // Emit tempo or signature metas only where a bar diverges from the
    // running value, starting from the project values.
    let mut bpm = composition.bpm;
    let mut signature = composition.signature;
    for bar in &track.bars {
        let base = bar.offset_ticks();
        if bar.bpm != bpm {
            records.push(meta(base, tempo_meta(bar.bpm)));
            bpm = bar.bpm;
        }
        if bar.signature != signature {
            records.push(meta(base, signature_meta(bar.signature)));
            signature = bar.signature;
        }

        for tickable in &bar.tickables {
            match tickable {
                Tickable::Play(event) => {
                    let start = base + event.tick;
                    records.push(Record {
                        tick: start,
                        rank: RANK_NOTE_ON,
                        key: event.pitch,
                        kind: TrackEventKind::Midi {
                            channel: channel.into(),
                            message: MidiMessage::NoteOn {
                                key: event.pitch.into(),
                                vel: event.velocity.into(),
                            },
                        },
                    });
                    records.push(Record {
                        tick: start + event.duration_ticks,
                        rank: RANK_NOTE_OFF,
                        key: event.pitch,
                        kind: TrackEventKind::Midi {
                            channel: channel.into(),
                            message: MidiMessage::NoteOff {
                                key: event.pitch.into(),
                                vel: 0.into(),
                            },
                        },
                    });
                }
                Tickable::Text(event) => {
                    records.push(meta(base + event.tick, MetaMessage::Text(event.text.as_bytes())));
                }
                Tickable::Lyric(event) => {
                    records.push(meta(base + event.tick, MetaMessage::Lyric(event.text.as_bytes())));
                }
                Tickable::Marker(event) => {
                    records.push(meta(base + event.tick, MetaMessage::Marker(event.text.as_bytes())));
                }
                Tickable::Cue(event) => {
                    records.push(meta(base + event.tick, MetaMessage::CuePoint(event.text.as_bytes())));
                }
            }
        }
    }
}

fn meta(tick: u32, message: MetaMessage<'_>) -> Record<'_> {
    Record {
        tick,
        rank: RANK_META,
        key: 0,
        kind: TrackEventKind::Meta(message),
    }
}

fn tempo_meta(bpm: f64) -> MetaMessage<'static> {
    MetaMessage::Tempo(((60_000_000.0 / bpm) as u32).into())
}

fn signature_meta(signature: tick::Signature) -> MetaMessage<'static> {
    // denominator stored as a power of two
    MetaMessage::TimeSignature(signature.beats, signature.unit.trailing_zeros() as u8, 24, 8)
}

/// Sort by tick then rank then pitch, delta encode, close the track.
fn finish(mut records: Vec<Record<'_>>) -> Vec<TrackEvent<'_>> {
    records.sort_by_key(|r| (r.tick, r.rank, r.key));

    let mut events = Vec::with_capacity(records.len() + 1);
    let mut prev_tick = 0u32;
    for record in records {
        events.push(TrackEvent {
            delta: (record.tick - prev_tick).into(),
            kind: record.kind,
        });
        prev_tick = record.tick;
    }
    events.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    events
}
