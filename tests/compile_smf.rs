//! End-to-end tests: source text through the parser and SMF renderer.

use std::fs;

use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use cadenza::dsl::{Compiler, ErrorKind};
use cadenza::midi;

fn compile(source: &str) -> Vec<u8> {
    let composition = Compiler::parse(source).expect("parse failed");
    midi::render(&composition).expect("render failed")
}

/// Absolute-tick view of one SMF track.
fn absolute<'a>(track: &[midly::TrackEvent<'a>]) -> Vec<(u32, TrackEventKind<'a>)> {
    let mut tick = 0u32;
    track
        .iter()
        .map(|e| {
            tick += e.delta.as_int();
            (tick, e.kind)
        })
        .collect()
}

#[test]
fn quarter_note_produces_960_tick_pair() {
    let bytes = compile(
        r#"project demo {
            track piano {
                instrument "acoustic grand piano";
                bar { on beat 1 play quarter note C4; }
            }
        }"#,
    );
    assert_eq!(&bytes[..4], b"MThd");

    let smf = Smf::parse(&bytes).unwrap();
    assert_eq!(smf.header.timing, Timing::Metrical(960.into()));

    let events = absolute(&smf.tracks[0]);
    let on = events
        .iter()
        .find(|(_, kind)| matches!(kind, TrackEventKind::Midi { message: MidiMessage::NoteOn { .. }, .. }))
        .unwrap();
    let off = events
        .iter()
        .find(|(_, kind)| matches!(kind, TrackEventKind::Midi { message: MidiMessage::NoteOff { .. }, .. }))
        .unwrap();
    assert_eq!(on.0, 0);
    assert_eq!(off.0, 960);
    assert!(events.iter().any(|(t, kind)| {
        *t == 0 && matches!(kind, TrackEventKind::Meta(MetaMessage::Tempo(v)) if v.as_int() == 500_000)
    }));
}

#[test]
fn repeated_bars_shift_by_bar_length() {
    let bytes = compile(
        r#"project demo {
            track t { repeat 3 times bar { on beat 1 play quarter note C4; } }
        }"#,
    );
    let smf = Smf::parse(&bytes).unwrap();
    let onsets: Vec<u32> = absolute(&smf.tracks[0])
        .into_iter()
        .filter(|(_, kind)| {
            matches!(
                kind,
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { .. },
                    ..
                }
            )
        })
        .map(|(t, _)| t)
        .collect();
    assert_eq!(onsets, vec![0, 3840, 7680]);
}

#[test]
fn overlapping_same_pitch_is_rejected() {
    let err = Compiler::parse(
        r#"project demo {
            track t {
                bar {
                    on beat 1 play half note C4;
                    on beat 2 play quarter note C4;
                }
            }
        }"#,
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Overlap);
}

#[test]
fn beat_outside_signature_is_rejected() {
    let err = Compiler::parse(
        r#"project demo {
            time 3 4;
            track t { bar { on beat 4 play quarter note C4; } }
        }"#,
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert!(err.to_string().contains("no such beat"));
}

#[test]
fn instruments_map_to_programs_and_channels() {
    let bytes = compile(
        r#"project demo {
            track lead {
                instrument "distortion guitar";
                bar { on beat 1 play quarter note E4; }
            }
            track drums {
                bar { on beat 1 play quarter percussion acoustic_bass_drum; }
            }
        }"#,
    );
    let smf = Smf::parse(&bytes).unwrap();
    assert_eq!(smf.header.format, Format::Parallel);

    let first_midi = |track: &[midly::TrackEvent<'_>]| {
        track
            .iter()
            .find_map(|e| match e.kind {
                TrackEventKind::Midi { channel, message } => Some((channel.as_int(), message)),
                _ => None,
            })
            .unwrap()
    };
    let (channel, message) = first_midi(&smf.tracks[0]);
    assert_eq!(channel, 0);
    // "distortion guitar" is GM program 31, 30 on the wire
    assert!(matches!(message, MidiMessage::ProgramChange { program } if program.as_int() == 30));

    let (channel, _) = first_midi(&smf.tracks[1]);
    assert_eq!(channel, 9);
}

#[test]
fn compiled_file_round_trips_through_disk() {
    let bytes = compile(
        r#"project demo {
            copyright "2024";
            track t { bar { on beat 1 play whole chord Cmaj7; } }
        }"#,
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.mid");
    fs::write(&path, &bytes).unwrap();

    let read_back = fs::read(&path).unwrap();
    assert_eq!(read_back, bytes);
    let smf = Smf::parse(&read_back).unwrap();
    assert!(smf.tracks[0].iter().any(|e| matches!(
        e.kind,
        TrackEventKind::Meta(MetaMessage::Copyright(b"2024"))
    )));
}

#[test]
fn compilation_is_deterministic() {
    let source = r#"project demo {
        bpm 128;
        track a { bar { on beat 1 play quarter chord Am; on beat 3 play half note E4; } }
        track b { bar { on beat 2 play 8th note G3; } }
    }"#;
    assert_eq!(compile(source), compile(source));
}

#[test]
fn pretty_printed_source_reparses_to_same_tree() {
    let source = r#"project demo {
        bpm 96;
        time 3 4;
        track lead {
            instrument "violin";
            bar {
                on beat 1 play quarter note C4;
                on beat 2.5 play 8th note E5 velocity 70;
            }
        }
    }"#;
    let first = Compiler::parse(source).unwrap();
    let second = Compiler::parse(&first.to_string()).unwrap();
    assert_eq!(first, second);
}
