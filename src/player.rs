//! Live playback of a composition over a MIDI output port.
//!
//! Scheduling is deliberately simple: all pitched events are flattened to
//! absolute ticks, converted to wall-clock offsets using the project tempo,
//! and sent from a single sleep loop. Per-bar tempo changes affect the
//! rendered file but not live playback.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use midir::{MidiOutput, MidiOutputConnection};

use crate::dsl::ast::{Composition, Tickable};
use crate::midi::{self, instrument};
use crate::tick;

const CLIENT_NAME: &str = "cadenza";

/// All-notes-off controller, sent per channel when playback ends.
const CC_ALL_NOTES_OFF: u8 = 123;

#[derive(Debug)]
pub struct PlayerError(String);

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlayerError {}

pub struct Player {
    connection: MidiOutputConnection,
}

impl Player {
    /// Connect to a MIDI output port, by substring match on its name, or to
    /// the first available port when no name is given.
    pub fn connect(port_name: Option<&str>) -> Result<Self, PlayerError> {
        let output = MidiOutput::new(CLIENT_NAME)
            .map_err(|e| PlayerError(format!("MIDI init failed: {e}")))?;
        let ports = output.ports();
        let port = match port_name {
            Some(name) => ports
                .iter()
                .find(|p| {
                    output
                        .port_name(p)
                        .map(|n| n.contains(name))
                        .unwrap_or(false)
                })
                .ok_or_else(|| PlayerError(format!("no MIDI output port matching \"{name}\"")))?,
            None => ports
                .first()
                .ok_or_else(|| PlayerError("no MIDI output ports available".to_string()))?,
        };
        let connection = output
            .connect(port, CLIENT_NAME)
            .map_err(|e| PlayerError(format!("MIDI connect failed: {e}")))?;
        Ok(Self { connection })
    }

    /// Names of the available MIDI output ports.
    pub fn ports() -> Result<Vec<String>, PlayerError> {
        let output = MidiOutput::new(CLIENT_NAME)
            .map_err(|e| PlayerError(format!("MIDI init failed: {e}")))?;
        Ok(output
            .ports()
            .iter()
            .filter_map(|p| output.port_name(p).ok())
            .collect())
    }

    /// Play the composition to completion. Blocks until the last note has
    /// been released.
    pub fn play(&mut self, composition: &Composition) -> Result<(), PlayerError> {
        let events = schedule(composition);
        let bpm = composition.bpm;
        let started = Instant::now();

        for event in &events {
            let at = Duration::from_micros(ticks_to_micros(event.tick, bpm));
            if let Some(wait) = at.checked_sub(started.elapsed()) {
                thread::sleep(wait);
            }
            self.send(&event.bytes)?;
        }

        for channel in midi::channels(composition) {
            self.send(&[0xB0 | channel, CC_ALL_NOTES_OFF, 0])?;
        }
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), PlayerError> {
        self.connection
            .send(bytes)
            .map_err(|e| PlayerError(format!("MIDI send failed: {e}")))
    }
}

struct ScheduledEvent {
    tick: u32,
    rank: u8,
    bytes: Vec<u8>,
}

/// Flatten every track to raw channel messages at absolute ticks, offs
/// ahead of ons at equal ticks.
fn schedule(composition: &Composition) -> Vec<ScheduledEvent> {
    let plan = midi::channels(composition);
    let mut events = Vec::new();

    for (index, track) in composition.tracks.iter().enumerate() {
        let channel = plan[index];
        let program = instrument::program(&track.instrument).unwrap_or(1);
        events.push(ScheduledEvent {
            tick: 0,
            rank: 1,
            bytes: vec![0xC0 | channel, program - 1],
        });

        for bar in &track.bars {
            let base = bar.offset_ticks();
            for tickable in &bar.tickables {
                let Tickable::Play(event) = tickable else {
                    continue;
                };
                let start = base + event.tick;
                events.push(ScheduledEvent {
                    tick: start,
                    rank: 2,
                    bytes: vec![0x90 | channel, event.pitch, event.velocity],
                });
                events.push(ScheduledEvent {
                    tick: start + event.duration_ticks,
                    rank: 0,
                    bytes: vec![0x80 | channel, event.pitch, 0],
                });
            }
        }
    }

    events.sort_by_key(|e| (e.tick, e.rank));
    events
}

fn ticks_to_micros(ticks: u32, bpm: f64) -> u64 {
    (f64::from(ticks) * 60_000_000.0 / (bpm * tick::TICKS_PER_QUARTER as f64)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::Compiler;

    #[test]
    fn ticks_to_micros_at_120_bpm() {
        // one quarter note at 120 bpm is half a second
        assert_eq!(ticks_to_micros(960, 120.0), 500_000);
        assert_eq!(ticks_to_micros(0, 120.0), 0);
        assert_eq!(ticks_to_micros(480, 60.0), 250_000);
    }

    #[test]
    fn schedule_orders_offs_before_ons() {
        let composition = Compiler::parse(
            r#"project demo {
                track t {
                    bar {
                        on beat 1 play quarter note C4;
                        on beat 2 play quarter note C4;
                    }
                }
            }"#,
        )
        .unwrap();
        let events = schedule(&composition);
        // program change, on, off/on pair, off
        assert_eq!(events.len(), 5);
        assert_eq!(events[2].tick, 960);
        assert_eq!(events[2].bytes[0], 0x80);
        assert_eq!(events[3].tick, 960);
        assert_eq!(events[3].bytes[0], 0x90);
    }

    #[test]
    fn schedule_routes_percussion_to_drum_channel() {
        let composition = Compiler::parse(
            r#"project demo {
                track drums { bar { on beat 1 play quarter percussion acoustic_snare; } }
            }"#,
        )
        .unwrap();
        let events = schedule(&composition);
        assert_eq!(events[1].bytes, vec![0x90 | 9, 38, 64]);
    }
}
