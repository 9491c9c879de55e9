//! Cadenza — a textual music composition notation compiled to Standard
//! MIDI Files.
//!
//! A composition is a `project` of `track`s, each a sequence of `bar`s whose
//! events sit on beats. The front end ([`dsl`]) parses and validates the
//! notation into a tick-addressed tree; the back end ([`midi`]) renders that
//! tree to SMF bytes, and [`player`] performs it live over a MIDI output
//! port. Time is measured in ticks at 960 per quarter note ([`tick`]).

pub mod dsl;
pub mod midi;
pub mod pitch;
pub mod player;
pub mod tick;
