//! Name resolution for pitched material — note names, chord names, and the
//! General MIDI percussion key map.
//!
//! Note format: `<letter><optional accidental><optional octave><optional ^...>`
//! - Letter: C, D, E, F, G, A, B (case-insensitive)
//! - Accidental: `#` (sharp) or `b` (flat)
//! - Octave: -1 to 9 written as digits; defaults to 4 (C4 = middle C = 60)
//! - Each trailing `^` raises the result by one octave
//!
//! Chord roots use the same letters but never carry an octave (digits after
//! the root belong to the quality, as in "C7"); chords voice at octave 4.

/// Default velocity applied to percussion keys when the source gives none.
pub const DEFAULT_KEY_VELOCITY: u8 = 64;

/// Parse a note name into a MIDI key number (0-127).
pub fn parse_note(name: &str) -> Option<u8> {
    let chars: Vec<char> = name.chars().collect();
    if chars.is_empty() {
        return None;
    }

    let base = letter_semitone(chars[0])?;

    let mut i = 1;
    let accidental: i32 = if i < chars.len() && chars[i] == '#' {
        i += 1;
        1
    } else if i < chars.len() && chars[i] == 'b' {
        i += 1;
        -1
    } else {
        0
    };

    let mut octave: i32 = 4;
    let digits_start = i;
    if i < chars.len() && chars[i] == '-' && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
        i += 1;
    }
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i > digits_start {
        let digits: String = chars[digits_start..i].iter().collect();
        octave = digits.parse().ok()?;
    }

    let mut raises = 0;
    while i < chars.len() && chars[i] == '^' {
        raises += 1;
        i += 1;
    }
    if i != chars.len() {
        return None;
    }

    // C-1 = 0, C4 = 60, A4 = 69
    let midi = (octave + 1 + raises) * 12 + base + accidental;
    if (0..=127).contains(&midi) {
        Some(midi as u8)
    } else {
        None
    }
}

/// Parse a chord name into its MIDI key numbers, lowest first.
pub fn parse_chord(name: &str) -> Option<Vec<u8>> {
    let chars: Vec<char> = name.chars().collect();
    if chars.is_empty() {
        return None;
    }

    let base = letter_semitone(chars[0])?;
    let mut i = 1;
    let accidental: i32 = if i < chars.len() && chars[i] == '#' {
        i += 1;
        1
    } else if i < chars.len() && chars[i] == 'b' {
        i += 1;
        -1
    } else {
        0
    };

    let quality: String = chars[i..].iter().collect();
    let intervals = quality_intervals(&quality)?;

    let root = 5 * 12 + base + accidental; // octave 4
    let mut keys = Vec::with_capacity(intervals.len());
    for interval in intervals {
        let key = root + i32::from(*interval);
        if !(0..=127).contains(&key) {
            return None;
        }
        keys.push(key as u8);
    }
    Some(keys)
}

/// Look up a percussion name in the General MIDI key map (case-insensitive).
pub fn percussion_key(name: &str) -> Option<u8> {
    let lowered = name.to_ascii_lowercase();
    PERCUSSION_KEYS
        .iter()
        .find(|(entry, _)| *entry == lowered)
        .map(|(_, key)| *key)
}

/// Render a MIDI key number as a note name, preferring sharps ("C4", "F#3").
pub fn note_name(key: u8) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    let octave = i32::from(key) / 12 - 1;
    format!("{}{}", NAMES[usize::from(key) % 12], octave)
}

fn letter_semitone(letter: char) -> Option<i32> {
    match letter.to_ascii_uppercase() {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

fn quality_intervals(quality: &str) -> Option<&'static [u8]> {
    let intervals: &'static [u8] = match quality {
        "" | "maj" => &[0, 4, 7],
        "m" | "min" => &[0, 3, 7],
        "dim" => &[0, 3, 6],
        "aug" => &[0, 4, 8],
        "5" => &[0, 7],
        "6" => &[0, 4, 7, 9],
        "m6" => &[0, 3, 7, 9],
        "7" => &[0, 4, 7, 10],
        "maj7" | "M7" => &[0, 4, 7, 11],
        "m7" | "min7" => &[0, 3, 7, 10],
        "dim7" => &[0, 3, 6, 9],
        "m7b5" => &[0, 3, 6, 10],
        "9" => &[0, 4, 7, 10, 14],
        "maj9" => &[0, 4, 7, 11, 14],
        "m9" => &[0, 3, 7, 10, 14],
        "sus2" => &[0, 2, 7],
        "sus4" => &[0, 5, 7],
        "add9" => &[0, 4, 7, 14],
        _ => return None,
    };
    Some(intervals)
}

/// General MIDI percussion key map (keys 35-81 on the percussion channel).
const PERCUSSION_KEYS: [(&str, u8); 47] = [
    ("acoustic_bass_drum", 35),
    ("bass_drum_1", 36),
    ("side_stick", 37),
    ("acoustic_snare", 38),
    ("hand_clap", 39),
    ("electric_snare", 40),
    ("low_floor_tom", 41),
    ("closed_hi_hat", 42),
    ("high_floor_tom", 43),
    ("pedal_hi_hat", 44),
    ("low_tom", 45),
    ("open_hi_hat", 46),
    ("low_mid_tom", 47),
    ("hi_mid_tom", 48),
    ("crash_cymbal_1", 49),
    ("high_tom", 50),
    ("ride_cymbal_1", 51),
    ("chinese_cymbal", 52),
    ("ride_bell", 53),
    ("tambourine", 54),
    ("splash_cymbal", 55),
    ("cowbell", 56),
    ("crash_cymbal_2", 57),
    ("vibraslap", 58),
    ("ride_cymbal_2", 59),
    ("hi_bongo", 60),
    ("low_bongo", 61),
    ("mute_hi_conga", 62),
    ("open_hi_conga", 63),
    ("low_conga", 64),
    ("high_timbale", 65),
    ("low_timbale", 66),
    ("high_agogo", 67),
    ("low_agogo", 68),
    ("cabasa", 69),
    ("maracas", 70),
    ("short_whistle", 71),
    ("long_whistle", 72),
    ("short_guiro", 73),
    ("long_guiro", 74),
    ("claves", 75),
    ("hi_wood_block", 76),
    ("low_wood_block", 77),
    ("mute_cuica", 78),
    ("open_cuica", 79),
    ("mute_triangle", 80),
    ("open_triangle", 81),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_c() {
        assert_eq!(parse_note("C4"), Some(60));
    }

    #[test]
    fn a4_concert() {
        assert_eq!(parse_note("A4"), Some(69));
    }

    #[test]
    fn accidentals() {
        assert_eq!(parse_note("F#3"), Some(54));
        assert_eq!(parse_note("Bb3"), Some(58));
        assert_eq!(parse_note("Eb2"), Some(39));
    }

    #[test]
    fn octave_defaults_to_four() {
        assert_eq!(parse_note("C"), Some(60));
        assert_eq!(parse_note("G"), Some(67));
    }

    #[test]
    fn caret_raises_an_octave() {
        assert_eq!(parse_note("C^"), Some(72));
        assert_eq!(parse_note("C4^"), Some(72));
        assert_eq!(parse_note("C4^^"), Some(84));
    }

    #[test]
    fn lowercase_letters_accepted() {
        assert_eq!(parse_note("c4"), Some(60));
        assert_eq!(parse_note("g3"), Some(55));
    }

    #[test]
    fn out_of_range_rejected() {
        assert_eq!(parse_note("G9^"), None);
        assert_eq!(parse_note("C99"), None);
    }

    #[test]
    fn garbage_rejected() {
        assert_eq!(parse_note(""), None);
        assert_eq!(parse_note("H4"), None);
        assert_eq!(parse_note("C4x"), None);
        assert_eq!(parse_note("128"), None);
    }

    #[test]
    fn major_triad() {
        assert_eq!(parse_chord("C"), Some(vec![60, 64, 67]));
    }

    #[test]
    fn minor_triad() {
        assert_eq!(parse_chord("Am"), Some(vec![69, 72, 76]));
    }

    #[test]
    fn dominant_seventh_digit_is_quality_not_octave() {
        assert_eq!(parse_chord("C7"), Some(vec![60, 64, 67, 70]));
    }

    #[test]
    fn major_versus_minor_seventh() {
        assert_eq!(parse_chord("Cmaj7"), Some(vec![60, 64, 67, 71]));
        assert_eq!(parse_chord("Cm7"), Some(vec![60, 63, 67, 70]));
    }

    #[test]
    fn flat_root() {
        assert_eq!(parse_chord("Bb"), Some(vec![70, 74, 77]));
    }

    #[test]
    fn unknown_quality_rejected() {
        assert_eq!(parse_chord("Cfoo"), None);
        assert_eq!(parse_chord(""), None);
        assert_eq!(parse_chord("X"), None);
    }

    #[test]
    fn percussion_lookup_is_case_insensitive() {
        assert_eq!(percussion_key("acoustic_snare"), Some(38));
        assert_eq!(percussion_key("Acoustic_Snare"), Some(38));
        assert_eq!(percussion_key("OPEN_HI_HAT"), Some(46));
    }

    #[test]
    fn percussion_table_bounds() {
        assert_eq!(percussion_key("acoustic_bass_drum"), Some(35));
        assert_eq!(percussion_key("open_triangle"), Some(81));
        assert_eq!(percussion_key("kazoo"), None);
    }

    #[test]
    fn note_name_round_trip() {
        for key in [0u8, 38, 60, 69, 127] {
            assert_eq!(parse_note(&note_name(key)), Some(key));
        }
    }
}
