//! General MIDI level 1 sound set.
//!
//! Programs are 1-based as in the GM spec; the emitter subtracts one for the
//! wire byte. Sixteen families of eight instruments each; programs 113-120
//! (the percussive family) route their track to the drum channel.

/// The sixteen GM instrument families, in program order.
pub const FAMILIES: [&str; 16] = [
    "piano",
    "chromatic percussion",
    "organ",
    "guitar",
    "bass",
    "strings",
    "ensemble",
    "brass",
    "reed",
    "pipe",
    "synth lead",
    "synth pad",
    "synth effects",
    "ethnic",
    "percussive",
    "sound effects",
];

/// The 128 GM instruments. Index is program minus one.
pub const INSTRUMENTS: [&str; 128] = [
    // piano
    "acoustic grand piano",
    "bright acoustic piano",
    "electric grand piano",
    "honky-tonk piano",
    "electric piano 1",
    "electric piano 2",
    "harpsichord",
    "clavi",
    // chromatic percussion
    "celesta",
    "glockenspiel",
    "music box",
    "vibraphone",
    "marimba",
    "xylophone",
    "tubular bells",
    "dulcimer",
    // organ
    "drawbar organ",
    "percussive organ",
    "rock organ",
    "church organ",
    "reed organ",
    "accordion",
    "harmonica",
    "tango accordion",
    // guitar
    "acoustic guitar (nylon)",
    "acoustic guitar (steel)",
    "electric guitar (jazz)",
    "electric guitar (clean)",
    "electric guitar (muted)",
    "overdriven guitar",
    "distortion guitar",
    "guitar harmonics",
    // bass
    "acoustic bass",
    "electric bass (finger)",
    "electric bass (pick)",
    "fretless bass",
    "slap bass 1",
    "slap bass 2",
    "synth bass 1",
    "synth bass 2",
    // strings
    "violin",
    "viola",
    "cello",
    "contrabass",
    "tremolo strings",
    "pizzicato strings",
    "orchestral harp",
    "timpani",
    // ensemble
    "string ensemble 1",
    "string ensemble 2",
    "synthstrings 1",
    "synthstrings 2",
    "choir aahs",
    "voice oohs",
    "synth voice",
    "orchestra hit",
    // brass
    "trumpet",
    "trombone",
    "tuba",
    "muted trumpet",
    "french horn",
    "brass section",
    "synthbrass 1",
    "synthbrass 2",
    // reed
    "soprano sax",
    "alto sax",
    "tenor sax",
    "baritone sax",
    "oboe",
    "english horn",
    "bassoon",
    "clarinet",
    // pipe
    "piccolo",
    "flute",
    "recorder",
    "pan flute",
    "blown bottle",
    "shakuhachi",
    "whistle",
    "ocarina",
    // synth lead
    "lead 1 (square)",
    "lead 2 (sawtooth)",
    "lead 3 (calliope)",
    "lead 4 (chiff)",
    "lead 5 (charang)",
    "lead 6 (voice)",
    "lead 7 (fifths)",
    "lead 8 (bass + lead)",
    // synth pad
    "pad 1 (new age)",
    "pad 2 (warm)",
    "pad 3 (polysynth)",
    "pad 4 (choir)",
    "pad 5 (bowed)",
    "pad 6 (metallic)",
    "pad 7 (halo)",
    "pad 8 (sweep)",
    // synth effects
    "fx 1 (rain)",
    "fx 2 (soundtrack)",
    "fx 3 (crystal)",
    "fx 4 (atmosphere)",
    "fx 5 (brightness)",
    "fx 6 (goblins)",
    "fx 7 (echoes)",
    "fx 8 (sci-fi)",
    // ethnic
    "sitar",
    "banjo",
    "shamisen",
    "koto",
    "kalimba",
    "bag pipe",
    "fiddle",
    "shanai",
    // percussive
    "tinkle bell",
    "agogo",
    "steel drums",
    "woodblock",
    "taiko drum",
    "melodic tom",
    "synth drum",
    "reverse cymbal",
    // sound effects
    "guitar fret noise",
    "breath noise",
    "seashore",
    "bird tweet",
    "telephone ring",
    "helicopter",
    "applause",
    "gunshot",
];

/// Resolve an instrument or family name to its 1-based GM program.
///
/// Lookup is case-insensitive. A family name resolves to the first program
/// of that family.
pub fn program(name: &str) -> Option<u8> {
    let lowered = name.to_ascii_lowercase();
    if let Some(index) = INSTRUMENTS.iter().position(|&i| i == lowered) {
        return Some(index as u8 + 1);
    }
    FAMILIES
        .iter()
        .position(|&f| f == lowered)
        .map(|index| index as u8 * 8 + 1)
}

/// The instrument name for a 1-based GM program.
pub fn name(program: u8) -> Option<&'static str> {
    match program {
        1..=128 => Some(INSTRUMENTS[usize::from(program) - 1]),
        _ => None,
    }
}

/// The family name for a 1-based GM program.
pub fn family(program: u8) -> Option<&'static str> {
    match program {
        1..=128 => Some(FAMILIES[usize::from(program - 1) / 8]),
        _ => None,
    }
}

/// True for the percussive family (programs 113-120).
pub fn is_percussive(program: u8) -> bool {
    (113..=120).contains(&program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_by_exact_name() {
        assert_eq!(program("acoustic grand piano"), Some(1));
        assert_eq!(program("harpsichord"), Some(7));
        assert_eq!(program("distortion guitar"), Some(31));
        assert_eq!(program("gunshot"), Some(128));
    }

    #[test]
    fn program_is_case_insensitive() {
        assert_eq!(program("Acoustic Grand Piano"), Some(1));
        assert_eq!(program("FX 1 (rain)"), Some(97));
    }

    #[test]
    fn program_by_family_name() {
        assert_eq!(program("piano"), Some(1));
        assert_eq!(program("guitar"), Some(25));
        assert_eq!(program("sound effects"), Some(121));
    }

    #[test]
    fn program_unknown_name() {
        assert_eq!(program("theremin deluxe"), None);
    }

    #[test]
    fn family_boundaries() {
        assert_eq!(family(1), Some("piano"));
        assert_eq!(family(8), Some("piano"));
        assert_eq!(family(9), Some("chromatic percussion"));
        assert_eq!(family(128), Some("sound effects"));
        assert_eq!(family(0), None);
        assert_eq!(family(129), None);
    }

    #[test]
    fn name_round_trips_program() {
        for (index, instrument) in INSTRUMENTS.iter().enumerate() {
            let pc = index as u8 + 1;
            assert_eq!(program(instrument), Some(pc));
            assert_eq!(name(pc), Some(*instrument));
        }
    }

    #[test]
    fn percussive_range() {
        assert!(!is_percussive(112));
        assert!(is_percussive(113));
        assert!(is_percussive(120));
        assert!(!is_percussive(121));
    }
}
