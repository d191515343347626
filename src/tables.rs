//! Built-in SSG tables that need no document search.

/// Software envelope presets selectable with `@0`..`@9` on SSG parts.
const ENVELOPE_PRESETS: [&str; 10] = [
    "E0,0,0,0\tDefault",
    "E2,-1,0,1\tSynth type 1",
    "E2,-2,0,1\tSynth type 2",
    "E2,-2,0,8\tSynth type 3",
    "E2,-1,24,1\tPiano type 1",
    "E2,-2,24,1\tPiano type 2",
    "E2,-2,4,1\tGlockenspiel/Marimba type",
    "E2,1,0,1\tStrings Type",
    "E1,2,0,1\tBrass type 1",
    "E1,2,24,1\tBrass type 2",
];

/// Rhythm voices, one per bit of an `R` part instrument number.
const DRUM_VOICES: [&str; 11] = [
    "Bass Drum",
    "Snare Drum 1",
    "Low Tom",
    "Middle Tom",
    "High Tom",
    "Rim Shot",
    "Snare Drum 2",
    "Hi-Hat Close",
    "Hi-Hat Open",
    "Crash Cymbal",
    "Ride Cymbal",
];

/// Largest accepted rhythm bitmask.
const MAX_DRUM_MASK: u32 = 1024;

/// Decode a rhythm bitmask into its voices, lowest bit first.
/// Masks above 1024 are rejected; `0` decodes to an empty string.
pub fn drum_labels(mask: u32) -> Option<String> {
    if mask > MAX_DRUM_MASK {
        return None;
    }
    let labels: Vec<&str> = DRUM_VOICES
        .iter()
        .enumerate()
        .filter(|(bit, _)| return (mask >> bit) & 1 == 1)
        .map(|(_, label)| return *label)
        .collect();
    return Some(labels.join(", "));
}

/// Label of envelope preset `id` (0 through 9).
pub fn envelope_label(id: u32) -> Option<&'static str> {
    let index = usize::try_from(id).ok()?;
    return ENVELOPE_PRESETS.get(index).copied();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_range() {
        assert_eq!(envelope_label(0), Some("E0,0,0,0\tDefault"));
        assert_eq!(envelope_label(9), Some("E1,2,24,1\tBrass type 2"));
        assert_eq!(envelope_label(10), None);
    }

    #[test]
    fn drum_bits_in_ascending_order() {
        assert_eq!(drum_labels(5).as_deref(), Some("Bass Drum, Low Tom"));
        assert_eq!(drum_labels(1024).as_deref(), Some("Ride Cymbal"));
        assert_eq!(drum_labels(0).as_deref(), Some(""));
        assert_eq!(drum_labels(1025), None);
    }

    #[test]
    fn hi_hats() {
        assert_eq!(drum_labels(0b1_1000_0000).as_deref(), Some("Hi-Hat Close, Hi-Hat Open"));
    }
}
