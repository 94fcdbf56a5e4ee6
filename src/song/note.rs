//! Playable note primitives shared by every game mode.
//!
//! A [`Note`] carries a raw lane value whose meaning depends on the chart's
//! [`GameMode`](crate::song::GameMode): a guitar fret color, a drum pad, a GHL
//! fret, a vocals pitch, a pro-keys key, or a packed pro-guitar string+fret.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};

use crate::song::GameMode;

/// Per-note modifier flags, stored as a bitset.
///
/// Conflicts between flags (Forced vs. Tap, Accent vs. Ghost) are resolved
/// through [`NoteFlagPriority`](crate::parse::flag_priority::NoteFlagPriority),
/// not here.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteFlags(pub u16);

impl NoteFlags {
    pub const NONE: Self = Self(0);
    /// The note's strum/HOPO classification deviates from its natural one.
    pub const FORCED: Self = Self(1 << 0);
    pub const FORCED_STRUM: Self = Self(1 << 1);
    pub const FORCED_HOPO: Self = Self(1 << 2);
    pub const TAP: Self = Self(1 << 3);
    pub const PRO_DRUMS_CYMBAL: Self = Self(1 << 4);
    pub const PRO_DRUMS_ACCENT: Self = Self(1 << 5);
    pub const PRO_DRUMS_GHOST: Self = Self(1 << 6);
    /// Expert+ style mechanics, e.g. double kick. Applies to any difficulty.
    pub const INSTRUMENT_PLUS: Self = Self(1 << 7);
    pub const DOUBLE_KICK: Self = Self::INSTRUMENT_PLUS;
    pub const PRO_GUITAR_MUTED: Self = Self(1 << 8);
    pub const VOCALS_PERCUSSION: Self = Self(1 << 9);

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub const fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub const fn toggle(&mut self, other: Self) {
        self.0 ^= other.0;
    }
}

impl BitOr for NoteFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for NoteFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for NoteFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitXor for NoteFlags {
    type Output = Self;
    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl BitXorAssign for NoteFlags {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl Not for NoteFlags {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for NoteFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(NoteFlags, &str); 10] = [
            (NoteFlags::FORCED, "Forced"),
            (NoteFlags::FORCED_STRUM, "ForcedStrum"),
            (NoteFlags::FORCED_HOPO, "ForcedHopo"),
            (NoteFlags::TAP, "Tap"),
            (NoteFlags::PRO_DRUMS_CYMBAL, "ProDrumsCymbal"),
            (NoteFlags::PRO_DRUMS_ACCENT, "ProDrumsAccent"),
            (NoteFlags::PRO_DRUMS_GHOST, "ProDrumsGhost"),
            (NoteFlags::INSTRUMENT_PLUS, "InstrumentPlus"),
            (NoteFlags::PRO_GUITAR_MUTED, "ProGuitarMuted"),
            (NoteFlags::VOCALS_PERCUSSION, "VocalsPercussion"),
        ];
        if self.is_empty() {
            return f.write_str("None");
        }
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl fmt::Display for NoteFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Five-fret guitar lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GuitarFret {
    Open = 0,
    Green = 1,
    Red = 2,
    Yellow = 3,
    Blue = 4,
    Orange = 5,
}

/// Drum pads. `Orange` doubles as green cymbal on four-lane pro kits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DrumPad {
    Kick = 0,
    Red = 1,
    Yellow = 2,
    Blue = 3,
    Orange = 4,
    Green = 5,
}

/// Guitar Hero Live six-fret lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GhlFret {
    Open = 0,
    Black1 = 1,
    Black2 = 2,
    Black3 = 3,
    White1 = 4,
    White2 = 5,
    White3 = 6,
}

/// Pro-guitar strings, low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProGuitarString {
    Red = 0,
    Green = 1,
    Orange = 2,
    Blue = 3,
    Yellow = 4,
    Purple = 5,
}

impl ProGuitarString {
    pub const ALL: [Self; 6] = [
        Self::Red,
        Self::Green,
        Self::Orange,
        Self::Blue,
        Self::Yellow,
        Self::Purple,
    ];
}

const PRO_GUITAR_FRET_MASK: u16 = 0x1F;
const PRO_GUITAR_STRING_OFFSET: u16 = 5;
const PRO_GUITAR_STRING_MASK: u16 = 0x07 << PRO_GUITAR_STRING_OFFSET;

/// Packs a pro-guitar string and fret into a raw lane value. Frets are
/// clamped to the 22-fret ceiling.
#[must_use]
pub fn make_pro_guitar_raw(string: ProGuitarString, fret: u16) -> u16 {
    let fret = fret.min(22);
    (fret & PRO_GUITAR_FRET_MASK) | (((string as u16) << PRO_GUITAR_STRING_OFFSET) & PRO_GUITAR_STRING_MASK)
}

/// A single playable note within one chart.
///
/// Notes are value types; chord membership is positional (notes sharing a
/// tick within the chart's note list form a chord).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Note {
    pub tick: u32,
    /// Sustain length in ticks. Zero for non-sustained notes.
    pub length: u32,
    /// Raw lane value; interpretation depends on the chart's game mode.
    pub raw: u16,
    pub flags: NoteFlags,
}

impl Note {
    #[must_use]
    pub const fn new(tick: u32, raw: u16, length: u32, flags: NoteFlags) -> Self {
        Self {
            tick,
            length,
            raw,
            flags,
        }
    }

    #[must_use]
    pub const fn forced(&self) -> bool {
        self.flags.contains(NoteFlags::FORCED)
    }

    #[must_use]
    pub const fn pro_guitar_fret(&self) -> u16 {
        self.raw & PRO_GUITAR_FRET_MASK
    }

    #[must_use]
    pub fn pro_guitar_string(&self) -> Option<ProGuitarString> {
        let index = (self.raw & PRO_GUITAR_STRING_MASK) >> PRO_GUITAR_STRING_OFFSET;
        ProGuitarString::ALL.get(index as usize).copied()
    }

    /// Whether this note is an open/kick lane under the given game mode.
    #[must_use]
    pub fn is_open(&self, game_mode: GameMode) -> bool {
        match game_mode {
            GameMode::Guitar => self.raw == GuitarFret::Open as u16,
            GameMode::GhlGuitar => self.raw == GhlFret::Open as u16,
            GameMode::ProGuitar => self.pro_guitar_fret() == 0,
            GameMode::Drums => self.raw == DrumPad::Kick as u16,
            GameMode::Vocals | GameMode::ProKeys => false,
        }
    }
}

/// Whether the note at `index` shares its tick with a neighbor.
#[must_use]
pub fn is_chord_member(notes: &[Note], index: usize) -> bool {
    let tick = notes[index].tick;
    (index > 0 && notes[index - 1].tick == tick)
        || (index + 1 < notes.len() && notes[index + 1].tick == tick)
}

/// Whether the note at `index` would be a HOPO from tick spacing and chord
/// shape alone, ignoring any forcing flags.
#[must_use]
pub fn is_natural_hopo(notes: &[Note], index: usize, hopo_threshold: u32) -> bool {
    // Checking state in this order is important.
    if is_chord_member(notes, index) || index == 0 {
        return false;
    }
    let note = &notes[index];
    let previous = &notes[index - 1];
    (is_chord_member(notes, index - 1) || note.raw != previous.raw)
        && note.tick - previous.tick <= hopo_threshold
}

/// Whether the note at `index` plays as a HOPO, accounting for the generic
/// forced flag. Forced natural HOPOs become strums and vice versa.
#[must_use]
pub fn is_hopo(notes: &[Note], index: usize, hopo_threshold: u32) -> bool {
    is_natural_hopo(notes, index, hopo_threshold) != notes[index].forced()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(tick: u32, raw: u16) -> Note {
        Note::new(tick, raw, 0, NoteFlags::NONE)
    }

    #[test]
    fn flag_set_operations() {
        let mut flags = NoteFlags::NONE;
        flags.insert(NoteFlags::TAP);
        flags.insert(NoteFlags::FORCED_HOPO);
        assert!(flags.contains(NoteFlags::TAP));
        flags.remove(NoteFlags::TAP);
        assert!(!flags.contains(NoteFlags::TAP));
        flags.toggle(NoteFlags::PRO_DRUMS_CYMBAL);
        assert!(flags.contains(NoteFlags::PRO_DRUMS_CYMBAL));
        flags.toggle(NoteFlags::PRO_DRUMS_CYMBAL);
        assert!(!flags.contains(NoteFlags::PRO_DRUMS_CYMBAL));
    }

    #[test]
    fn pro_guitar_raw_round_trip() {
        let raw = make_pro_guitar_raw(ProGuitarString::Yellow, 12);
        let note = Note::new(0, raw, 0, NoteFlags::NONE);
        assert_eq!(note.pro_guitar_string(), Some(ProGuitarString::Yellow));
        assert_eq!(note.pro_guitar_fret(), 12);
        // Frets clamp to 22.
        let raw = make_pro_guitar_raw(ProGuitarString::Red, 30);
        assert_eq!(Note::new(0, raw, 0, NoteFlags::NONE).pro_guitar_fret(), 22);
    }

    #[test]
    fn natural_hopo_requires_lane_change_within_threshold() {
        let notes = [note(0, 1), note(50, 2), note(200, 1)];
        assert!(!is_natural_hopo(&notes, 0, 65));
        assert!(is_natural_hopo(&notes, 1, 65));
        // Too far from the previous note.
        assert!(!is_natural_hopo(&notes, 2, 65));
    }

    #[test]
    fn chords_are_never_natural_hopos() {
        let notes = [note(0, 1), note(50, 2), note(50, 3)];
        assert!(is_chord_member(&notes, 1));
        assert!(!is_natural_hopo(&notes, 1, 65));
        assert!(!is_natural_hopo(&notes, 2, 65));
    }

    #[test]
    fn repeated_lane_after_chord_is_natural_hopo() {
        // A chord followed by a single note on a lane the chord used still
        // hammers on; only single-note repetition strums.
        let notes = [note(0, 1), note(0, 2), note(50, 2)];
        assert!(is_natural_hopo(&notes, 2, 65));
        let notes = [note(0, 2), note(50, 2)];
        assert!(!is_natural_hopo(&notes, 1, 65));
    }
}
