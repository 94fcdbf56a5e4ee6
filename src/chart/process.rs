//! Dispatch tables for `.chart` note and special-phrase codes.
//!
//! Each game mode maps the numeric code of an `N` or `S` line to what it
//! means. The tables are declarative and static; unmapped codes are ignored
//! by the reader.

use crate::parse::flag_priority::NoteFlagPriority;
use crate::song::{DrumPad, GameMode, GhlFret, GuitarFret, NoteFlags, PhraseKind};

const NOTE_OFFSET_INSTRUMENT_PLUS: u32 = 32;
const NOTE_OFFSET_DRUMS_ACCENT: u32 = 33;
const NOTE_OFFSET_DRUMS_GHOST: u32 = 39;
const NOTE_OFFSET_PRO_DRUMS: u32 = 64;

const PHRASE_VERSUS_PLAYER_1: u32 = 0;
const PHRASE_VERSUS_PLAYER_2: u32 = 1;
const PHRASE_STARPOWER: u32 = 2;
const PHRASE_DRUM_FILL: u32 = 64;
const PHRASE_TREMOLO_LANE: u32 = 65;
const PHRASE_TRILL_LANE: u32 = 66;

/// What an `N` line's code resolves to.
#[derive(Debug, Clone, Copy)]
pub(super) enum NoteAction {
    /// A playable note on a lane.
    Note {
        lane: u16,
        default_flags: NoteFlags,
    },
    /// A flag applied to the whole chord at the line's tick, deferred until
    /// all notes are in.
    ChordFlag(&'static NoteFlagPriority),
    /// A flag applied to one lane of the chord at the line's tick, deferred
    /// until all notes are in.
    LaneFlag {
        lane: u16,
        priority: &'static NoteFlagPriority,
    },
}

const fn note(lane: u16) -> Option<NoteAction> {
    Some(NoteAction::Note {
        lane,
        default_flags: NoteFlags::NONE,
    })
}

/// Resolves an `N` code for a game mode. `None` means the code carries no
/// meaning on this mode and the line is skipped.
pub(super) fn note_action(game_mode: GameMode, code: u32) -> Option<NoteAction> {
    match game_mode {
        GameMode::Guitar => match code {
            0 => note(GuitarFret::Green as u16),
            1 => note(GuitarFret::Red as u16),
            2 => note(GuitarFret::Yellow as u16),
            3 => note(GuitarFret::Blue as u16),
            4 => note(GuitarFret::Orange as u16),
            7 => note(GuitarFret::Open as u16),
            5 => Some(NoteAction::ChordFlag(&NoteFlagPriority::FORCED)),
            6 => Some(NoteAction::ChordFlag(&NoteFlagPriority::TAP)),
            _ => None,
        },
        GameMode::GhlGuitar => match code {
            0 => note(GhlFret::White1 as u16),
            1 => note(GhlFret::White2 as u16),
            2 => note(GhlFret::White3 as u16),
            3 => note(GhlFret::Black1 as u16),
            4 => note(GhlFret::Black2 as u16),
            8 => note(GhlFret::Black3 as u16),
            7 => note(GhlFret::Open as u16),
            5 => Some(NoteAction::ChordFlag(&NoteFlagPriority::FORCED)),
            6 => Some(NoteAction::ChordFlag(&NoteFlagPriority::TAP)),
            _ => None,
        },
        GameMode::Drums => drums_note_action(code),
        GameMode::ProGuitar | GameMode::ProKeys | GameMode::Vocals => None,
    }
}

fn drums_note_action(code: u32) -> Option<NoteAction> {
    const PADS: [DrumPad; 6] = [
        DrumPad::Kick,
        DrumPad::Red,
        DrumPad::Yellow,
        DrumPad::Blue,
        DrumPad::Orange,
        DrumPad::Green,
    ];
    match code {
        0..=5 => note(PADS[code as usize] as u16),
        NOTE_OFFSET_INSTRUMENT_PLUS => Some(NoteAction::Note {
            lane: DrumPad::Kick as u16,
            default_flags: NoteFlags::DOUBLE_KICK,
        }),
        _ => {
            // Cymbal markers exist for the three pads that can be cymbals;
            // accent and ghost markers for every pad but the kick.
            if let Some(offset) = code.checked_sub(NOTE_OFFSET_PRO_DRUMS)
                && (2..=4).contains(&offset)
            {
                return Some(NoteAction::LaneFlag {
                    lane: PADS[offset as usize] as u16,
                    priority: &NoteFlagPriority::CYMBAL,
                });
            }
            if let Some(offset) = code.checked_sub(NOTE_OFFSET_DRUMS_ACCENT)
                && (1..=5).contains(&offset)
            {
                return Some(NoteAction::LaneFlag {
                    lane: PADS[offset as usize] as u16,
                    priority: &NoteFlagPriority::ACCENT,
                });
            }
            if let Some(offset) = code.checked_sub(NOTE_OFFSET_DRUMS_GHOST)
                && (1..=5).contains(&offset)
            {
                return Some(NoteAction::LaneFlag {
                    lane: PADS[offset as usize] as u16,
                    priority: &NoteFlagPriority::GHOST,
                });
            }
            None
        }
    }
}

/// Resolves an `S` code for a game mode. Not every mode supports every
/// phrase.
pub(super) fn special_kind(game_mode: GameMode, code: u32) -> Option<PhraseKind> {
    match code {
        PHRASE_VERSUS_PLAYER_1 => Some(PhraseKind::VersusPlayer1),
        PHRASE_VERSUS_PLAYER_2 => Some(PhraseKind::VersusPlayer2),
        PHRASE_STARPOWER => Some(PhraseKind::Starpower),
        PHRASE_DRUM_FILL if game_mode == GameMode::Drums => Some(PhraseKind::ProDrumsActivation),
        PHRASE_TREMOLO_LANE if game_mode == GameMode::Drums => Some(PhraseKind::TremoloLane),
        PHRASE_TRILL_LANE if game_mode == GameMode::Drums => Some(PhraseKind::TrillLane),
        _ => None,
    }
}
