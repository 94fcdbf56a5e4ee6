//! MIDI dispatch tables: note number → processing action, per game mode.
//!
//! The tables are built once, process-wide, from declarative difficulty
//! ranges and lane offsets, and shared read-only across parses. In-band text
//! markers can swap a track's current note map for a prebuilt variant
//! (enhanced opens on guitar, velocity dynamics on drums); that swap
//! reprograms dispatch for the rest of the track, it is not a per-event
//! branch.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::parse::deferred::ForcedKind;
use crate::song::{
    Difficulty, DrumPad, GameMode, GhlFret, GuitarFret, NoteFlags, PhraseKind, ProGuitarString,
};

// Control note numbers shared across instruments.
pub(super) const SOLO_NOTE: u8 = 103;
pub(super) const TAP_NOTE: u8 = 104;
pub(super) const VERSUS_PHRASE_PLAYER_1: u8 = 105;
pub(super) const VERSUS_PHRASE_PLAYER_2: u8 = 106;
pub(super) const STARPOWER_NOTE: u8 = 116;
pub(super) const TREMOLO_LANE_NOTE: u8 = 126;
pub(super) const TRILL_LANE_NOTE: u8 = 127;
pub(super) const SOLO_NOTE_PRO_GUITAR: u8 = 115;
pub(super) const SOLO_NOTE_PRO_KEYS: u8 = 115;

// Vocals note numbers. 105/106 double as lyric phrase markers.
const VOCALS_RANGE_SHIFT_NOTE: u8 = 0;
const VOCALS_LYRIC_SHIFT_NOTE: u8 = 1;
const VOCALS_RANGE_START: u8 = 36;
const VOCALS_RANGE_END: u8 = 84;
const VOCALS_PERCUSSION_NOTE: u8 = 96;

// Pro-keys note numbers.
const PRO_KEYS_RANGE_START: u8 = 48;
const PRO_KEYS_RANGE_END: u8 = 72;
const PRO_KEYS_GLISSANDO_NOTE: u8 = 126;

// Drums control notes.
const DRUM_FILL_NOTE_START: u8 = 120;
const DRUM_FILL_NOTE_END: u8 = 124;
const CYMBAL_TOGGLE_YELLOW: u8 = 110;
const CYMBAL_TOGGLE_BLUE: u8 = 111;
const CYMBAL_TOGGLE_ORANGE: u8 = 112;

// Velocities with meaning under chart dynamics.
pub(super) const VELOCITY_ACCENT: u8 = 127;
pub(super) const VELOCITY_GHOST: u8 = 1;

// Pro-guitar per-channel articulations. Only muting is represented so far.
pub(super) const PRO_GUITAR_CHANNEL_MUTED: u8 = 3;

// Beat track note numbers.
pub(super) const BEAT_MEASURE: u8 = 12;
pub(super) const BEAT_STRONG: u8 = 13;

const GUITAR_DIFF_START: [(Difficulty, u8); 4] = [
    (Difficulty::Easy, 60),
    (Difficulty::Medium, 72),
    (Difficulty::Hard, 84),
    (Difficulty::Expert, 96),
];

const GHL_DIFF_START: [(Difficulty, u8); 4] = [
    (Difficulty::Easy, 58),
    (Difficulty::Medium, 70),
    (Difficulty::Hard, 82),
    (Difficulty::Expert, 94),
];

const PRO_GUITAR_DIFF_START: [(Difficulty, u8); 4] = [
    (Difficulty::Easy, 24),
    (Difficulty::Medium, 48),
    (Difficulty::Hard, 72),
    (Difficulty::Expert, 96),
];

const DRUMS_DIFF_START: [(Difficulty, u8); 4] = [
    (Difficulty::Easy, 60),
    (Difficulty::Medium, 72),
    (Difficulty::Hard, 84),
    (Difficulty::Expert, 96),
];

/// Which difficulties a phrase action lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PhraseTarget {
    /// Fan out to every difficulty (single-track instruments).
    All,
    /// The track's own difficulty (per-difficulty pro-keys tracks).
    Track,
}

/// What a paired note event resolves to.
#[derive(Debug, Clone, Copy)]
pub(super) enum MidiAction {
    /// A note on a fixed difficulty and lane.
    Note {
        difficulty: Difficulty,
        lane: u16,
        default_flags: NoteFlags,
    },
    /// A drums note whose accent/ghost flags come from the velocity.
    VelocityDrumNote {
        difficulty: Difficulty,
        lane: u16,
        default_flags: NoteFlags,
    },
    /// A pro-guitar note: the fret rides in the velocity, articulations in
    /// the channel.
    ProGuitarNote {
        difficulty: Difficulty,
        string: ProGuitarString,
    },
    /// A vocals pitch, fanned out to every difficulty with no sustain
    /// cutoff.
    VocalsPitch,
    /// A zero-length percussion hit, fanned out to every difficulty.
    VocalsPercussion,
    /// A pro-keys key on the track's own difficulty.
    ProKeysKey { lane: u16 },
    /// A special phrase.
    Phrase {
        kind: PhraseKind,
        target: PhraseTarget,
    },
    /// A tremolo/trill lane: Expert, plus Hard when the velocity asks.
    LanePhrase { kind: PhraseKind },
    /// Vocals 105/106: both a versus phrase and a lyric phrase.
    VocalsPhrasePair { versus: PhraseKind },
    /// A deferred forced-type range; `None` difficulty fans out.
    ForcedType {
        difficulty: Option<Difficulty>,
        kind: ForcedKind,
    },
    /// A deferred per-lane flag toggle over the range, on all difficulties.
    FlagToggle { flags: NoteFlags, lane: u16 },
}

pub(super) type NoteMap = HashMap<u8, MidiAction>;

static GUITAR_NOTE_MAP: LazyLock<NoteMap> = LazyLock::new(|| build_guitar_note_map(false));
static GUITAR_NOTE_MAP_ENHANCED_OPENS: LazyLock<NoteMap> =
    LazyLock::new(|| build_guitar_note_map(true));
static GHL_NOTE_MAP: LazyLock<NoteMap> = LazyLock::new(build_ghl_note_map);
static PRO_GUITAR_NOTE_MAP: LazyLock<NoteMap> = LazyLock::new(build_pro_guitar_note_map);
static DRUMS_NOTE_MAP: LazyLock<NoteMap> = LazyLock::new(|| build_drums_note_map(false));
static DRUMS_NOTE_MAP_VELOCITY: LazyLock<NoteMap> = LazyLock::new(|| build_drums_note_map(true));
static VOCALS_NOTE_MAP: LazyLock<NoteMap> = LazyLock::new(build_vocals_note_map);
static PRO_KEYS_NOTE_MAP: LazyLock<NoteMap> = LazyLock::new(build_pro_keys_note_map);

static GUITAR_PHRASE_MAP: LazyLock<NoteMap> =
    LazyLock::new(|| build_phrase_map(GameMode::Guitar, STARPOWER_NOTE));
static GHL_PHRASE_MAP: LazyLock<NoteMap> =
    LazyLock::new(|| build_phrase_map(GameMode::GhlGuitar, STARPOWER_NOTE));
static PRO_GUITAR_PHRASE_MAP: LazyLock<NoteMap> =
    LazyLock::new(|| build_phrase_map(GameMode::ProGuitar, STARPOWER_NOTE));
static DRUMS_PHRASE_MAP: LazyLock<NoteMap> =
    LazyLock::new(|| build_phrase_map(GameMode::Drums, STARPOWER_NOTE));
static VOCALS_PHRASE_MAP: LazyLock<NoteMap> =
    LazyLock::new(|| build_phrase_map(GameMode::Vocals, STARPOWER_NOTE));
static PRO_KEYS_PHRASE_MAP: LazyLock<NoteMap> =
    LazyLock::new(|| build_phrase_map(GameMode::ProKeys, STARPOWER_NOTE));

/// The default note map for a game mode.
pub(super) fn note_map(game_mode: GameMode) -> &'static NoteMap {
    match game_mode {
        GameMode::Guitar => &GUITAR_NOTE_MAP,
        GameMode::GhlGuitar => &GHL_NOTE_MAP,
        GameMode::ProGuitar => &PRO_GUITAR_NOTE_MAP,
        GameMode::Drums => &DRUMS_NOTE_MAP,
        GameMode::Vocals => &VOCALS_NOTE_MAP,
        GameMode::ProKeys => &PRO_KEYS_NOTE_MAP,
    }
}

/// The guitar map with the open-note lane mapped in, for tracks that
/// declare `ENHANCED_OPENS`.
pub(super) fn guitar_enhanced_opens_map() -> &'static NoteMap {
    &GUITAR_NOTE_MAP_ENHANCED_OPENS
}

/// The drums map with velocity-sensitive accents and ghosts, for tracks
/// that declare `ENABLE_CHART_DYNAMICS`.
pub(super) fn drums_velocity_map() -> &'static NoteMap {
    &DRUMS_NOTE_MAP_VELOCITY
}

/// The phrase map for a game mode. With no star-power override this is a
/// shared static; an override builds a map with the star-power note moved
/// (and the solo mapping dropped if the override collides with it).
pub(super) fn phrase_map(
    game_mode: GameMode,
    star_power_note: Option<u8>,
) -> Cow<'static, NoteMap> {
    match star_power_note {
        None => Cow::Borrowed(match game_mode {
            GameMode::Guitar => &*GUITAR_PHRASE_MAP,
            GameMode::GhlGuitar => &*GHL_PHRASE_MAP,
            GameMode::ProGuitar => &*PRO_GUITAR_PHRASE_MAP,
            GameMode::Drums => &*DRUMS_PHRASE_MAP,
            GameMode::Vocals => &*VOCALS_PHRASE_MAP,
            GameMode::ProKeys => &*PRO_KEYS_PHRASE_MAP,
        }),
        Some(note) => Cow::Owned(build_phrase_map(game_mode, note)),
    }
}

/// The text markers that reprogram a mode's note map.
pub(super) enum TextMarkerAction {
    EnhancedOpens,
    ChartDynamics,
}

pub(super) fn text_marker_action(game_mode: GameMode, text: &str) -> Option<TextMarkerAction> {
    use crate::parse::text_events::{CHART_DYNAMICS, ENHANCED_OPENS};
    match (game_mode, text) {
        (GameMode::Guitar, ENHANCED_OPENS) => Some(TextMarkerAction::EnhancedOpens),
        (GameMode::Drums, CHART_DYNAMICS) => Some(TextMarkerAction::ChartDynamics),
        _ => None,
    }
}

/// The SysEx phrase codes a mode responds to.
pub(super) enum SysExAction {
    OpenNote,
    Tap,
}

pub(super) fn sysex_action(game_mode: GameMode, code: u8) -> Option<SysExAction> {
    use super::sysex::{CODE_GUITAR_OPEN, CODE_GUITAR_TAP};
    match (game_mode, code) {
        (GameMode::Guitar | GameMode::GhlGuitar, CODE_GUITAR_OPEN) => Some(SysExAction::OpenNote),
        (GameMode::Guitar | GameMode::GhlGuitar, CODE_GUITAR_TAP) => Some(SysExAction::Tap),
        _ => None,
    }
}

fn build_guitar_note_map(enhanced_opens: bool) -> NoteMap {
    let mut map = NoteMap::new();
    map.insert(
        TAP_NOTE,
        MidiAction::ForcedType {
            difficulty: None,
            kind: ForcedKind::Tap,
        },
    );

    let mut fret_offsets: Vec<(GuitarFret, i16)> = vec![
        (GuitarFret::Green, 0),
        (GuitarFret::Red, 1),
        (GuitarFret::Yellow, 2),
        (GuitarFret::Blue, 3),
        (GuitarFret::Orange, 4),
    ];
    if enhanced_opens {
        fret_offsets.push((GuitarFret::Open, -1));
    }

    for (difficulty, start) in GUITAR_DIFF_START {
        for &(fret, offset) in &fret_offsets {
            let key = (i16::from(start) + offset) as u8;
            map.insert(
                key,
                MidiAction::Note {
                    difficulty,
                    lane: fret as u16,
                    default_flags: NoteFlags::NONE,
                },
            );
        }
        map.insert(
            start + 5,
            MidiAction::ForcedType {
                difficulty: Some(difficulty),
                kind: ForcedKind::Hopo,
            },
        );
        map.insert(
            start + 6,
            MidiAction::ForcedType {
                difficulty: Some(difficulty),
                kind: ForcedKind::Strum,
            },
        );
    }
    map
}

fn build_ghl_note_map() -> NoteMap {
    let mut map = NoteMap::new();
    map.insert(
        TAP_NOTE,
        MidiAction::ForcedType {
            difficulty: None,
            kind: ForcedKind::Tap,
        },
    );

    const FRET_OFFSETS: [(GhlFret, u8); 7] = [
        (GhlFret::Open, 0),
        (GhlFret::White1, 1),
        (GhlFret::White2, 2),
        (GhlFret::White3, 3),
        (GhlFret::Black1, 4),
        (GhlFret::Black2, 5),
        (GhlFret::Black3, 6),
    ];

    for (difficulty, start) in GHL_DIFF_START {
        for (fret, offset) in FRET_OFFSETS {
            map.insert(
                start + offset,
                MidiAction::Note {
                    difficulty,
                    lane: fret as u16,
                    default_flags: NoteFlags::NONE,
                },
            );
        }
        map.insert(
            start + 7,
            MidiAction::ForcedType {
                difficulty: Some(difficulty),
                kind: ForcedKind::Hopo,
            },
        );
        map.insert(
            start + 8,
            MidiAction::ForcedType {
                difficulty: Some(difficulty),
                kind: ForcedKind::Strum,
            },
        );
    }
    map
}

fn build_pro_guitar_note_map() -> NoteMap {
    let mut map = NoteMap::new();
    for (difficulty, start) in PRO_GUITAR_DIFF_START {
        for string in ProGuitarString::ALL {
            map.insert(
                start + string as u8,
                MidiAction::ProGuitarNote { difficulty, string },
            );
        }
        map.insert(
            start + 6,
            MidiAction::ForcedType {
                difficulty: Some(difficulty),
                kind: ForcedKind::Hopo,
            },
        );
    }
    map
}

fn build_drums_note_map(enable_velocity: bool) -> NoteMap {
    let mut map = NoteMap::new();
    for key in DRUM_FILL_NOTE_START..=DRUM_FILL_NOTE_END {
        map.insert(
            key,
            MidiAction::Phrase {
                kind: PhraseKind::ProDrumsActivation,
                target: PhraseTarget::All,
            },
        );
    }

    const PADS: [(DrumPad, u8); 6] = [
        (DrumPad::Kick, 0),
        (DrumPad::Red, 1),
        (DrumPad::Yellow, 2),
        (DrumPad::Blue, 3),
        (DrumPad::Orange, 4),
        (DrumPad::Green, 5),
    ];

    for (difficulty, start) in DRUMS_DIFF_START {
        for (pad, offset) in PADS {
            // Yellow, blue, and orange default to cymbals; tom markers
            // toggle the flag back off.
            let default_flags = match pad {
                DrumPad::Yellow | DrumPad::Blue | DrumPad::Orange => NoteFlags::PRO_DRUMS_CYMBAL,
                _ => NoteFlags::NONE,
            };
            let key = start + offset;
            let lane = pad as u16;
            let action = if enable_velocity && pad != DrumPad::Kick {
                MidiAction::VelocityDrumNote {
                    difficulty,
                    lane,
                    default_flags,
                }
            } else {
                MidiAction::Note {
                    difficulty,
                    lane,
                    default_flags,
                }
            };
            map.insert(key, action);

            if pad == DrumPad::Kick {
                map.insert(
                    key - 1,
                    MidiAction::Note {
                        difficulty,
                        lane,
                        default_flags: NoteFlags::DOUBLE_KICK,
                    },
                );
            }
        }
    }

    for (key, pad) in [
        (CYMBAL_TOGGLE_YELLOW, DrumPad::Yellow),
        (CYMBAL_TOGGLE_BLUE, DrumPad::Blue),
        (CYMBAL_TOGGLE_ORANGE, DrumPad::Orange),
    ] {
        map.insert(
            key,
            MidiAction::FlagToggle {
                flags: NoteFlags::PRO_DRUMS_CYMBAL,
                lane: pad as u16,
            },
        );
    }
    map
}

fn build_vocals_note_map() -> NoteMap {
    let mut map = NoteMap::new();
    map.insert(
        VOCALS_RANGE_SHIFT_NOTE,
        MidiAction::Phrase {
            kind: PhraseKind::VocalsRangeShift,
            target: PhraseTarget::All,
        },
    );
    map.insert(
        VOCALS_LYRIC_SHIFT_NOTE,
        MidiAction::Phrase {
            kind: PhraseKind::VocalsLyricShift,
            target: PhraseTarget::All,
        },
    );
    map.insert(
        VERSUS_PHRASE_PLAYER_1,
        MidiAction::VocalsPhrasePair {
            versus: PhraseKind::VersusPlayer1,
        },
    );
    map.insert(
        VERSUS_PHRASE_PLAYER_2,
        MidiAction::VocalsPhrasePair {
            versus: PhraseKind::VersusPlayer2,
        },
    );
    map.insert(VOCALS_PERCUSSION_NOTE, MidiAction::VocalsPercussion);
    for key in VOCALS_RANGE_START..=VOCALS_RANGE_END {
        map.insert(key, MidiAction::VocalsPitch);
    }
    map
}

fn build_pro_keys_note_map() -> NoteMap {
    const RANGE_SHIFTS: [(u8, PhraseKind); 6] = [
        (0, PhraseKind::ProKeysRangeShift0),
        (2, PhraseKind::ProKeysRangeShift1),
        (4, PhraseKind::ProKeysRangeShift2),
        (5, PhraseKind::ProKeysRangeShift3),
        (7, PhraseKind::ProKeysRangeShift4),
        (9, PhraseKind::ProKeysRangeShift5),
    ];

    let mut map = NoteMap::new();
    for (key, kind) in RANGE_SHIFTS {
        map.insert(
            key,
            MidiAction::Phrase {
                kind,
                target: PhraseTarget::Track,
            },
        );
    }
    map.insert(
        PRO_KEYS_GLISSANDO_NOTE,
        MidiAction::Phrase {
            kind: PhraseKind::ProKeysGlissando,
            target: PhraseTarget::Track,
        },
    );
    map.insert(
        TRILL_LANE_NOTE,
        MidiAction::Phrase {
            kind: PhraseKind::TrillLane,
            target: PhraseTarget::Track,
        },
    );
    for key in PRO_KEYS_RANGE_START..=PRO_KEYS_RANGE_END {
        map.insert(
            key,
            MidiAction::ProKeysKey {
                lane: u16::from(key - PRO_KEYS_RANGE_START),
            },
        );
    }
    map
}

fn build_phrase_map(game_mode: GameMode, star_power_note: u8) -> NoteMap {
    let (solo_note, versus_phrases, lane_phrases) = match game_mode {
        GameMode::Guitar => (Some(SOLO_NOTE), true, true),
        GameMode::GhlGuitar => (Some(SOLO_NOTE), false, false),
        GameMode::ProGuitar => (Some(SOLO_NOTE_PRO_GUITAR), false, true),
        GameMode::Drums => (Some(SOLO_NOTE), true, true),
        GameMode::Vocals => (None, false, false),
        // Pro-keys phrases are per-difficulty and live in the note map.
        GameMode::ProKeys => (Some(SOLO_NOTE_PRO_KEYS), false, false),
    };
    // When star power is overridden onto the legacy solo note, solos lose.
    let solo_note = solo_note.filter(|&solo| solo != star_power_note);

    let mut map = NoteMap::new();
    map.insert(
        star_power_note,
        MidiAction::Phrase {
            kind: PhraseKind::Starpower,
            target: PhraseTarget::All,
        },
    );
    if let Some(solo) = solo_note {
        map.insert(
            solo,
            MidiAction::Phrase {
                kind: PhraseKind::Solo,
                target: PhraseTarget::All,
            },
        );
    }
    if versus_phrases {
        map.insert(
            VERSUS_PHRASE_PLAYER_1,
            MidiAction::Phrase {
                kind: PhraseKind::VersusPlayer1,
                target: PhraseTarget::All,
            },
        );
        map.insert(
            VERSUS_PHRASE_PLAYER_2,
            MidiAction::Phrase {
                kind: PhraseKind::VersusPlayer2,
                target: PhraseTarget::All,
            },
        );
    }
    if lane_phrases {
        map.insert(
            TREMOLO_LANE_NOTE,
            MidiAction::LanePhrase {
                kind: PhraseKind::TremoloLane,
            },
        );
        map.insert(
            TRILL_LANE_NOTE,
            MidiAction::LanePhrase {
                kind: PhraseKind::TrillLane,
            },
        );
    }
    map
}
