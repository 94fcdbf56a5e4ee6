//! Deferred modifier resolution and track post-processing.
//!
//! Forcing markers, open-note overrides, and drum flag toggles arrive as
//! phrases over a tick range, but whether a note is a chord or a natural
//! HOPO depends on neighbors that may not be inserted yet. Each marker is
//! therefore recorded as a [`PendingOp`] and drained only after the whole
//! track's notes are loaded. SysEx-driven ops live in a separate list that
//! drains first, so a SysEx open-note override is in place before native
//! forcing recomputes types over the same chord.

use crate::settings::DrumsType;
use crate::song::{
    Difficulty, GameMode, GhlFret, GuitarFret, Instrument, NoteFlags, PhraseKind, Song,
    note::{is_chord_member, is_hopo, is_natural_hopo},
};

/// The three forced note types a range marker can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedKind {
    Strum,
    Hopo,
    Tap,
}

/// A modifier recorded during the event scan, applied after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOp {
    /// Force every non-tap note in the range to the given type.
    ForcedType {
        start_tick: u32,
        end_tick: u32,
        difficulty: Difficulty,
        kind: ForcedKind,
    },
    /// Reassign every note in the range to the open lane.
    OpenNote {
        start_tick: u32,
        end_tick: u32,
        difficulty: Difficulty,
    },
    /// XOR flags onto notes in the range, on every difficulty. `lane`
    /// restricts the toggle to one pad; `None` hits the whole chord.
    FlagToggle {
        start_tick: u32,
        end_tick: u32,
        flags: NoteFlags,
        lane: Option<u16>,
    },
}

/// Applies a list of pending operations in encounter order.
pub fn drain(ops: Vec<PendingOp>, song: &mut Song, instrument: Instrument) {
    for op in ops {
        match op {
            PendingOp::ForcedType {
                start_tick,
                end_tick,
                difficulty,
                kind,
            } => apply_forced_type(song, instrument, difficulty, start_tick, end_tick, kind),
            PendingOp::OpenNote {
                start_tick,
                end_tick,
                difficulty,
            } => apply_open_note(song, instrument, difficulty, start_tick, end_tick),
            PendingOp::FlagToggle {
                start_tick,
                end_tick,
                flags,
                lane,
            } => apply_flag_toggle(song, instrument, start_tick, end_tick, flags, lane),
        }
    }
}

fn apply_forced_type(
    song: &mut Song,
    instrument: Instrument,
    difficulty: Difficulty,
    start_tick: u32,
    end_tick: u32,
    kind: ForcedKind,
) {
    // Drum forcing markers are flag toggles, never range forcing.
    if instrument.game_mode() == GameMode::Drums {
        return;
    }

    let hopo_threshold = song.hopo_threshold;
    let chart = song.chart_mut(instrument, difficulty);
    for index in chart.notes_in_range(start_tick, end_tick) {
        if chart.notes[index].flags.contains(NoteFlags::TAP) {
            // Tap marking overrides all other forcing.
            continue;
        }

        let chord = is_chord_member(&chart.notes, index);
        let natural_hopo = is_natural_hopo(&chart.notes, index, hopo_threshold);
        let flags = &mut chart.notes[index].flags;
        match kind {
            ForcedKind::Strum => {
                flags.insert(NoteFlags::FORCED_STRUM);
                flags.remove(NoteFlags::FORCED_HOPO);
                if !chord && natural_hopo {
                    flags.insert(NoteFlags::FORCED);
                } else {
                    flags.remove(NoteFlags::FORCED);
                }
            }
            ForcedKind::Hopo => {
                flags.insert(NoteFlags::FORCED_HOPO);
                flags.remove(NoteFlags::FORCED_STRUM);
                if chord || !natural_hopo {
                    flags.insert(NoteFlags::FORCED);
                } else {
                    flags.remove(NoteFlags::FORCED);
                }
            }
            ForcedKind::Tap => {
                flags.insert(NoteFlags::TAP);
                flags.remove(NoteFlags::FORCED);
            }
        }

        debug_assert_eq!(
            resulting_kind(&chart.notes, index, hopo_threshold),
            kind,
            "forced type did not take at tick {}",
            chart.notes[index].tick
        );
    }
}

/// What type the note at `index` now plays as.
fn resulting_kind(
    notes: &[crate::song::Note],
    index: usize,
    hopo_threshold: u32,
) -> ForcedKind {
    if notes[index].flags.contains(NoteFlags::TAP) {
        ForcedKind::Tap
    } else if is_hopo(notes, index, hopo_threshold) {
        ForcedKind::Hopo
    } else {
        ForcedKind::Strum
    }
}

fn apply_open_note(
    song: &mut Song,
    instrument: Instrument,
    difficulty: Difficulty,
    start_tick: u32,
    end_tick: u32,
) {
    let game_mode = instrument.game_mode();
    let open = match game_mode {
        GameMode::Guitar => GuitarFret::Open as u16,
        GameMode::GhlGuitar => GhlFret::Open as u16,
        _ => {
            debug_assert!(false, "open note modifier on unsupported mode {game_mode:?}");
            return;
        }
    };
    let chart = song.chart_mut(instrument, difficulty);
    for index in chart.notes_in_range(start_tick, end_tick) {
        chart.notes[index].raw = open;
    }
}

fn apply_flag_toggle(
    song: &mut Song,
    instrument: Instrument,
    start_tick: u32,
    end_tick: u32,
    flags: NoteFlags,
    lane: Option<u16>,
) {
    for &difficulty in &Difficulty::ALL {
        let chart = song.chart_mut(instrument, difficulty);
        for index in chart.notes_in_range(start_tick, end_tick) {
            let note = &mut chart.notes[index];
            if lane.is_none_or(|lane| note.raw == lane) {
                note.flags.toggle(flags);
            }
        }
    }
}

/// Instruments that historically encoded star power with the solo marker.
const LEGACY_STAR_POWER_WHITELIST: [Instrument; 4] = [
    Instrument::Guitar,
    Instrument::GuitarCoop,
    Instrument::Bass,
    Instrument::Rhythm,
];

/// Reinterprets Solo phrases as Starpower for charts that predate a
/// dedicated star-power marker: applies only when the instrument is on the
/// legacy whitelist, no star-power note override is configured, and the
/// chart has solos but no star power at all.
pub fn fixup_legacy_star_power(
    song: &mut Song,
    instrument: Instrument,
    star_power_note: Option<u8>,
) {
    if star_power_note.is_some() {
        return;
    }
    if !LEGACY_STAR_POWER_WHITELIST.contains(&instrument) {
        return;
    }

    // Phrases are fanned out to every difficulty, so one is enough to probe.
    let Some(chart) = song.chart(instrument, Difficulty::Expert) else {
        return;
    };
    let has_star_power = chart
        .phrases
        .iter()
        .any(|phrase| phrase.kind == PhraseKind::Starpower);
    let has_solo = chart
        .phrases
        .iter()
        .any(|phrase| phrase.kind == PhraseKind::Solo);
    if has_star_power || !has_solo {
        return;
    }

    for &difficulty in &Difficulty::ALL {
        let chart = song.chart_mut(instrument, difficulty);
        for phrase in &mut chart.phrases {
            if phrase.kind == PhraseKind::Solo {
                phrase.kind = PhraseKind::Starpower;
            }
        }
    }
}

/// Infers the drum kit layout when it was not configured. A green pad
/// anywhere means five-lane; otherwise a tom (non-kick pad without the
/// cymbal flag, red aside) means four-lane; four-lane when nothing signals.
/// Scan order is ascending difficulty, then note order.
pub fn disambiguate_drums_type(song: &Song, instrument: Instrument, drums_type: &mut DrumsType) {
    use crate::song::DrumPad;

    if *drums_type != DrumsType::Unknown {
        return;
    }

    let charts = Difficulty::ALL
        .iter()
        .filter_map(|&difficulty| song.chart(instrument, difficulty));

    // The green check outranks the tom check: a five-lane kit has toms too.
    for chart in charts.clone() {
        if chart
            .notes
            .iter()
            .any(|note| note.raw == DrumPad::Green as u16)
        {
            *drums_type = DrumsType::FiveLane;
            return;
        }
    }
    for chart in charts {
        if chart.notes.iter().any(|note| {
            note.raw != DrumPad::Kick as u16
                && note.raw != DrumPad::Red as u16
                && !note.flags.contains(NoteFlags::PRO_DRUMS_CYMBAL)
        }) {
            *drums_type = DrumsType::FourLane;
            return;
        }
    }
    *drums_type = DrumsType::FourLane;
}

/// Harmony parts 2 and 3 are rhythmically identical to part 1 by convention;
/// their parsed phrases are discarded in favor of a copy of part 1's.
pub fn copy_down_harmony_phrases(song: &mut Song, instrument: Instrument) {
    if !matches!(instrument, Instrument::Harmony2 | Instrument::Harmony3) {
        return;
    }

    for &difficulty in &Difficulty::ALL {
        let phrases = song
            .chart(Instrument::Harmony1, difficulty)
            .map(|chart| chart.phrases.clone())
            .unwrap_or_default();
        if phrases.is_empty() && song.chart(instrument, difficulty).is_none() {
            continue;
        }
        song.chart_mut(instrument, difficulty).phrases = phrases;
    }
}
