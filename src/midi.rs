//! The Standard MIDI File front end.
//!
//! Each track chunk is consumed in one pass: note events pair through the
//! FIFO queue and dispatch through the per-mode note/phrase maps, text
//! events either reprogram the dispatch tables or copy into the chart, and
//! Phase Shift SysEx frames pair and dispatch like note events. Deferred
//! forcing lists drain once the track's notes are all in (SysEx list first,
//! so open-note overrides land before native forcing reprocesses the same
//! chords), then the mode's post-processors run.

mod process;
mod sysex;
mod venue;

use std::borrow::Cow;

use itertools::Itertools;
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

use crate::ParseOutput;
use crate::parse::deferred::{self, ForcedKind, PendingOp};
use crate::parse::pairing::PairingQueue;
use crate::parse::text_events::{
    self, LYRIC_PHRASE_END, LYRIC_PHRASE_START, LYRIC_PREFIX_WITH_SPACE,
};
use crate::parse::{ParseError, ParseWarning};
use crate::settings::ParseSettings;
use crate::song::{
    Difficulty, GameMode, Instrument, Note, NoteFlags, Phrase, Song, TextEvent, VenueEvent,
    make_pro_guitar_raw,
};
use crate::sync::BeatlineKind;

use self::process::{MidiAction, NoteMap, PhraseTarget, SysExAction, TextMarkerAction};
use self::sysex::PhaseShiftSysEx;

const BEAT_TRACK: &str = "BEAT";
const EVENTS_TRACK: &str = "EVENTS";
const VENUE_TRACK: &str = "VENUE";
const VOCALS_TRACK: &str = "PART VOCALS";
const PRO_KEYS_EXPERT_TRACK: &str = "PART REAL_KEYS_X";
const PRO_KEYS_HARD_TRACK: &str = "PART REAL_KEYS_H";
const PRO_KEYS_MEDIUM_TRACK: &str = "PART REAL_KEYS_M";
const PRO_KEYS_EASY_TRACK: &str = "PART REAL_KEYS_E";

/// Parses an already-read SMF into a song.
pub(crate) fn parse(smf: &Smf<'_>, mut settings: ParseSettings) -> Result<ParseOutput, ParseError> {
    let Timing::Metrical(ticks_per_beat) = smf.header.timing else {
        return Err(ParseError::UnsupportedTimeDivision);
    };
    if smf.tracks.is_empty() {
        return Err(ParseError::NoTracks);
    }

    let resolution = u32::from(ticks_per_beat.as_int());
    let mut song = Song::new(resolution);
    song.hopo_threshold = settings.midi_hopo_threshold(resolution);
    let sustain_cutoff = settings.midi_sustain_cutoff(resolution);
    settings.sustain_cutoff_threshold = Some(sustain_cutoff);

    let mut warnings = Vec::new();

    // All tempo data goes in first so tick-to-time works for every track.
    read_sync(smf, &mut song, &mut warnings);

    for track in &smf.tracks {
        if track.is_empty() {
            log::trace!("encountered an empty MIDI track");
            continue;
        }
        let name = track_name(track).unwrap_or_default();
        match name.as_str() {
            BEAT_TRACK => read_beats(track, &mut song, &mut warnings),
            EVENTS_TRACK => read_global_events(track, &mut song),
            VENUE_TRACK => read_venue(track, &mut song, &mut warnings),
            PRO_KEYS_EXPERT_TRACK => read_notes(
                &mut song,
                &mut settings,
                sustain_cutoff,
                track,
                Instrument::ProKeys,
                Some(Difficulty::Expert),
                &mut warnings,
            ),
            PRO_KEYS_HARD_TRACK => read_notes(
                &mut song,
                &mut settings,
                sustain_cutoff,
                track,
                Instrument::ProKeys,
                Some(Difficulty::Hard),
                &mut warnings,
            ),
            PRO_KEYS_MEDIUM_TRACK => read_notes(
                &mut song,
                &mut settings,
                sustain_cutoff,
                track,
                Instrument::ProKeys,
                Some(Difficulty::Medium),
                &mut warnings,
            ),
            PRO_KEYS_EASY_TRACK => read_notes(
                &mut song,
                &mut settings,
                sustain_cutoff,
                track,
                Instrument::ProKeys,
                Some(Difficulty::Easy),
                &mut warnings,
            ),
            _ => {
                if name == VOCALS_TRACK {
                    // Lyrics mirror into the global event list before the
                    // track parses as an instrument.
                    read_lyrics_into_global(track, &mut song);
                }

                let Some(instrument) = instrument_for_track(&name) else {
                    log::trace!("skipping unrecognized track {name}");
                    continue;
                };
                if song.instrument_has_chart(instrument) {
                    if !track_overrides_existing(&name) {
                        continue;
                    }
                    song.clear_instrument(instrument);
                }

                log::trace!("loading MIDI track {name}");
                read_notes(
                    &mut song,
                    &mut settings,
                    sustain_cutoff,
                    track,
                    instrument,
                    None,
                    &mut warnings,
                );
            }
        }
    }

    Ok(ParseOutput {
        song,
        settings,
        warnings,
    })
}

fn instrument_for_track(name: &str) -> Option<Instrument> {
    let instrument = match name {
        "PART GUITAR" | "T1 GEMS" => Instrument::Guitar,
        "PART GUITAR COOP" => Instrument::GuitarCoop,
        "PART BASS" => Instrument::Bass,
        "PART RHYTHM" => Instrument::Rhythm,
        "PART KEYS" => Instrument::Keys,
        "PART DRUMS" | "PART DRUM" | "PART REAL_DRUMS_PS" => Instrument::Drums,
        "PART GUITAR GHL" => Instrument::GhlGuitar,
        "PART BASS GHL" => Instrument::GhlBass,
        "PART RHYTHM GHL" => Instrument::GhlRhythm,
        "PART GUITAR COOP GHL" => Instrument::GhlCoop,
        "PART REAL_GUITAR" => Instrument::ProGuitar17Fret,
        "PART REAL_GUITAR_22" => Instrument::ProGuitar22Fret,
        "PART REAL_BASS" => Instrument::ProBass17Fret,
        "PART REAL_BASS_22" => Instrument::ProBass22Fret,
        "PART VOCALS" => Instrument::Vocals,
        "HARM1" | "PART HARM1" => Instrument::Harmony1,
        "HARM2" | "PART HARM2" => Instrument::Harmony2,
        "HARM3" | "PART HARM3" => Instrument::Harmony3,
        _ => return None,
    };
    Some(instrument)
}

/// Whether a track name replaces an already-loaded chart for its
/// instrument. Canonical names do; alias names (`T1 GEMS`, `PART DRUM`,
/// `PART REAL_DRUMS_PS`, `PART HARMn`) never clobber the canonical track.
fn track_overrides_existing(name: &str) -> bool {
    !matches!(
        name,
        "T1 GEMS" | "PART DRUM" | "PART REAL_DRUMS_PS" | "PART HARM1" | "PART HARM2" | "PART HARM3"
    )
}

fn track_name(track: &[TrackEvent<'_>]) -> Option<String> {
    track.iter().find_map(|event| match event.kind {
        TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
            Some(String::from_utf8_lossy(name).trim().to_owned())
        }
        _ => None,
    })
}

/// Text-bearing meta events, excluding the track name (reserved for track
/// identification) and copyright notices.
fn text_event_content<'a>(meta: &MetaMessage<'a>) -> Option<&'a [u8]> {
    match *meta {
        MetaMessage::Text(text)
        | MetaMessage::Lyric(text)
        | MetaMessage::Marker(text)
        | MetaMessage::CuePoint(text)
        | MetaMessage::ProgramName(text)
        | MetaMessage::InstrumentName(text)
        | MetaMessage::DeviceName(text) => Some(text),
        _ => None,
    }
}

fn read_sync(smf: &Smf<'_>, song: &mut Song, warnings: &mut Vec<ParseWarning>) {
    log::trace!("reading sync track");

    let mut tempos: Vec<(u32, f64)> = Vec::new();
    let mut time_signatures: Vec<(u32, u32, u32)> = Vec::new();
    for track in &smf.tracks {
        let mut tick = 0u64;
        for event in track {
            tick += u64::from(event.delta.as_int());
            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(us_per_beat)) => {
                    let bpm = 60_000_000.0 / f64::from(us_per_beat.as_int());
                    tempos.push((tick as u32, bpm));
                }
                TrackEventKind::Meta(MetaMessage::TimeSignature(
                    numerator,
                    denominator_exponent,
                    _,
                    _,
                )) => {
                    time_signatures.push((
                        tick as u32,
                        u32::from(numerator),
                        1u32 << denominator_exponent,
                    ));
                }
                _ => {}
            }
        }
    }
    // The sort is stable, so same-tick entries stay in file order and the
    // later one replaces the earlier.
    for (tick, bpm) in tempos.into_iter().sorted_by_key(|&(tick, _)| tick) {
        if song.sync.add_tempo(tick, bpm).is_err() {
            warnings.push(ParseWarning::SyncOutOfOrder { tick });
        }
    }
    for (tick, numerator, denominator) in time_signatures
        .into_iter()
        .sorted_by_key(|&(tick, ..)| tick)
    {
        if song.sync.add_time_signature(tick, numerator, denominator).is_err() {
            warnings.push(ParseWarning::SyncOutOfOrder { tick });
        }
    }
}

fn read_beats(track: &[TrackEvent<'_>], song: &mut Song, warnings: &mut Vec<ParseWarning>) {
    log::trace!("reading beat track");
    let mut tick = 0u64;
    for event in track {
        tick += u64::from(event.delta.as_int());
        if let TrackEventKind::Midi {
            message: MidiMessage::NoteOn { key, vel },
            ..
        } = event.kind
            && vel.as_int() > 0
        {
            let kind = match key.as_int() {
                process::BEAT_MEASURE => BeatlineKind::Measure,
                process::BEAT_STRONG => BeatlineKind::Strong,
                _ => continue,
            };
            if song.sync.add_beatline(tick as u32, kind).is_err() {
                warnings.push(ParseWarning::SyncOutOfOrder { tick: tick as u32 });
            }
        }
    }
}

fn read_global_events(track: &[TrackEvent<'_>], song: &mut Song) {
    log::trace!("reading global events");
    let mut tick = 0u64;
    for event in track {
        tick += u64::from(event.delta.as_int());
        if let TrackEventKind::Meta(meta) = &event.kind
            && let Some(raw) = text_event_content(meta)
        {
            let text = String::from_utf8_lossy(raw);
            let (event_text, _) = text_events::normalize(&text);
            if let Some(section) = text_events::parse_section(event_text) {
                song.add_section(TextEvent::new(tick as u32, section.to_owned()));
            } else {
                song.add_event(TextEvent::new(tick as u32, event_text.to_owned()));
            }
        }
    }
}

/// Mirrors the vocals track's lyrics and phrase markers into the global
/// event list.
fn read_lyrics_into_global(track: &[TrackEvent<'_>], song: &mut Song) {
    log::trace!("reading global lyrics");
    let mut tick = 0u64;
    for event in track {
        tick += u64::from(event.delta.as_int());
        match &event.kind {
            TrackEventKind::Meta(meta) => {
                if let Some(raw) = text_event_content(meta) {
                    let text = String::from_utf8_lossy(raw);
                    if !text.contains('[') {
                        song.add_event(TextEvent::new(
                            tick as u32,
                            format!("{LYRIC_PREFIX_WITH_SPACE}{text}"),
                        ));
                    }
                }
            }
            TrackEventKind::Midi { message, .. } => {
                let (key, is_on) = match *message {
                    MidiMessage::NoteOn { key, vel } => (key.as_int(), vel.as_int() > 0),
                    MidiMessage::NoteOff { key, .. } => (key.as_int(), false),
                    _ => continue,
                };
                if key == process::VERSUS_PHRASE_PLAYER_1 || key == process::VERSUS_PHRASE_PLAYER_2
                {
                    let marker = if is_on {
                        LYRIC_PHRASE_START
                    } else {
                        LYRIC_PHRASE_END
                    };
                    song.add_event(TextEvent::new(tick as u32, marker.to_owned()));
                }
            }
            _ => {}
        }
    }
}

fn read_venue(track: &[TrackEvent<'_>], song: &mut Song, warnings: &mut Vec<ParseWarning>) {
    log::trace!("reading venue track");
    let mut queue: PairingQueue<(u8, u8)> = PairingQueue::new();
    let mut tick = 0u64;
    for event in track {
        tick += u64::from(event.delta.as_int());
        let tick32 = tick as u32;
        match &event.kind {
            TrackEventKind::Midi { channel, message } => {
                let channel = channel.as_int();
                match *message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        let key = key.as_int();
                        if queue.contains(|&(k, c)| k == key && c == channel) {
                            warnings.push(ParseWarning::DuplicateNoteOn { tick: tick32 });
                        }
                        queue.push((key, channel), tick32);
                    }
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        let key = key.as_int();
                        let Some((_, start_tick)) =
                            queue.take(|&(k, c)| k == key && c == channel)
                        else {
                            warnings.push(ParseWarning::UnmatchedNoteOff { tick: tick32 });
                            continue;
                        };
                        if let Some((kind, text)) = venue::note_event(key) {
                            song.add_venue_event(VenueEvent::new(
                                start_tick,
                                tick32 - start_tick,
                                kind,
                                text.to_owned(),
                            ));
                        }
                    }
                    _ => {}
                }
            }
            TrackEventKind::Meta(meta) => {
                if let Some(raw) = text_event_content(meta) {
                    let text = String::from_utf8_lossy(raw);
                    let (normalized, _) = text_events::normalize(&text);
                    let (kind, converted) = venue::convert_text(normalized);
                    song.add_venue_event(VenueEvent::new(tick32, 0, kind, converted));
                }
            }
            _ => {}
        }
    }

    debug_assert!(
        queue.is_empty(),
        "venue track ended with {} unpaired note ons",
        queue.len()
    );
}

/// A note-on waiting for its note-off.
#[derive(Debug, Clone, Copy)]
struct QueuedNote {
    key: u8,
    channel: u8,
    velocity: u8,
}

/// A paired note event: the note-on's data with both ticks.
#[derive(Debug, Clone, Copy)]
struct TimedNote {
    channel: u8,
    velocity: u8,
    start_tick: u32,
    end_tick: u32,
}

impl TimedNote {
    const fn length(&self) -> u32 {
        self.end_tick - self.start_tick
    }
}

fn read_notes(
    song: &mut Song,
    settings: &mut ParseSettings,
    sustain_cutoff: u32,
    track: &[TrackEvent<'_>],
    instrument: Instrument,
    track_difficulty: Option<Difficulty>,
    warnings: &mut Vec<ParseWarning>,
) {
    let game_mode = instrument.game_mode();

    let mut note_map: &NoteMap = process::note_map(game_mode);
    let phrase_map: Cow<'_, NoteMap> = process::phrase_map(game_mode, settings.star_power_note);

    let mut note_queue: PairingQueue<QueuedNote> = PairingQueue::new();
    let mut sysex_queue: PairingQueue<PhaseShiftSysEx> = PairingQueue::new();
    // SysEx modifiers resolve before native forcing so an open-note
    // override is already in place when forcing recomputes types.
    let mut sysex_ops: Vec<PendingOp> = Vec::new();
    let mut forcing_ops: Vec<PendingOp> = Vec::new();

    let mut tick = 0u64;
    for event in track {
        tick += u64::from(event.delta.as_int());
        let tick32 = tick as u32;
        match &event.kind {
            TrackEventKind::Midi { channel, message } => {
                let channel = channel.as_int();
                match *message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        let key = key.as_int();
                        if note_queue.contains(|queued| {
                            queued.key == key && queued.channel == channel
                        }) {
                            warnings.push(ParseWarning::DuplicateNoteOn { tick: tick32 });
                        }
                        // The duplicate still queues; each start is closed
                        // by its own later end, FIFO.
                        note_queue.push(
                            QueuedNote {
                                key,
                                channel,
                                velocity: vel.as_int(),
                            },
                            tick32,
                        );
                    }
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        let key = key.as_int();
                        let Some((start, start_tick)) = note_queue
                            .take(|queued| queued.key == key && queued.channel == channel)
                        else {
                            warnings.push(ParseWarning::UnmatchedNoteOff { tick: tick32 });
                            continue;
                        };
                        let timed = TimedNote {
                            channel: start.channel,
                            velocity: start.velocity,
                            start_tick,
                            end_tick: tick32,
                        };
                        if let Some(&action) =
                            note_map.get(&key).or_else(|| phrase_map.get(&key))
                        {
                            apply_action(
                                song,
                                instrument,
                                track_difficulty,
                                sustain_cutoff,
                                &mut forcing_ops,
                                warnings,
                                action,
                                key,
                                &timed,
                            );
                        }
                    }
                    _ => {}
                }
            }
            TrackEventKind::Meta(meta) => {
                if let Some(raw) = text_event_content(meta) {
                    let text = String::from_utf8_lossy(raw);
                    let (normalized, had_brackets) = text_events::normalize(&text);
                    if let Some(marker) = process::text_marker_action(game_mode, normalized) {
                        // Reprograms parsing; the marker itself never lands
                        // in the chart.
                        note_map = match marker {
                            TextMarkerAction::EnhancedOpens => process::guitar_enhanced_opens_map(),
                            TextMarkerAction::ChartDynamics => process::drums_velocity_map(),
                        };
                        continue;
                    }
                    // On vocals, bare text is almost always a lyric.
                    let event_text = if !had_brackets && game_mode == GameMode::Vocals {
                        format!("{LYRIC_PREFIX_WITH_SPACE}{normalized}")
                    } else {
                        normalized.to_owned()
                    };
                    for &difficulty in &Difficulty::ALL {
                        song.chart_mut(instrument, difficulty)
                            .events
                            .push(TextEvent::new(tick32, event_text.clone()));
                    }
                }
            }
            TrackEventKind::SysEx(data) => {
                process_sysex(
                    game_mode,
                    data,
                    tick32,
                    &mut sysex_queue,
                    &mut sysex_ops,
                    warnings,
                );
            }
            _ => {}
        }
    }

    debug_assert!(
        note_queue.is_empty(),
        "track for {instrument:?} ended with {} unpaired note ons",
        note_queue.len()
    );
    debug_assert!(
        sysex_queue.is_empty(),
        "track for {instrument:?} ended with {} unpaired SysEx starts",
        sysex_queue.len()
    );

    deferred::drain(sysex_ops, song, instrument);
    deferred::drain(forcing_ops, song, instrument);

    match game_mode {
        GameMode::Guitar => {
            deferred::fixup_legacy_star_power(song, instrument, settings.star_power_note);
        }
        GameMode::Drums => {
            deferred::disambiguate_drums_type(song, instrument, &mut settings.drums_type);
        }
        GameMode::Vocals => deferred::copy_down_harmony_phrases(song, instrument),
        GameMode::GhlGuitar | GameMode::ProGuitar | GameMode::ProKeys => {}
    }
}

fn process_sysex(
    game_mode: GameMode,
    data: &[u8],
    tick: u32,
    queue: &mut PairingQueue<PhaseShiftSysEx>,
    sysex_ops: &mut Vec<PendingOp>,
    warnings: &mut Vec<ParseWarning>,
) {
    let Some(frame) = PhaseShiftSysEx::parse(data) else {
        warnings.push(ParseWarning::UnknownSysEx { tick });
        return;
    };
    if frame.sysex_type != sysex::TYPE_PHRASE {
        warnings.push(ParseWarning::UnknownSysExType {
            tick,
            sysex_type: frame.sysex_type,
        });
        return;
    }

    match frame.value {
        sysex::VALUE_PHRASE_START => {
            if queue.contains(|queued| queued.matches_with(&frame)) {
                warnings.push(ParseWarning::DuplicateSysExStart { tick });
            }
            queue.push(frame, tick);
        }
        sysex::VALUE_PHRASE_END => {
            let Some((start, start_tick)) = queue.take(|queued| queued.matches_with(&frame))
            else {
                warnings.push(ParseWarning::UnmatchedSysExEnd { tick });
                return;
            };
            let Some(action) = process::sysex_action(game_mode, start.code) else {
                return;
            };
            match action {
                SysExAction::OpenNote => {
                    // Open-note phrases exclude their end tick.
                    let end_tick = exclusive_end(start_tick, tick);
                    for &difficulty in start.target_difficulties() {
                        sysex_ops.push(PendingOp::OpenNote {
                            start_tick,
                            end_tick,
                            difficulty,
                        });
                    }
                }
                SysExAction::Tap => {
                    // Tap phrases keep their end tick, unlike every other
                    // range marker.
                    for &difficulty in start.target_difficulties() {
                        sysex_ops.push(PendingOp::ForcedType {
                            start_tick,
                            end_tick: tick,
                            difficulty,
                            kind: ForcedKind::Tap,
                        });
                    }
                }
            }
        }
        _ => {}
    }
}

#[expect(clippy::too_many_arguments)]
fn apply_action(
    song: &mut Song,
    instrument: Instrument,
    track_difficulty: Option<Difficulty>,
    sustain_cutoff: u32,
    forcing_ops: &mut Vec<PendingOp>,
    warnings: &mut Vec<ParseWarning>,
    action: MidiAction,
    key: u8,
    timed: &TimedNote,
) {
    let tick = timed.start_tick;
    match action {
        MidiAction::Note {
            difficulty,
            lane,
            default_flags,
        } => {
            let sustain = apply_cutoff(timed.length(), sustain_cutoff);
            song.chart_mut(instrument, difficulty)
                .insert_note_from_back(Note::new(tick, lane, sustain, default_flags));
        }
        MidiAction::VelocityDrumNote {
            difficulty,
            lane,
            default_flags,
        } => {
            let mut flags = default_flags;
            match timed.velocity {
                process::VELOCITY_ACCENT => flags.insert(NoteFlags::PRO_DRUMS_ACCENT),
                process::VELOCITY_GHOST => flags.insert(NoteFlags::PRO_DRUMS_GHOST),
                _ => {}
            }
            let sustain = apply_cutoff(timed.length(), sustain_cutoff);
            song.chart_mut(instrument, difficulty)
                .insert_note_from_back(Note::new(tick, lane, sustain, flags));
        }
        MidiAction::ProGuitarNote { difficulty, string } => {
            if timed.velocity < 100 {
                warnings.push(ParseWarning::InvalidProGuitarVelocity {
                    tick,
                    velocity: timed.velocity,
                });
                return;
            }
            let fret = u16::from(timed.velocity - 100);
            let raw = make_pro_guitar_raw(string, fret);
            let flags = if timed.channel == process::PRO_GUITAR_CHANNEL_MUTED {
                NoteFlags::PRO_GUITAR_MUTED
            } else {
                NoteFlags::NONE
            };
            let sustain = apply_cutoff(timed.length(), sustain_cutoff);
            song.chart_mut(instrument, difficulty)
                .insert_note_from_back(Note::new(tick, raw, sustain, flags));
        }
        MidiAction::VocalsPitch => {
            for &difficulty in &Difficulty::ALL {
                song.chart_mut(instrument, difficulty).insert_note_from_back(Note::new(
                    tick,
                    u16::from(key),
                    timed.length(),
                    NoteFlags::NONE,
                ));
            }
        }
        MidiAction::VocalsPercussion => {
            for &difficulty in &Difficulty::ALL {
                song.chart_mut(instrument, difficulty).insert_note_from_back(Note::new(
                    tick,
                    0,
                    0,
                    NoteFlags::VOCALS_PERCUSSION,
                ));
            }
        }
        MidiAction::ProKeysKey { lane } => {
            let Some(difficulty) = track_difficulty else {
                debug_assert!(false, "pro keys notes require a track difficulty");
                return;
            };
            let sustain = apply_cutoff(timed.length(), sustain_cutoff);
            song.chart_mut(instrument, difficulty)
                .insert_note_from_back(Note::new(tick, lane, sustain, NoteFlags::NONE));
        }
        MidiAction::Phrase { kind, target } => {
            let phrase = Phrase::new(tick, timed.length(), kind);
            match (target, track_difficulty) {
                (PhraseTarget::Track, Some(difficulty)) => {
                    song.chart_mut(instrument, difficulty)
                        .insert_phrase_from_back(phrase);
                }
                _ => {
                    for &difficulty in &Difficulty::ALL {
                        song.chart_mut(instrument, difficulty)
                            .insert_phrase_from_back(phrase);
                    }
                }
            }
        }
        MidiAction::LanePhrase { kind } => {
            let phrase = Phrase::new(tick, timed.length(), kind);
            song.chart_mut(instrument, Difficulty::Expert)
                .insert_phrase_from_back(phrase);
            // A velocity in 41..=50 extends the lane to Hard.
            if (41..=50).contains(&timed.velocity) {
                song.chart_mut(instrument, Difficulty::Hard)
                    .insert_phrase_from_back(phrase);
            }
        }
        MidiAction::VocalsPhrasePair { versus } => {
            for &difficulty in &Difficulty::ALL {
                let chart = song.chart_mut(instrument, difficulty);
                chart.insert_phrase_from_back(Phrase::new(tick, timed.length(), versus));
                chart.insert_phrase_from_back(Phrase::new(
                    tick,
                    timed.length(),
                    crate::song::PhraseKind::VocalsLyricPhrase,
                ));
            }
        }
        MidiAction::ForcedType { difficulty, kind } => {
            // Forced ranges exclude their end tick; taps via SysEx are the
            // only inclusive ranges, and they never come through here.
            let end_tick = exclusive_end(timed.start_tick, timed.end_tick);
            match difficulty {
                Some(difficulty) => forcing_ops.push(PendingOp::ForcedType {
                    start_tick: tick,
                    end_tick,
                    difficulty,
                    kind,
                }),
                None => {
                    for &difficulty in &Difficulty::ALL {
                        forcing_ops.push(PendingOp::ForcedType {
                            start_tick: tick,
                            end_tick,
                            difficulty,
                            kind,
                        });
                    }
                }
            }
        }
        MidiAction::FlagToggle { flags, lane } => {
            let end_tick = exclusive_end(timed.start_tick, timed.end_tick);
            forcing_ops.push(PendingOp::FlagToggle {
                start_tick: tick,
                end_tick,
                flags,
                lane: Some(lane),
            });
        }
    }
}

fn apply_cutoff(length: u32, sustain_cutoff: u32) -> u32 {
    if length < sustain_cutoff { 0 } else { length }
}

const fn exclusive_end(start_tick: u32, end_tick: u32) -> u32 {
    if end_tick > start_tick {
        end_tick - 1
    } else {
        end_tick
    }
}
