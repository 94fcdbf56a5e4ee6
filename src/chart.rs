//! The `.chart` text format front end.
//!
//! `.chart` files are a sequence of `[Name] { ... }` blocks. `[Song]` holds
//! metadata and must come first (the resolution is needed before any tick
//! math), `[SyncTrack]` second. `[Events]` and the per-track
//! `[<Difficulty><Instrument>]` blocks may follow in any order.
//!
//! Malformed lines warn and are skipped; a track that cannot be loaded at
//! all clears its chart rather than leaving it half-built.

mod process;

use crate::ParseOutput;
use crate::parse::flag_priority::NoteFlagPriority;
use crate::parse::text_events::{self, SOLO_END, SOLO_START};
use crate::parse::{ParseError, ParseWarning, deferred};
use crate::settings::ParseSettings;
use crate::song::{
    Chart, Difficulty, GameMode, Instrument, Note, Phrase, PhraseKind, Song, TextEvent,
};

use self::process::NoteAction;

const SECTION_SONG: &str = "Song";
const SECTION_SYNC_TRACK: &str = "SyncTrack";
const SECTION_EVENTS: &str = "Events";

const DEFAULT_RESOLUTION: u32 = 192;

const DIFFICULTY_NAMES: [(&str, Difficulty); 4] = [
    ("Easy", Difficulty::Easy),
    ("Medium", Difficulty::Medium),
    ("Hard", Difficulty::Hard),
    ("Expert", Difficulty::Expert),
];

const INSTRUMENT_NAMES: [(&str, Instrument); 10] = [
    ("Single", Instrument::Guitar),
    ("DoubleGuitar", Instrument::GuitarCoop),
    ("DoubleBass", Instrument::Bass),
    ("DoubleRhythm", Instrument::Rhythm),
    ("Drums", Instrument::Drums),
    ("Keyboard", Instrument::Keys),
    ("GHLGuitar", Instrument::GhlGuitar),
    ("GHLBass", Instrument::GhlBass),
    ("GHLRhythm", Instrument::GhlRhythm),
    ("GHLCoop", Instrument::GhlCoop),
];

/// Parses `.chart` text into a song.
pub(crate) fn parse(text: &str, mut settings: ParseSettings) -> Result<ParseOutput, ParseError> {
    let mut warnings = Vec::new();
    let mut blocks = BlockReader::new(text);

    // [Song] first: the resolution is needed before anything else.
    let block = blocks
        .next_block()?
        .ok_or(ParseError::MissingSection { name: SECTION_SONG })?;
    if block.name != SECTION_SONG {
        return Err(ParseError::SectionOrder {
            expected: SECTION_SONG,
            found: block.name.to_owned(),
        });
    }
    let (metadata, resolution) = read_song_block(&block.lines, &mut warnings);

    let mut song = Song::new(resolution);
    song.metadata = metadata;
    song.hopo_threshold = settings.chart_hopo_threshold(resolution);
    let sustain_cutoff = settings.chart_sustain_cutoff(resolution);
    settings.sustain_cutoff_threshold = Some(sustain_cutoff);

    // [SyncTrack] second: tick-to-time conversion for everything after.
    let block = blocks.next_block()?.ok_or(ParseError::MissingSection {
        name: SECTION_SYNC_TRACK,
    })?;
    if block.name != SECTION_SYNC_TRACK {
        return Err(ParseError::SectionOrder {
            expected: SECTION_SYNC_TRACK,
            found: block.name.to_owned(),
        });
    }
    read_sync_block(&mut song, &block.lines, &mut warnings);

    while let Some(block) = blocks.next_block()? {
        if block.name == SECTION_EVENTS {
            log::trace!("loading events data");
            read_events_block(&mut song, &block.lines, &mut warnings);
        } else if let Some((instrument, difficulty)) = match_track_header(block.name) {
            log::debug!("loading data for {difficulty:?} {instrument:?}");
            load_track(
                &mut song,
                sustain_cutoff,
                &block.lines,
                instrument,
                difficulty,
                &mut warnings,
            );
        } else {
            log::trace!("skipping unrecognized section [{}]", block.name);
        }
    }

    // Drums sections arrive one difficulty at a time, so the kit layout can
    // only be inferred once every block is in.
    if song.instrument_has_chart(Instrument::Drums) {
        deferred::disambiguate_drums_type(&song, Instrument::Drums, &mut settings.drums_type);
    }

    Ok(ParseOutput {
        song,
        settings,
        warnings,
    })
}

/// A `[Name] { ... }` block with 1-based source line numbers.
struct Block<'a> {
    name: &'a str,
    lines: Vec<(usize, &'a str)>,
}

/// Walks the file block by block: Idle until a `[Name]` header, then the
/// `{`, then collecting raw lines until the matching `}`.
struct BlockReader<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> BlockReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
        }
    }

    fn next_block(&mut self) -> Result<Option<Block<'a>>, ParseError> {
        // Idle: scan for the next section header, ignoring anything else.
        let name = loop {
            let Some((_, line)) = self.lines.next() else {
                return Ok(None);
            };
            let line = line.trim();
            if line.len() >= 2 && line.starts_with('[') && line.ends_with(']') {
                break line[1..line.len() - 1].trim();
            }
        };

        // Open: the body must start before any other content.
        loop {
            let Some((_, line)) = self.lines.next() else {
                return Err(ParseError::MissingBlockBody {
                    name: name.to_owned(),
                });
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "{" {
                break;
            }
            return Err(ParseError::MissingBlockBody {
                name: name.to_owned(),
            });
        }

        // InBlock: collect until the closing brace.
        let mut lines = Vec::new();
        loop {
            let Some((index, line)) = self.lines.next() else {
                return Err(ParseError::UnterminatedBlock {
                    name: name.to_owned(),
                });
            };
            let line = line.trim();
            if line == "}" {
                return Ok(Some(Block { name, lines }));
            }
            if !line.is_empty() {
                lines.push((index + 1, line));
            }
        }
    }
}

fn match_track_header(name: &str) -> Option<(Instrument, Difficulty)> {
    let &(difficulty_name, difficulty) = DIFFICULTY_NAMES
        .iter()
        .find(|(prefix, _)| name.starts_with(prefix))?;
    let &(_, instrument) = INSTRUMENT_NAMES
        .iter()
        .find(|(suffix, _)| name.ends_with(suffix) && name.len() > difficulty_name.len())?;
    Some((instrument, difficulty))
}

fn read_song_block(lines: &[(usize, &str)], warnings: &mut Vec<ParseWarning>) -> (crate::song::Metadata, u32) {
    let mut metadata = crate::song::Metadata::default();
    let mut resolution = DEFAULT_RESOLUTION;

    for &(line_number, line) in lines {
        let Some((key, value)) = line.split_once('=') else {
            warnings.push(ParseWarning::MalformedLine {
                line: line_number,
                message: "expected `key = value`".to_owned(),
            });
            continue;
        };
        let key = key.trim();
        let value = text_events::trim_quotes(value);

        let mut bad_number = false;
        match key {
            "Name" => metadata.name = Some(value.to_owned()),
            "Artist" => metadata.artist = Some(value.to_owned()),
            "Album" => metadata.album = Some(value.to_owned()),
            "Genre" => metadata.genre = Some(value.to_owned()),
            "Year" => {
                let digits: String = value.chars().filter(char::is_ascii_digit).collect();
                metadata.year = Some(digits);
            }
            "Charter" => metadata.charter = Some(value.to_owned()),
            "Offset" => match value.parse() {
                Ok(offset) => metadata.offset = offset,
                Err(_) => bad_number = true,
            },
            "Resolution" => match parse_uint(value) {
                Some(parsed) => resolution = parsed,
                None => bad_number = true,
            },
            "Difficulty" => match value.parse() {
                Ok(difficulty) => metadata.difficulty = difficulty,
                Err(_) => bad_number = true,
            },
            "PreviewStart" => match value.parse() {
                Ok(start) => metadata.preview_start = start,
                Err(_) => bad_number = true,
            },
            "PreviewEnd" => match value.parse() {
                Ok(end) => metadata.preview_end = end,
                Err(_) => bad_number = true,
            },
            "MediaType" => metadata.media_type = Some(value.to_owned()),
            "MusicStream" => metadata.music_stream = Some(value.to_owned()),
            "GuitarStream" => metadata.guitar_stream = Some(value.to_owned()),
            "BassStream" => metadata.bass_stream = Some(value.to_owned()),
            "RhythmStream" => metadata.rhythm_stream = Some(value.to_owned()),
            "DrumStream" => metadata.drum_stream = Some(value.to_owned()),
            "Player2" => metadata.player2 = Some(value.to_owned()),
            _ => {}
        }
        if bad_number {
            warnings.push(ParseWarning::MalformedLine {
                line: line_number,
                message: format!("invalid numeric value for {key}"),
            });
        }
    }

    (metadata, resolution)
}

fn read_sync_block(song: &mut Song, lines: &[(usize, &str)], warnings: &mut Vec<ParseWarning>) {
    let mut prev_tick = 0u32;
    for &(line_number, line) in lines {
        let Some((tick, remaining)) = split_tick(line) else {
            warnings.push(ParseWarning::MalformedLine {
                line: line_number,
                message: "expected `tick = type args`".to_owned(),
            });
            continue;
        };
        if tick < prev_tick {
            warnings.push(ParseWarning::TickOutOfOrder { line: line_number });
            continue;
        }
        prev_tick = tick;

        let (type_code, remaining) = next_word(remaining);
        match type_code {
            "B" => {
                let (value, _) = next_word(remaining);
                match parse_uint(value) {
                    // Tempo values are thousandths of a BPM.
                    Some(milli_bpm) => {
                        if song
                            .sync
                            .add_tempo(tick, f64::from(milli_bpm) / 1000.0)
                            .is_err()
                        {
                            warnings.push(ParseWarning::SyncOutOfOrder { tick });
                        }
                    }
                    None => warnings.push(ParseWarning::MalformedLine {
                        line: line_number,
                        message: "invalid tempo value".to_owned(),
                    }),
                }
            }
            "TS" => {
                let (numerator, remaining) = next_word(remaining);
                let Some(numerator) = parse_uint(numerator) else {
                    warnings.push(ParseWarning::MalformedLine {
                        line: line_number,
                        message: "invalid time signature numerator".to_owned(),
                    });
                    continue;
                };
                // The optional second field is the denominator's exponent.
                let (exponent, _) = next_word(remaining);
                let exponent = if exponent.is_empty() {
                    2
                } else {
                    match parse_uint(exponent) {
                        Some(exponent) => exponent,
                        None => {
                            warnings.push(ParseWarning::MalformedLine {
                                line: line_number,
                                message: "invalid time signature denominator".to_owned(),
                            });
                            continue;
                        }
                    }
                };
                let denominator = 2u32.saturating_pow(exponent);
                if song
                    .sync
                    .add_time_signature(tick, numerator, denominator)
                    .is_err()
                {
                    warnings.push(ParseWarning::SyncOutOfOrder { tick });
                }
            }
            // Anchors pin a tempo change to an absolute time; playback does
            // not need them.
            "A" => {}
            _ => warnings.push(ParseWarning::UnrecognizedTypeCode {
                line: line_number,
                code: type_code.to_owned(),
            }),
        }
    }
}

fn read_events_block(song: &mut Song, lines: &[(usize, &str)], warnings: &mut Vec<ParseWarning>) {
    let mut prev_tick = 0u32;
    for &(line_number, line) in lines {
        let Some((tick, remaining)) = split_tick(line) else {
            warnings.push(ParseWarning::MalformedLine {
                line: line_number,
                message: "expected `tick = E text`".to_owned(),
            });
            continue;
        };
        if tick < prev_tick {
            warnings.push(ParseWarning::TickOutOfOrder { line: line_number });
            continue;
        }
        prev_tick = tick;

        let (type_code, remaining) = next_word(remaining);
        if type_code != "E" {
            warnings.push(ParseWarning::UnrecognizedTypeCode {
                line: line_number,
                code: type_code.to_owned(),
            });
            continue;
        }

        let (event_text, _) = text_events::normalize(text_events::trim_quotes(remaining));
        if let Some(section) = text_events::parse_section(event_text) {
            song.add_section(TextEvent::new(tick, section.to_owned()));
        } else {
            song.add_event(TextEvent::new(tick, event_text.to_owned()));
        }
    }
}

/// A chord or lane flag waiting for the track's notes to finish loading.
struct DeferredFlag {
    tick: u32,
    /// `None` applies to the whole chord at the tick.
    lane: Option<u16>,
    priority: &'static NoteFlagPriority,
}

fn load_track(
    song: &mut Song,
    sustain_cutoff: u32,
    lines: &[(usize, &str)],
    instrument: Instrument,
    difficulty: Difficulty,
    warnings: &mut Vec<ParseWarning>,
) {
    if let Err(message) = try_load_track(
        song,
        sustain_cutoff,
        lines,
        instrument,
        difficulty,
        warnings,
    ) {
        // Do not leave a half-built chart behind.
        warnings.push(ParseWarning::TrackDropped {
            message: message.clone(),
        });
        log::warn!("error parsing section for {difficulty:?} {instrument:?}: {message}");
        song.chart_mut(instrument, difficulty).clear();
    }
}

fn try_load_track(
    song: &mut Song,
    sustain_cutoff: u32,
    lines: &[(usize, &str)],
    instrument: Instrument,
    difficulty: Difficulty,
    warnings: &mut Vec<ParseWarning>,
) -> Result<(), String> {
    let game_mode = instrument.game_mode();
    if matches!(
        game_mode,
        GameMode::ProGuitar | GameMode::ProKeys | GameMode::Vocals
    ) {
        return Err(format!("no .chart note table for game mode {game_mode:?}"));
    }

    let mut deferred_flags = Vec::new();
    let chart = song.chart_mut(instrument, difficulty);

    let mut prev_tick = 0u32;
    for &(line_number, line) in lines {
        let Some((tick, remaining)) = split_tick(line) else {
            warnings.push(ParseWarning::MalformedLine {
                line: line_number,
                message: "expected `tick = type args`".to_owned(),
            });
            continue;
        };
        if tick < prev_tick {
            warnings.push(ParseWarning::TickOutOfOrder { line: line_number });
            continue;
        }
        prev_tick = tick;

        let (type_code, remaining) = next_word(remaining);
        match type_code {
            "N" => {
                let (code, remaining) = next_word(remaining);
                let (length, _) = next_word(remaining);
                let (Some(code), Some(length)) = (parse_uint(code), parse_uint(length)) else {
                    warnings.push(ParseWarning::MalformedLine {
                        line: line_number,
                        message: "invalid note code or length".to_owned(),
                    });
                    continue;
                };
                match process::note_action(game_mode, code) {
                    Some(NoteAction::Note {
                        lane,
                        default_flags,
                    }) => {
                        let sustain = if length < sustain_cutoff { 0 } else { length };
                        chart.push_note(Note::new(tick, lane, sustain, default_flags));
                    }
                    Some(NoteAction::ChordFlag(priority)) => deferred_flags.push(DeferredFlag {
                        tick,
                        lane: None,
                        priority,
                    }),
                    Some(NoteAction::LaneFlag { lane, priority }) => {
                        deferred_flags.push(DeferredFlag {
                            tick,
                            lane: Some(lane),
                            priority,
                        });
                    }
                    None => {}
                }
            }
            "S" => {
                let (code, remaining) = next_word(remaining);
                let (length, _) = next_word(remaining);
                let (Some(code), Some(length)) = (parse_uint(code), parse_uint(length)) else {
                    warnings.push(ParseWarning::MalformedLine {
                        line: line_number,
                        message: "invalid phrase code or length".to_owned(),
                    });
                    continue;
                };
                if let Some(kind) = process::special_kind(game_mode, code) {
                    chart.phrases.push(Phrase::new(tick, length, kind));
                }
            }
            "E" => {
                let (event_text, _) = text_events::normalize(text_events::trim_quotes(remaining));
                chart.events.push(TextEvent::new(tick, event_text.to_owned()));
            }
            _ => warnings.push(ParseWarning::UnrecognizedTypeCode {
                line: line_number,
                code: type_code.to_owned(),
            }),
        }
    }

    // All notes are in; the deferred flags can see full chords now.
    for flag in deferred_flags {
        for index in chart.notes_at_tick(flag.tick) {
            let note = &mut chart.notes[index];
            if flag.lane.is_none_or(|lane| note.raw == lane)
                && !flag.priority.try_apply(note)
            {
                warnings.push(ParseWarning::FlagBlocked {
                    tick: flag.tick,
                    flag: flag.priority.flag_to_add,
                    blocking: flag.priority.blocking_flag,
                });
            }
        }
    }

    convert_solo_events(chart);
    Ok(())
}

/// Turns `solo`/`soloend` local events into Solo phrases. The text format
/// marks solo ends inclusively, so one tick is added, except when another
/// solo starts on that exact tick.
fn convert_solo_events(chart: &mut Chart) {
    let mut solos = Vec::new();
    let mut start_tick: Option<u32> = None;
    let mut next_start_tick: Option<u32> = None;
    for event in &chart.events {
        if event.text == SOLO_START {
            if start_tick.is_none() {
                start_tick = Some(event.tick);
            } else {
                next_start_tick = Some(event.tick);
            }
        } else if event.text == SOLO_END
            && let Some(start) = start_tick
        {
            if next_start_tick != Some(event.tick) {
                solos.push(Phrase::new(start, event.tick + 1 - start, PhraseKind::Solo));
                start_tick = None;
            } else {
                solos.push(Phrase::new(start, event.tick - start, PhraseKind::Solo));
                start_tick = next_start_tick;
                next_start_tick = None;
            }
        }
    }
    for solo in solos {
        chart.insert_phrase_from_back(solo);
    }
}

/// Splits `tick = rest`, parsing the tick.
fn split_tick(line: &str) -> Option<(u32, &str)> {
    let (tick, remaining) = line.split_once('=')?;
    Some((parse_uint(tick.trim())?, remaining))
}

/// Advances past leading spaces and returns the next space-delimited word
/// with the remainder.
fn next_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once(' ') {
        Some((word, remaining)) => (word, remaining),
        None => (text, ""),
    }
}

/// Decimal digit accumulation; faster than the general parser on the hot
/// path and strict about non-digit input.
fn parse_uint(text: &str) -> Option<u32> {
    if text.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    for byte in text.bytes() {
        if !byte.is_ascii_digit() {
            return None;
        }
        value = value
            .checked_mul(10)?
            .checked_add(u32::from(byte - b'0'))?;
    }
    Some(value)
}
