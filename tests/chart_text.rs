//! End-to-end tests for the `.chart` text front end.

use pretty_assertions::assert_eq;

use chart_rs::prelude::*;

fn chart_source(body: &str) -> String {
    format!(
        "[Song]\n{{\n  Resolution = 192\n}}\n[SyncTrack]\n{{\n  0 = B 120000\n}}\n{body}"
    )
}

fn expert_guitar(lines: &str) -> String {
    chart_source(&format!("[ExpertSingle]\n{{\n{lines}}}\n"))
}

#[test]
fn song_metadata_parses_with_quotes_and_numbers() {
    let source = "[Song]\n{\n\
        Name = \"Endless Rebirth\"\n\
        Artist = \"Somebody\"\n\
        Charter = \"a charter\"\n\
        Offset = 0.5\n\
        Resolution = 480\n\
        Difficulty = 4\n\
        PreviewStart = 12.25\n\
        PreviewEnd = 30\n\
        Genre = \"rock\"\n\
        MediaType = \"cd\"\n\
        Year = \", 2008\"\n\
        MusicStream = \"song.ogg\"\n\
        }\n[SyncTrack]\n{\n}\n";
    let ParseOutput { song, warnings, .. } = parse_chart(source).unwrap();
    assert_eq!(warnings, vec![]);
    assert_eq!(song.resolution(), 480);
    assert_eq!(song.metadata.name.as_deref(), Some("Endless Rebirth"));
    assert_eq!(song.metadata.artist.as_deref(), Some("Somebody"));
    assert_eq!(song.metadata.offset, 0.5);
    assert_eq!(song.metadata.difficulty, 4);
    assert_eq!(song.metadata.preview_start, 12.25);
    assert_eq!(song.metadata.year.as_deref(), Some("2008"));
    assert_eq!(song.metadata.music_stream.as_deref(), Some("song.ogg"));
    // 480 resolution scales the .chart HOPO threshold.
    assert_eq!(song.hopo_threshold, 162);
}

#[test]
fn resolution_parsing_is_culture_invariant() {
    // The digit accumulator accepts nothing but ASCII digits, so host
    // locale separators can never leak in.
    let ParseOutput { song, .. } = parse_chart(&chart_source("")).unwrap();
    assert_eq!(song.resolution(), 192);
}

#[test]
fn sync_track_reads_tempos_and_time_signatures() {
    let source = "[Song]\n{\n  Resolution = 192\n}\n[SyncTrack]\n{\n\
        0 = TS 4\n\
        0 = B 120000\n\
        384 = B 60000\n\
        384 = TS 6 3\n\
        768 = A 3200000\n\
        960 = X 5\n\
        }\n";
    let ParseOutput { song, warnings, .. } = parse_chart(source).unwrap();
    assert_eq!(
        warnings,
        vec![ParseWarning::UnrecognizedTypeCode {
            line: 12,
            code: "X".to_owned(),
        }]
    );
    assert_eq!(song.sync.tempos().len(), 2);
    assert_eq!(song.sync.tempos()[1].beats_per_minute, 60.0);
    let signature = song.sync.time_signatures()[1];
    assert_eq!((signature.numerator, signature.denominator), (6, 8));
    // Two beats at 120 BPM, then one beat at 60 BPM.
    assert_eq!(song.tick_to_time(384), 1.0);
    assert_eq!(song.tick_to_time(576), 2.0);
}

#[test]
fn notes_arrive_sorted_with_chords_and_sustain_cutoff() {
    let output = parse_chart(&expert_guitar(
        "  100 = N 0 10\n  100 = N 1 0\n  200 = N 2 100\n  300 = N 7 0\n",
    ))
    .unwrap();
    let chart = output
        .song
        .chart(Instrument::Guitar, Difficulty::Expert)
        .unwrap();
    let ticks: Vec<u32> = chart.notes.iter().map(|n| n.tick).collect();
    assert_eq!(ticks, vec![100, 100, 200, 300]);
    // 10 ticks is below the 65-tick cutoff at 192 resolution; 100 is not.
    assert_eq!(chart.notes[0].length, 0);
    assert_eq!(chart.notes[2].length, 100);
    assert_eq!(chart.notes[0].raw, GuitarFret::Green as u16);
    assert_eq!(chart.notes[3].raw, GuitarFret::Open as u16);
    assert!(chart.notes[3].is_open(GameMode::Guitar));
}

#[test]
fn tap_after_forced_wins() {
    let output = parse_chart(&expert_guitar(
        "  100 = N 0 0\n  100 = N 5 0\n  100 = N 6 0\n",
    ))
    .unwrap();
    assert_eq!(output.warnings, vec![]);
    let chart = output
        .song
        .chart(Instrument::Guitar, Difficulty::Expert)
        .unwrap();
    assert_eq!(chart.notes.len(), 1);
    assert!(chart.notes[0].flags.contains(NoteFlags::TAP));
    assert!(!chart.notes[0].flags.contains(NoteFlags::FORCED));
}

#[test]
fn forced_after_tap_is_rejected() {
    let output = parse_chart(&expert_guitar(
        "  100 = N 0 0\n  100 = N 6 0\n  100 = N 5 0\n",
    ))
    .unwrap();
    assert_eq!(
        output.warnings,
        vec![ParseWarning::FlagBlocked {
            tick: 100,
            flag: NoteFlags::FORCED,
            blocking: NoteFlags::TAP,
        }]
    );
    let chart = output
        .song
        .chart(Instrument::Guitar, Difficulty::Expert)
        .unwrap();
    assert!(chart.notes[0].flags.contains(NoteFlags::TAP));
    assert!(!chart.notes[0].flags.contains(NoteFlags::FORCED));
}

#[test]
fn solo_events_become_inclusive_phrases() {
    let output = parse_chart(&expert_guitar(
        "  100 = E solo\n  300 = E soloend\n",
    ))
    .unwrap();
    let chart = output
        .song
        .chart(Instrument::Guitar, Difficulty::Expert)
        .unwrap();
    assert_eq!(
        chart.phrases,
        vec![Phrase::new(100, 201, PhraseKind::Solo)]
    );
}

#[test]
fn back_to_back_solos_split_on_the_shared_tick() {
    let output = parse_chart(&expert_guitar(
        "  100 = E solo\n  300 = E solo\n  300 = E soloend\n  500 = E soloend\n",
    ))
    .unwrap();
    let chart = output
        .song
        .chart(Instrument::Guitar, Difficulty::Expert)
        .unwrap();
    assert_eq!(
        chart.phrases,
        vec![
            Phrase::new(100, 200, PhraseKind::Solo),
            Phrase::new(300, 201, PhraseKind::Solo),
        ]
    );
}

#[test]
fn special_phrases_respect_game_mode() {
    let body = "[ExpertSingle]\n{\n  0 = S 2 480\n  480 = S 64 100\n}\n\
                [ExpertDrums]\n{\n  0 = S 64 120\n  200 = S 65 50\n}\n";
    let output = parse_chart(&chart_source(body)).unwrap();
    let guitar = output
        .song
        .chart(Instrument::Guitar, Difficulty::Expert)
        .unwrap();
    // Drum fills mean nothing on guitar.
    assert_eq!(
        guitar.phrases,
        vec![Phrase::new(0, 480, PhraseKind::Starpower)]
    );
    let drums = output
        .song
        .chart(Instrument::Drums, Difficulty::Expert)
        .unwrap();
    assert_eq!(
        drums.phrases,
        vec![
            Phrase::new(0, 120, PhraseKind::ProDrumsActivation),
            Phrase::new(200, 50, PhraseKind::TremoloLane),
        ]
    );
}

#[test]
fn drums_cymbals_and_double_kick() {
    let body = "[ExpertDrums]\n{\n\
        0 = N 0 0\n\
        0 = N 32 0\n\
        100 = N 2 0\n\
        100 = N 66 0\n\
        200 = N 3 0\n\
        200 = N 36 0\n\
        300 = N 4 0\n\
        300 = N 43 0\n\
        }\n";
    let output = parse_chart(&chart_source(body)).unwrap();
    let chart = output
        .song
        .chart(Instrument::Drums, Difficulty::Expert)
        .unwrap();
    // Both kick lines land; the double-kick variant carries its flag.
    let kicks: Vec<_> = chart
        .notes
        .iter()
        .filter(|n| n.raw == DrumPad::Kick as u16)
        .collect();
    assert_eq!(kicks.len(), 2);
    assert!(kicks.iter().any(|n| n.flags.contains(NoteFlags::DOUBLE_KICK)));
    let yellow = chart.notes.iter().find(|n| n.raw == DrumPad::Yellow as u16).unwrap();
    assert!(yellow.flags.contains(NoteFlags::PRO_DRUMS_CYMBAL));
    let blue = chart.notes.iter().find(|n| n.raw == DrumPad::Blue as u16).unwrap();
    assert!(blue.flags.contains(NoteFlags::PRO_DRUMS_ACCENT));
    let orange = chart.notes.iter().find(|n| n.raw == DrumPad::Orange as u16).unwrap();
    assert!(orange.flags.contains(NoteFlags::PRO_DRUMS_GHOST));
    // Cymbal-marked yellow is not a tom, but the bare orange ghost is.
    assert_eq!(output.settings.drums_type, DrumsType::FourLane);
}

#[test]
fn double_kick_alone_keeps_its_flag() {
    let body = "[ExpertDrums]\n{\n  0 = N 32 0\n}\n";
    let output = parse_chart(&chart_source(body)).unwrap();
    let chart = output
        .song
        .chart(Instrument::Drums, Difficulty::Expert)
        .unwrap();
    assert_eq!(chart.notes.len(), 1);
    assert_eq!(chart.notes[0].raw, DrumPad::Kick as u16);
    assert!(chart.notes[0].flags.contains(NoteFlags::DOUBLE_KICK));
}

#[test]
fn green_pad_infers_five_lane_even_with_toms() {
    let body = "[ExpertDrums]\n{\n  0 = N 2 0\n  100 = N 5 0\n}\n";
    let output = parse_chart(&chart_source(body)).unwrap();
    assert_eq!(output.settings.drums_type, DrumsType::FiveLane);
}

#[test]
fn drums_type_inference_sees_every_difficulty() {
    // The tom signal in the easy section cannot beat a green pad that only
    // shows up on expert.
    let body = "[EasyDrums]\n{\n  0 = N 2 0\n}\n[ExpertDrums]\n{\n  0 = N 5 0\n}\n";
    let output = parse_chart(&chart_source(body)).unwrap();
    assert_eq!(output.settings.drums_type, DrumsType::FiveLane);
}

#[test]
fn configured_drums_type_is_left_alone() {
    let body = "[ExpertDrums]\n{\n  0 = N 5 0\n}\n";
    let settings = ParseSettings {
        drums_type: DrumsType::FourLane,
        ..ParseSettings::default_chart()
    };
    let output = parse_chart_with_settings(&chart_source(body), settings).unwrap();
    assert_eq!(output.settings.drums_type, DrumsType::FourLane);
}

#[test]
fn note_triples_round_trip_modulo_sustain_cutoff() {
    let triples: Vec<(u32, u32, u32)> = vec![
        (0, 0, 0),
        (96, 1, 40),
        (96, 2, 96),
        (192, 4, 200),
        (480, 3, 64),
        (480, 0, 65),
    ];
    let lines: String = triples
        .iter()
        .map(|&(tick, lane, length)| format!("  {tick} = N {lane} {length}\n"))
        .collect();
    let output = parse_chart(&expert_guitar(&lines)).unwrap();
    assert_eq!(output.warnings, vec![]);
    let chart = output
        .song
        .chart(Instrument::Guitar, Difficulty::Expert)
        .unwrap();

    let cutoff = 65; // resolution 192 / 3 + 1
    let expected: Vec<(u32, u32, u32)> = triples
        .iter()
        .map(|&(tick, lane, length)| {
            let length = if length < cutoff { 0 } else { length };
            // Lane codes map onto fret values one above themselves.
            (tick, lane + 1, length)
        })
        .collect();
    let parsed: Vec<(u32, u32, u32)> = chart
        .notes
        .iter()
        .map(|n| (n.tick, u32::from(n.raw), n.length))
        .collect();
    assert_eq!(parsed, expected);
}

#[test]
fn malformed_lines_are_skipped_not_fatal() {
    let output = parse_chart(&expert_guitar(
        "  100 = N 0 0\n  garbage\n  200 = N oops 0\n  300 = N 1 0\n",
    ))
    .unwrap();
    assert_eq!(output.warnings.len(), 2);
    let chart = output
        .song
        .chart(Instrument::Guitar, Difficulty::Expert)
        .unwrap();
    assert_eq!(chart.notes.len(), 2);
}

#[test]
fn descending_ticks_are_skipped() {
    let output = parse_chart(&expert_guitar(
        "  200 = N 0 0\n  100 = N 1 0\n  300 = N 2 0\n",
    ))
    .unwrap();
    assert_eq!(output.warnings, vec![ParseWarning::TickOutOfOrder { line: 12 }]);
    let chart = output
        .song
        .chart(Instrument::Guitar, Difficulty::Expert)
        .unwrap();
    assert_eq!(chart.notes.len(), 2);
}

#[test]
fn missing_or_misordered_sections_are_fatal() {
    assert!(matches!(
        parse_chart(""),
        Err(ParseError::MissingSection { name: "Song" })
    ));
    assert!(matches!(
        parse_chart("[SyncTrack]\n{\n}\n[Song]\n{\n}\n"),
        Err(ParseError::SectionOrder { .. })
    ));
    assert!(matches!(
        parse_chart("[Song]\n{\n  Resolution = 192\n}\n"),
        Err(ParseError::MissingSection { name: "SyncTrack" })
    ));
}

#[test]
fn events_section_splits_sections_from_events() {
    let body = "[Events]\n{\n\
        0 = E \"section Intro\"\n\
        480 = E \"prc_verse\"\n\
        960 = E \"music_start\"\n\
        }\n";
    let output = parse_chart(&chart_source(body)).unwrap();
    assert_eq!(
        output.song.sections,
        vec![
            TextEvent::new(0, "Intro".to_owned()),
            TextEvent::new(480, "verse".to_owned()),
        ]
    );
    assert_eq!(
        output.song.events,
        vec![TextEvent::new(960, "music_start".to_owned())]
    );
}

#[test]
fn ghl_and_keyboard_tracks_use_their_tables() {
    let body = "[MediumGHLGuitar]\n{\n  0 = N 3 0\n  100 = N 8 0\n  200 = N 7 0\n}\n\
                [EasyKeyboard]\n{\n  0 = N 2 0\n}\n";
    let output = parse_chart(&chart_source(body)).unwrap();
    let ghl = output
        .song
        .chart(Instrument::GhlGuitar, Difficulty::Medium)
        .unwrap();
    assert_eq!(ghl.notes[0].raw, GhlFret::Black1 as u16);
    assert_eq!(ghl.notes[1].raw, GhlFret::Black3 as u16);
    assert!(ghl.notes[2].is_open(GameMode::GhlGuitar));
    let keys = output.song.chart(Instrument::Keys, Difficulty::Easy).unwrap();
    assert_eq!(keys.notes[0].raw, GuitarFret::Yellow as u16);
}

#[test]
fn unrecognized_sections_are_ignored() {
    let body = "[ExpertVocals]\n{\n  0 = N 0 0\n}\n[Lyrics]\n{\n}\n";
    let output = parse_chart(&chart_source(body)).unwrap();
    assert_eq!(output.warnings, vec![]);
    assert!(!output.song.instrument_has_chart(Instrument::Vocals));
}
