//! Convenient re-exports for the common case of parsing a file and walking
//! the resulting song.

pub use crate::parse::flag_priority::NoteFlagPriority;
pub use crate::parse::{ParseError, ParseWarning};
pub use crate::settings::{DrumsType, ParseSettings};
pub use crate::song::{
    Chart, Difficulty, DrumPad, GameMode, GhlFret, GuitarFret, Instrument, Metadata, Note,
    NoteFlags, Phrase, PhraseKind, ProGuitarString, Song, TextEvent, VenueEvent, VenueEventKind,
};
pub use crate::sync::{Beatline, BeatlineKind, TempoChange, TempoMap, TimeSignature};
pub use crate::{
    ParseOutput, parse_chart, parse_chart_with_settings, parse_midi, parse_midi_file,
    parse_midi_with_settings,
};
