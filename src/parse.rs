//! Shared parsing machinery used by both format front ends.
//!
//! Errors split into two tiers: [`ParseError`] aborts the whole parse and no
//! partial song is exposed; [`ParseWarning`] marks a malformed unit (line,
//! event, flag) that was skipped while parsing continued. Warnings are
//! accumulated into the parse output rather than logged, so callers decide
//! what surfaces to the player.

pub mod deferred;
pub mod flag_priority;
pub mod pairing;
pub mod text_events;

use thiserror::Error;

use crate::song::NoteFlags;

/// A structural problem that aborts the parse.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ParseError {
    /// A mandatory `.chart` section is absent.
    #[error("required section [{name}] is missing")]
    MissingSection { name: &'static str },
    /// The mandatory `.chart` sections are present but out of order.
    #[error("invalid section ordering: expected [{expected}], found [{found}]")]
    SectionOrder {
        expected: &'static str,
        found: String,
    },
    /// A section header with no `{` body.
    #[error("section [{name}] has no body")]
    MissingBlockBody { name: String },
    /// A section body with no closing `}`.
    #[error("section [{name}] has no closing brace")]
    UnterminatedBlock { name: String },
    /// The MIDI container holds no track chunks.
    #[error("MIDI file has no tracks")]
    NoTracks,
    /// The MIDI time division is not ticks-per-quarter-note.
    #[error("MIDI file has no beat resolution")]
    UnsupportedTimeDivision,
    /// The MIDI container itself could not be read.
    #[error("unreadable MIDI file: {0}")]
    Midi(#[from] midly::Error),
}

/// A recoverable problem. The offending unit was skipped and parsing went on.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParseWarning {
    /// A data line that could not be parsed.
    #[error("malformed line {line}: {message}")]
    MalformedLine { line: usize, message: String },
    /// A line's tick was lower than its predecessor's.
    #[error("tick out of ascending order on line {line}")]
    TickOutOfOrder { line: usize },
    /// A type code with no meaning in its section.
    #[error("unrecognized type code `{code}` on line {line}")]
    UnrecognizedTypeCode { line: usize, code: String },
    /// A sync event arrived earlier than the last one.
    #[error("out-of-order sync event at tick {tick}")]
    SyncOutOfOrder { tick: u32 },
    /// A note-on with an identical note-on already unpaired.
    #[error("duplicate note on at tick {tick}")]
    DuplicateNoteOn { tick: u32 },
    /// A note-off with no unpaired note-on to close.
    #[error("note off with no corresponding note on at tick {tick}")]
    UnmatchedNoteOff { tick: u32 },
    /// A SysEx phrase start with an identical start already unpaired.
    #[error("duplicate SysEx phrase start at tick {tick}")]
    DuplicateSysExStart { tick: u32 },
    /// A SysEx phrase end with no unpaired start to close.
    #[error("SysEx phrase end with no corresponding start at tick {tick}")]
    UnmatchedSysExEnd { tick: u32 },
    /// A SysEx event that is not a Phase Shift frame.
    #[error("unknown SysEx event at tick {tick}")]
    UnknownSysEx { tick: u32 },
    /// A Phase Shift frame of a type other than `Phrase`.
    #[error("unknown Phase Shift SysEx type {sysex_type} at tick {tick}")]
    UnknownSysExType { tick: u32, sysex_type: u8 },
    /// A flag event rejected by the priority table.
    #[error("flag {flag} at tick {tick} blocked by existing flag {blocking}")]
    FlagBlocked {
        tick: u32,
        flag: NoteFlags,
        blocking: NoteFlags,
    },
    /// A pro-guitar note whose velocity does not encode a fret.
    #[error(
        "pro guitar note with invalid fret velocity {velocity} at tick {tick}; must be at least 100"
    )]
    InvalidProGuitarVelocity { tick: u32, velocity: u8 },
    /// A whole track that had to be dropped, clearing its partial chart.
    #[error("track could not be loaded: {message}")]
    TrackDropped { message: String },
}
