//! Parser for rhythm-game chart formats.
//!
//! Two heterogeneous source formats load into one unified model: the legacy
//! line-oriented `.chart` text format and Standard MIDI Files authored with
//! the Rock Band / Guitar Hero / Phase Shift conventions. Both front ends
//! feed the same instrument/difficulty-indexed note-and-phrase model, the
//! [`Song`](song::Song), which downstream consumers treat as read-only.
//!
//! Parsing is synchronous and atomic per file: an entry point either
//! returns a finished [`ParseOutput`] or a [`ParseError`], never a partial
//! song. Recoverable problems (a malformed line, a conflicting flag, an
//! unmatched note-off) degrade that one unit and are reported in
//! [`ParseOutput::warnings`].
//!
//! ```
//! use chart_rs::{ParseOutput, parse_chart};
//!
//! let source = "[Song]\n{\n  Resolution = 192\n}\n[SyncTrack]\n{\n  0 = B 120000\n}\n\
//!               [ExpertSingle]\n{\n  480 = N 0 0\n}\n";
//! let ParseOutput { song, warnings, .. } = parse_chart(source).unwrap();
//! assert!(warnings.is_empty());
//! assert_eq!(song.resolution(), 192);
//! ```
//!
//! In detail, our policies are:
//!
//! - Ticks are the canonical time unit; seconds exist only through the
//!   tempo map.
//! - File discovery and I/O stay outside the crate; the entry points take
//!   text or bytes.
//! - Numeric parsing is culture-invariant regardless of host locale (the
//!   text format is frozen to `en-US`-style numbers).

pub mod chart;
pub mod midi;
pub mod parse;
pub mod prelude;
pub mod settings;
pub mod song;
pub mod sync;

pub use midly::Smf;

pub use self::parse::{ParseError, ParseWarning};
pub use self::settings::{DrumsType, ParseSettings};
pub use self::song::Song;

/// Everything a parse produces: the song, the settings as resolved during
/// the parse (including the inferred drums type), and the recoverable
/// problems encountered along the way.
#[derive(Debug)]
#[must_use]
pub struct ParseOutput {
    pub song: Song,
    pub settings: ParseSettings,
    pub warnings: Vec<ParseWarning>,
}

/// Parses `.chart` text with default settings.
pub fn parse_chart(text: &str) -> Result<ParseOutput, ParseError> {
    parse_chart_with_settings(text, ParseSettings::default_chart())
}

/// Parses `.chart` text.
pub fn parse_chart_with_settings(
    text: &str,
    settings: ParseSettings,
) -> Result<ParseOutput, ParseError> {
    chart::parse(text, settings)
}

/// Parses a Standard MIDI File from its raw bytes with default settings.
pub fn parse_midi(bytes: &[u8]) -> Result<ParseOutput, ParseError> {
    parse_midi_with_settings(bytes, ParseSettings::default_midi())
}

/// Parses a Standard MIDI File from its raw bytes.
pub fn parse_midi_with_settings(
    bytes: &[u8],
    settings: ParseSettings,
) -> Result<ParseOutput, ParseError> {
    let smf = Smf::parse(bytes)?;
    midi::parse(&smf, settings)
}

/// Parses an already-read SMF. Useful when the caller has its own container
/// handling.
pub fn parse_midi_file(smf: &Smf<'_>, settings: ParseSettings) -> Result<ParseOutput, ParseError> {
    midi::parse(smf, settings)
}
