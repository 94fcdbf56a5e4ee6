//! Song metadata from the `[Song]` block of the text format.

/// Metadata key/value pairs from a `.chart` `[Song]` block.
///
/// All numeric fields are parsed culture-invariantly; the format is frozen to
/// `en-US`-style numbers regardless of host locale. Fields absent from the
/// file keep their defaults. MIDI files carry no equivalent block, so a song
/// loaded from MIDI has default metadata.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    pub name: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    /// Release year with any non-digit characters stripped.
    pub year: Option<String>,
    pub charter: Option<String>,
    /// Audio offset in seconds.
    pub offset: f64,
    /// Chart-author difficulty rating.
    pub difficulty: i32,
    /// Preview window start, in seconds.
    pub preview_start: f64,
    /// Preview window end, in seconds.
    pub preview_end: f64,
    pub media_type: Option<String>,
    pub music_stream: Option<String>,
    pub guitar_stream: Option<String>,
    pub bass_stream: Option<String>,
    pub rhythm_stream: Option<String>,
    pub drum_stream: Option<String>,
    /// Instrument name assigned to player 2 in legacy charts.
    pub player2: Option<String>,
}
