//! Typed, ranged annotations over a chart's timeline.

/// The kind of a special phrase.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhraseKind {
    Starpower,
    Solo,
    TremoloLane,
    TrillLane,
    VersusPlayer1,
    VersusPlayer2,
    ProDrumsActivation,
    VocalsRangeShift,
    VocalsLyricShift,
    /// Lyric line grouping, distinct from the versus phrases that share its
    /// note numbers in the MIDI format.
    VocalsLyricPhrase,
    ProKeysRangeShift0,
    ProKeysRangeShift1,
    ProKeysRangeShift2,
    ProKeysRangeShift3,
    ProKeysRangeShift4,
    ProKeysRangeShift5,
    ProKeysGlissando,
}

/// A special phrase: an interval of the timeline with a [`PhraseKind`].
///
/// Phrases of the same kind never overlap within one chart; phrases of
/// different kinds may.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Phrase {
    pub tick: u32,
    pub length: u32,
    pub kind: PhraseKind,
}

impl Phrase {
    #[must_use]
    pub const fn new(tick: u32, length: u32, kind: PhraseKind) -> Self {
        Self { tick, length, kind }
    }
}
