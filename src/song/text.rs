//! Timeline text events: local/global text, sections, and venue cues.

/// A plain text event pinned to a tick. Used for global song events,
/// sections, lyrics, and per-chart local events.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextEvent {
    pub tick: u32,
    pub text: String,
}

impl TextEvent {
    #[must_use]
    pub const fn new(tick: u32, text: String) -> Self {
        Self { tick, text }
    }
}

/// Category of a venue cue.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VenueEventKind {
    Lighting,
    PostProcessing,
    Singalong,
    Spotlight,
    /// Event text the reader did not recognize, passed through verbatim.
    Unknown,
}

/// A venue cue from the MIDI `VENUE` track. `length` is zero for cues that
/// came from text events rather than note pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VenueEvent {
    pub tick: u32,
    pub length: u32,
    pub kind: VenueEventKind,
    pub text: String,
}

impl VenueEvent {
    #[must_use]
    pub const fn new(tick: u32, length: u32, kind: VenueEventKind, text: String) -> Self {
        Self {
            tick,
            length,
            kind,
            text,
        }
    }
}
