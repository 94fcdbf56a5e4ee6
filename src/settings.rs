//! Parse-time configuration and the values resolved from it.

/// Drum kit layout, either configured up front or inferred by the drum-type
/// post-processing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DrumsType {
    #[default]
    Unknown,
    FourLane,
    FiveLane,
}

/// Knobs for a single parse. `None` thresholds are derived from the song
/// resolution once it is known; the derivation differs slightly between the
/// two formats (see the front ends).
///
/// The settings value handed back in
/// [`ParseOutput`](crate::ParseOutput) carries the resolved state, including
/// the inferred [`DrumsType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseSettings {
    /// Maximum tick gap for natural HOPOs. Defaults to a third of a beat
    /// (plus format-specific leniency).
    pub hopo_threshold: Option<u32>,
    /// Sustains shorter than this many ticks are truncated to zero.
    pub sustain_cutoff_threshold: Option<u32>,
    /// Overrides the MIDI note number that marks star-power phrases.
    pub star_power_note: Option<u8>,
    pub drums_type: DrumsType,
}

impl ParseSettings {
    /// Defaults for the `.chart` text format.
    #[must_use]
    pub const fn default_chart() -> Self {
        Self {
            hopo_threshold: None,
            sustain_cutoff_threshold: None,
            star_power_note: None,
            drums_type: DrumsType::Unknown,
        }
    }

    /// Defaults for the MIDI format.
    #[must_use]
    pub const fn default_midi() -> Self {
        Self::default_chart()
    }

    /// HOPO threshold for `.chart` files. With a 192 resolution the format's
    /// threshold is 65 ticks, not 64; the extra tick of leniency scales with
    /// the resolution before division, unlike MIDI where it is added after.
    #[must_use]
    pub fn chart_hopo_threshold(&self, resolution: u32) -> u32 {
        const THRESHOLD_AT_DEFAULT: u32 = 65;
        const DEFAULT_RESOLUTION: u32 = 192;
        match self.hopo_threshold {
            Some(threshold) => threshold,
            None => resolution * THRESHOLD_AT_DEFAULT / DEFAULT_RESOLUTION,
        }
    }

    /// HOPO threshold for MIDI files. An explicit setting gets one tick of
    /// leniency on top.
    #[must_use]
    pub fn midi_hopo_threshold(&self, resolution: u32) -> u32 {
        match self.hopo_threshold {
            Some(threshold) => threshold + 1,
            None => resolution / 3 + 1,
        }
    }

    /// Sustain cutoff for `.chart` files.
    #[must_use]
    pub fn chart_sustain_cutoff(&self, resolution: u32) -> u32 {
        self.sustain_cutoff_threshold
            .unwrap_or(resolution / 3 + 1)
    }

    /// Sustain cutoff for MIDI files. Charting programs write non-sustain
    /// notes one tick long, so an explicit zero is clamped to one.
    #[must_use]
    pub fn midi_sustain_cutoff(&self, resolution: u32) -> u32 {
        match self.sustain_cutoff_threshold {
            Some(0) => 1,
            Some(threshold) => threshold,
            None => resolution / 3 + 1,
        }
    }
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self::default_chart()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_hopo_threshold_scales_with_resolution() {
        let settings = ParseSettings::default_chart();
        assert_eq!(settings.chart_hopo_threshold(192), 65);
        assert_eq!(settings.chart_hopo_threshold(480), 162);
    }

    #[test]
    fn midi_thresholds_derive_from_resolution() {
        let settings = ParseSettings::default_midi();
        assert_eq!(settings.midi_hopo_threshold(480), 161);
        assert_eq!(settings.midi_sustain_cutoff(480), 161);
        let explicit = ParseSettings {
            sustain_cutoff_threshold: Some(0),
            ..ParseSettings::default_midi()
        };
        assert_eq!(explicit.midi_sustain_cutoff(480), 1);
    }
}
