//! Venue track lookups: note pairs and text events to typed venue cues.
//!
//! The representations here are not how events appear in the file; they are
//! a stable vocabulary downstream consumers can match on without caring
//! whether a cue arrived as a note pair, an RBN1 `lighting (...)` event, or
//! a bare keyframe word.

use std::sync::LazyLock;

use regex::Regex;

use crate::song::VenueEventKind;

pub(super) const PERFORMER_GUITAR: &str = "guitar";
pub(super) const PERFORMER_BASS: &str = "bass";
pub(super) const PERFORMER_DRUMS: &str = "drums";
pub(super) const PERFORMER_VOCALS: &str = "vocals";
pub(super) const PERFORMER_KEYS: &str = "keys";

pub(super) const LIGHTING_DEFAULT: &str = "default";
const LIGHTING_FIRST: &str = "first";
const LIGHTING_PREVIOUS: &str = "previous";
const LIGHTING_NEXT: &str = "next";

/// Matches RBN1-era lighting events and captures the argument:
/// `lighting (verse)` -> `verse`, `lighting ()` -> ``.
static LIGHTING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"lighting\s+\((.*)\)").expect("lighting regex is valid"));

/// Venue cues encoded as note pairs.
pub(super) fn note_event(key: u8) -> Option<(VenueEventKind, &'static str)> {
    use VenueEventKind::{Lighting, PostProcessing, Singalong, Spotlight};
    let event = match key {
        // Post-processing filters.
        110 => (PostProcessing, "trails_long"),
        109 => (PostProcessing, "scanlines_security"),
        108 => (PostProcessing, "scanlines_black_white"),
        107 => (PostProcessing, "scanlines"),
        106 => (PostProcessing, "scanlines_blue"),
        105 => (PostProcessing, "mirror"),
        104 => (PostProcessing, "desaturated_red"),
        103 => (PostProcessing, "bloom"),
        102 => (PostProcessing, "choppy_black_white"),
        101 => (PostProcessing, "photonegative"),
        100 => (PostProcessing, "silvertone"),
        99 => (PostProcessing, "sepiatone"),
        98 => (PostProcessing, "grainy_film"),
        97 => (PostProcessing, "polarized_black_white"),
        96 => (PostProcessing, "default"),
        // Performer singalongs.
        87 => (Singalong, PERFORMER_GUITAR),
        86 => (Singalong, PERFORMER_DRUMS),
        85 => (Singalong, PERFORMER_BASS),
        // Lighting keyframes.
        50 => (Lighting, LIGHTING_FIRST),
        49 => (Lighting, LIGHTING_PREVIOUS),
        48 => (Lighting, LIGHTING_NEXT),
        // Performer spotlights.
        41 => (Spotlight, PERFORMER_KEYS),
        40 => (Spotlight, PERFORMER_VOCALS),
        39 => (Spotlight, PERFORMER_GUITAR),
        38 => (Spotlight, PERFORMER_DRUMS),
        37 => (Spotlight, PERFORMER_BASS),
        _ => return None,
    };
    Some(event)
}

/// Direct text-to-cue conversions: keyframe words and post-processing
/// filter names.
fn text_event(text: &str) -> Option<(VenueEventKind, &'static str)> {
    use VenueEventKind::{Lighting, PostProcessing};
    let event = match text {
        "first" => (Lighting, LIGHTING_FIRST),
        "next" => (Lighting, LIGHTING_NEXT),
        "prev" => (Lighting, LIGHTING_PREVIOUS),
        // RBN1 equivalents of `lighting (verse)` and `lighting (chorus)`.
        "verse" => (Lighting, "verse"),
        "chorus" => (Lighting, "chorus"),

        "bloom.pp" => (PostProcessing, "bloom"),
        "bright.pp" => (PostProcessing, "bright"),
        "clean_trails.pp" => (PostProcessing, "trails"),
        "contrast_a.pp" => (PostProcessing, "polarized_black_white"),
        "desat_blue.pp" => (PostProcessing, "desaturated_blue"),
        "desat_posterize_trails.pp" => (PostProcessing, "trails_desaturated"),
        "film_contrast.pp" => (PostProcessing, "contrast"),
        "film_b+w.pp" => (PostProcessing, "black_white"),
        "film_sepia_ink.pp" => (PostProcessing, "sepiatone"),
        "film_silvertone.pp" => (PostProcessing, "silvertone"),
        "film_contrast_red.pp" => (PostProcessing, "contrast_red"),
        "film_contrast_green.pp" => (PostProcessing, "contrast_green"),
        "film_contrast_blue.pp" => (PostProcessing, "contrast_blue"),
        "film_16mm.pp" => (PostProcessing, "grainy_film"),
        "film_blue_filter.pp" => (PostProcessing, "scanlines_blue"),
        "flicker_trails.pp" => (PostProcessing, "trails_flickery"),
        "horror_movie_special.pp" => (PostProcessing, "photonegative_red_black"),
        "photocopy.pp" => (PostProcessing, "choppy_black_white"),
        "photo_negative.pp" => (PostProcessing, "photonegative"),
        "posterize.pp" => (PostProcessing, "posterize"),
        "ProFilm_a.pp" => (PostProcessing, "default"),
        "ProFilm_b.pp" => (PostProcessing, "desaturated_red"),
        "ProFilm_mirror_a.pp" => (PostProcessing, "mirror"),
        "ProFilm_psychedelic_blue_red.pp" => (PostProcessing, "polarized_red_blue"),
        "shitty_tv.pp" => (PostProcessing, "grainy_chromatic_abberation"),
        "space_woosh.pp" => (PostProcessing, "trails_spacey"),
        "video_a.pp" => (PostProcessing, "scanlines"),
        "video_bw.pp" => (PostProcessing, "black_white"),
        "video_security.pp" => (PostProcessing, "scanlines_security"),
        "video_trails.pp" => (PostProcessing, "trails"),
        _ => return None,
    };
    Some(event)
}

/// Canonical names for `lighting (...)` arguments.
fn lighting_argument(argument: &str) -> Option<&'static str> {
    let converted = match argument {
        // Keyframed.
        "chorus" => "chorus",
        "dischord" => "dischord",
        "manual_cool" => "cool_manual",
        "manual_warm" => "warm_manual",
        "stomp" => "stomp",
        "verse" => "verse",
        // Automatic.
        "blackout_fast" => "blackout_fast",
        "blackout_slow" => "blackout_slow",
        "blackout_spot" => "blackout_spotlight",
        "bre" => "big_rock_ending",
        "flare_fast" => "flare_fast",
        "flare_slow" => "flare_slow",
        "frenzy" => "frenzy",
        "harmony" => "harmony",
        "intro" => "intro",
        "loop_cool" => "cool_automatic",
        "loop_warm" => "warm_automatic",
        "searchlights" => "searchlights",
        "silhouettes" => "silhouettes",
        "silhouettes_spot" => "silhouettes_spotlight",
        "strobe_fast" => "strobe_fast",
        "strobe_slow" => "strobe_slow",
        "sweep" => "sweep",
        _ => return None,
    };
    Some(converted)
}

/// Converts a normalized venue text event into a typed cue. Unrecognized
/// events pass through as [`VenueEventKind::Unknown`] with their raw text.
pub(super) fn convert_text(text: &str) -> (VenueEventKind, String) {
    if let Some((kind, converted)) = text_event(text) {
        return (kind, converted.to_owned());
    }

    if let Some(captures) = LIGHTING_REGEX.captures(text) {
        let argument = captures.get(1).map_or("", |group| group.as_str());
        let converted = lighting_argument(argument).unwrap_or(LIGHTING_DEFAULT);
        return (VenueEventKind::Lighting, converted.to_owned());
    }

    (VenueEventKind::Unknown, text.to_owned())
}
