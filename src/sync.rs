//! Tick-to-time conversion: tempo map, time signatures, and beatlines.
//!
//! Ticks are the native time unit of both chart formats; they only become
//! seconds through the tempo map. Every song owns exactly one [`TempoMap`],
//! seeded with 120 BPM and 4/4 at tick 0 so conversion is always defined.

use thiserror::Error;

/// A tempo change. `time` is the absolute time of `tick`, computed from the
/// preceding entries when the change is appended.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TempoChange {
    pub tick: u32,
    pub beats_per_minute: f64,
    pub time: f64,
}

/// A time signature change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSignature {
    pub tick: u32,
    pub numerator: u32,
    pub denominator: u32,
}

/// Beatline weight from the MIDI `BEAT` track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BeatlineKind {
    Measure,
    Strong,
}

/// An authored beatline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Beatline {
    pub tick: u32,
    pub kind: BeatlineKind,
}

/// A sync event arrived at a tick earlier than the map's last entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("out-of-order sync track event at tick {tick}")]
pub struct OutOfOrderError {
    pub tick: u32,
}

/// Ordered, append-only tempo and time-signature entries plus the tick
/// resolution they are defined against.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TempoMap {
    resolution: u32,
    tempos: Vec<TempoChange>,
    time_signatures: Vec<TimeSignature>,
    beatlines: Vec<Beatline>,
}

impl TempoMap {
    /// Creates a map with the default 120 BPM and 4/4 entries at tick 0.
    #[must_use]
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution,
            tempos: vec![TempoChange {
                tick: 0,
                beats_per_minute: 120.0,
                time: 0.0,
            }],
            time_signatures: vec![TimeSignature {
                tick: 0,
                numerator: 4,
                denominator: 4,
            }],
            beatlines: Vec::new(),
        }
    }

    /// Ticks per quarter note.
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    #[must_use]
    pub fn tempos(&self) -> &[TempoChange] {
        &self.tempos
    }

    #[must_use]
    pub fn time_signatures(&self) -> &[TimeSignature] {
        &self.time_signatures
    }

    #[must_use]
    pub fn beatlines(&self) -> &[Beatline] {
        &self.beatlines
    }

    /// Appends a tempo change. A change on the last entry's tick replaces it.
    pub fn add_tempo(&mut self, tick: u32, beats_per_minute: f64) -> Result<(), OutOfOrderError> {
        let time = self.tick_to_time(tick);
        let last = self
            .tempos
            .last()
            .expect("tempo map always has an entry at tick 0");
        let change = TempoChange {
            tick,
            beats_per_minute,
            time,
        };
        if tick == last.tick {
            *self
                .tempos
                .last_mut()
                .expect("tempo map always has an entry at tick 0") = change;
        } else if tick < last.tick {
            return Err(OutOfOrderError { tick });
        } else {
            self.tempos.push(change);
        }
        Ok(())
    }

    /// Appends a time signature change with the same replace-or-append rule
    /// as [`TempoMap::add_tempo`].
    pub fn add_time_signature(
        &mut self,
        tick: u32,
        numerator: u32,
        denominator: u32,
    ) -> Result<(), OutOfOrderError> {
        let last = self
            .time_signatures
            .last()
            .expect("tempo map always has a time signature at tick 0");
        let change = TimeSignature {
            tick,
            numerator,
            denominator,
        };
        if tick == last.tick {
            *self
                .time_signatures
                .last_mut()
                .expect("tempo map always has a time signature at tick 0") = change;
        } else if tick < last.tick {
            return Err(OutOfOrderError { tick });
        } else {
            self.time_signatures.push(change);
        }
        Ok(())
    }

    /// Appends a beatline, replacing one on the same tick.
    pub fn add_beatline(&mut self, tick: u32, kind: BeatlineKind) -> Result<(), OutOfOrderError> {
        let beat = Beatline { tick, kind };
        match self.beatlines.last() {
            Some(last) if tick == last.tick => {
                *self
                    .beatlines
                    .last_mut()
                    .expect("checked non-empty above") = beat;
            }
            Some(last) if tick < last.tick => return Err(OutOfOrderError { tick }),
            _ => self.beatlines.push(beat),
        }
        Ok(())
    }

    /// The last tempo change at or before `tick`.
    #[must_use]
    pub fn tempo_at(&self, tick: u32) -> &TempoChange {
        let index = self.tempos.partition_point(|tempo| tempo.tick <= tick);
        // partition_point is at least 1: the seed entry sits at tick 0.
        &self.tempos[index.saturating_sub(1)]
    }

    /// Converts a tick to absolute seconds via the governing tempo entry.
    #[must_use]
    pub fn tick_to_time(&self, tick: u32) -> f64 {
        let tempo = self.tempo_at(tick);
        let tick_delta = tick.saturating_sub(tempo.tick);
        let beat_delta = f64::from(tick_delta) / f64::from(self.resolution);
        tempo.time + beat_delta * 60.0 / tempo.beats_per_minute
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_with_defaults_at_tick_zero() {
        let map = TempoMap::new(192);
        assert_eq!(map.tempos().len(), 1);
        assert_eq!(map.tempos()[0].beats_per_minute, 120.0);
        assert_eq!(map.time_signatures()[0].numerator, 4);
    }

    #[test]
    fn same_tick_replaces_last_entry() {
        let mut map = TempoMap::new(192);
        map.add_tempo(0, 180.0).unwrap();
        assert_eq!(map.tempos().len(), 1);
        assert_eq!(map.tempos()[0].beats_per_minute, 180.0);
    }

    #[test]
    fn earlier_tick_is_rejected() {
        let mut map = TempoMap::new(192);
        map.add_tempo(400, 90.0).unwrap();
        assert_eq!(map.add_tempo(200, 60.0), Err(OutOfOrderError { tick: 200 }));
    }

    #[test]
    fn tick_to_time_matches_manual_computation() {
        let mut map = TempoMap::new(192);
        // 120 BPM until tick 384 (2 beats = 1 second), then 60 BPM.
        map.add_tempo(384, 60.0).unwrap();
        assert_eq!(map.tick_to_time(0), 0.0);
        assert_eq!(map.tick_to_time(192), 0.5);
        assert_eq!(map.tick_to_time(384), 1.0);
        // One beat at 60 BPM takes a full second.
        assert_eq!(map.tick_to_time(576), 2.0);
    }

    #[test]
    fn tick_to_time_is_monotonic() {
        let mut map = TempoMap::new(480);
        map.add_tempo(480, 200.0).unwrap();
        map.add_tempo(960, 90.0).unwrap();
        map.add_tempo(1440, 250.0).unwrap();
        let mut last = f64::MIN;
        for tick in (0..2400).step_by(60) {
            let time = map.tick_to_time(tick);
            assert!(time >= last, "time went backwards at tick {tick}");
            last = time;
        }
    }
}
