//! Conflict rules between note flags.
//!
//! Each addable flag declares which existing flag blocks it and which
//! existing flag it displaces. The relation is deliberately asymmetric: Tap
//! displaces Forced, while Forced is blocked by Tap; Accent displaces Ghost,
//! while Ghost is blocked by Accent. Application order therefore matters and
//! is part of the format semantics.

use crate::song::{Note, NoteFlags};

/// One row of the conflict table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteFlagPriority {
    pub flag_to_add: NoteFlags,
    /// If set on the note, the addition is rejected.
    pub blocking_flag: NoteFlags,
    /// Cleared from the note when the addition succeeds.
    pub flag_to_remove: NoteFlags,
}

impl NoteFlagPriority {
    pub const FORCED: Self = Self {
        flag_to_add: NoteFlags::FORCED,
        blocking_flag: NoteFlags::TAP,
        flag_to_remove: NoteFlags::NONE,
    };
    pub const TAP: Self = Self {
        flag_to_add: NoteFlags::TAP,
        blocking_flag: NoteFlags::NONE,
        flag_to_remove: NoteFlags::FORCED,
    };
    pub const INSTRUMENT_PLUS: Self = Self {
        flag_to_add: NoteFlags::INSTRUMENT_PLUS,
        blocking_flag: NoteFlags::NONE,
        flag_to_remove: NoteFlags::NONE,
    };
    pub const CYMBAL: Self = Self {
        flag_to_add: NoteFlags::PRO_DRUMS_CYMBAL,
        blocking_flag: NoteFlags::NONE,
        flag_to_remove: NoteFlags::NONE,
    };
    pub const ACCENT: Self = Self {
        flag_to_add: NoteFlags::PRO_DRUMS_ACCENT,
        blocking_flag: NoteFlags::NONE,
        flag_to_remove: NoteFlags::PRO_DRUMS_GHOST,
    };
    pub const GHOST: Self = Self {
        flag_to_add: NoteFlags::PRO_DRUMS_GHOST,
        blocking_flag: NoteFlags::PRO_DRUMS_ACCENT,
        flag_to_remove: NoteFlags::NONE,
    };

    pub const ALL: [&'static Self; 6] = [
        &Self::FORCED,
        &Self::TAP,
        &Self::INSTRUMENT_PLUS,
        &Self::CYMBAL,
        &Self::ACCENT,
        &Self::GHOST,
    ];

    /// Applies the flag to a note. Returns `false` and leaves the note
    /// untouched when the blocking flag is already present.
    pub fn try_apply(&self, note: &mut Note) -> bool {
        if !self.blocking_flag.is_empty() && note.flags.contains(self.blocking_flag) {
            return false;
        }
        note.flags.insert(self.flag_to_add);
        if !self.flag_to_remove.is_empty() && note.flags.contains(self.flag_to_remove) {
            note.flags.remove(self.flag_to_remove);
        }
        true
    }

    /// Whether a flag set holds no contradiction against this row.
    #[must_use]
    pub fn are_flags_valid(&self, flags: NoteFlags) -> bool {
        if self.flag_to_add.is_empty() {
            return true;
        }
        if !self.blocking_flag.is_empty()
            && flags.contains(self.blocking_flag)
            && flags.contains(self.flag_to_add)
        {
            return false;
        }
        if !self.flag_to_remove.is_empty()
            && flags.contains(self.flag_to_add)
            && flags.contains(self.flag_to_remove)
        {
            return false;
        }
        true
    }

    /// Validates a flag set against the whole table, returning the first
    /// violated row.
    pub fn are_flags_valid_for_all(flags: NoteFlags) -> Result<(), &'static Self> {
        for priority in Self::ALL {
            if !priority.are_flags_valid(flags) {
                return Err(priority);
            }
        }
        Ok(())
    }
}
