//! Slot grid, talk inputs and the resulting timetable
//!
//! A slot is a (day, session, position, room) quadruple with a fixed
//! duration in minutes; length 0 marks a slot that does not exist (rooms
//! differ in how many positions a session has). A slot holds at most one
//! talk.

use std::collections::BTreeMap;

use progcom_common::{Error, Result};

/// Coordinates of one slot in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    pub day: usize,
    pub session: usize,
    pub slot: usize,
    pub room: usize,
}

/// A room with its seating capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSpec {
    pub name: String,
    pub capacity: u32,
}

/// The full grid of slots available for scheduling.
#[derive(Debug, Clone)]
pub struct ScheduleGrid {
    days: usize,
    sessions: usize,
    slots: usize,
    rooms: Vec<RoomSpec>,
    /// Flat `[day][session][slot][room]` lengths in minutes.
    slot_length: Vec<u32>,
}

impl ScheduleGrid {
    pub fn new(days: usize, sessions: usize, slots: usize, rooms: Vec<RoomSpec>) -> ScheduleGrid {
        let cells = days * sessions * slots * rooms.len();
        ScheduleGrid {
            days,
            sessions,
            slots,
            rooms,
            slot_length: vec![0; cells],
        }
    }

    pub fn days(&self) -> usize {
        self.days
    }

    pub fn sessions(&self) -> usize {
        self.sessions
    }

    pub fn slots_per_session(&self) -> usize {
        self.slots
    }

    pub fn rooms(&self) -> &[RoomSpec] {
        &self.rooms
    }

    fn index(&self, key: SlotKey) -> usize {
        ((key.day * self.sessions + key.session) * self.slots + key.slot) * self.rooms.len()
            + key.room
    }

    /// Declare a slot's duration; 0 removes it from the grid.
    pub fn set_slot_length(&mut self, key: SlotKey, minutes: u32) {
        let index = self.index(key);
        self.slot_length[index] = minutes;
    }

    pub fn slot_length(&self, key: SlotKey) -> u32 {
        self.slot_length[self.index(key)]
    }

    /// All coordinates, existing or not.
    pub fn iter_keys(&self) -> impl Iterator<Item = SlotKey> + '_ {
        let (days, sessions, slots, rooms) = (self.days, self.sessions, self.slots, self.rooms.len());
        (0..days).flat_map(move |day| {
            (0..sessions).flat_map(move |session| {
                (0..slots).flat_map(move |slot| {
                    (0..rooms).map(move |room| SlotKey {
                        day,
                        session,
                        slot,
                        room,
                    })
                })
            })
        })
    }

    /// Coordinates of slots that exist (length > 0), in deterministic
    /// order.
    pub fn existing_slots(&self) -> Vec<SlotKey> {
        self.iter_keys()
            .filter(|&key| self.slot_length(key) > 0)
            .collect()
    }
}

/// A talk as seen by the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct TalkInput {
    pub code: String,
    /// Minutes; must match the length of exactly one assigned slot.
    pub duration: u32,
    pub main_track: Option<String>,
    pub sub_track: Option<String>,
    /// Public-vote score, any non-negative scale; normalized internally.
    pub popularity: f64,
    pub sponsored: bool,
}

/// Where a talk landed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledSlot {
    pub day: usize,
    pub session: usize,
    pub position: usize,
    pub room: usize,
    pub room_name: String,
    pub minutes: u32,
}

/// The decoded schedule: talk code to slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timetable {
    pub entries: BTreeMap<String, ScheduledSlot>,
}

impl Timetable {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check the structural invariants: every talk placed exactly once in
    /// a slot of matching length, and no slot hosting two talks.
    pub fn validate(&self, talks: &[TalkInput]) -> Result<()> {
        let mut used: BTreeMap<(usize, usize, usize, usize), &str> = BTreeMap::new();
        for talk in talks {
            let Some(slot) = self.entries.get(&talk.code) else {
                return Err(Error::NoSchedule(format!(
                    "talk {} missing from the solution",
                    talk.code
                )));
            };
            if slot.minutes != talk.duration {
                return Err(Error::NoSchedule(format!(
                    "talk {} placed in a {}-minute slot but lasts {} minutes",
                    talk.code, slot.minutes, talk.duration
                )));
            }
            let cell = (slot.day, slot.session, slot.position, slot.room);
            if let Some(other) = used.insert(cell, &talk.code) {
                return Err(Error::NoSchedule(format!(
                    "talks {} and {} share slot {:?}",
                    other, talk.code, cell
                )));
            }
        }
        Ok(())
    }
}
