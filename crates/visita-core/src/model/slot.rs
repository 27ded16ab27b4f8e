// ── Availability domain types ──
//
// A slot is a date plus an HH:MM start advertised by the property's
// agent. The calendar groups non-expired slots by date; everything here
// is plain data -- pruning and validation live in `crate::calendar`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::ids::{PropertyId, SlotId};

// ── SlotTime ────────────────────────────────────────────────────────

/// A time of day in strict `HH:MM` 24-hour form.
///
/// This is the shape slot times cross the wire in; parsing is strict
/// (exactly two digits, colon, two digits) and anything else is
/// rejected -- the availability layer silently drops malformed entries
/// before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime {
    hour: u8,
    minute: u8,
}

impl SlotTime {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Convert to a `chrono` time for comparisons against the clock.
    pub fn to_naive(self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .expect("SlotTime fields are range-checked on construction")
    }

    /// Truncate a clock reading to whole minutes.
    pub fn from_naive(t: NaiveTime) -> Self {
        Self {
            hour: u8::try_from(t.hour()).unwrap_or(23),
            minute: u8::try_from(t.minute()).unwrap_or(59),
        }
    }

    /// The time `minutes` later on the same day, or `None` if that
    /// would cross midnight.
    pub fn plus_minutes(self, minutes: u32) -> Option<Self> {
        let total = u32::from(self.hour) * 60 + u32::from(self.minute) + minutes;
        if total >= 24 * 60 {
            return None;
        }
        Self::new(
            u8::try_from(total / 60).ok()?,
            u8::try_from(total % 60).ok()?,
        )
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Error from parsing a malformed `HH:MM` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSlotTimeError(pub String);

impl fmt::Display for ParseSlotTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a valid HH:MM time: {:?}", self.0)
    }
}

impl std::error::Error for ParseSlotTimeError {}

impl FromStr for SlotTime {
    type Err = ParseSlotTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(ParseSlotTimeError(s.to_owned()));
        }
        let digits = |a: u8, b: u8| -> Option<u8> {
            if a.is_ascii_digit() && b.is_ascii_digit() {
                Some((a - b'0') * 10 + (b - b'0'))
            } else {
                None
            }
        };
        let hour = digits(bytes[0], bytes[1]);
        let minute = digits(bytes[3], bytes[4]);
        match (hour, minute) {
            (Some(h), Some(m)) => Self::new(h, m).ok_or_else(|| ParseSlotTimeError(s.to_owned())),
            _ => Err(ParseSlotTimeError(s.to_owned())),
        }
    }
}

impl Serialize for SlotTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ── TimeSlot ────────────────────────────────────────────────────────

/// An agent-published visit window for one property.
///
/// `end` is advisory (`start + 30min` in practice); only `date` and
/// `start` participate in expiry decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: SlotId,
    pub property_id: PropertyId,
    pub date: NaiveDate,
    pub start: SlotTime,
    pub end: SlotTime,
}

impl TimeSlot {
    /// The absolute instant this slot opens.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start.to_naive())
    }
}

// ── AvailabilityCalendar ────────────────────────────────────────────

/// Pruned, future-only view of one property's published slots.
///
/// Invariants (maintained by `crate::calendar`): dates ascend, slots
/// within a date ascend by start time, and no date maps to an empty
/// slot list -- a date whose slots all expired is removed entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityCalendar {
    property_id: PropertyId,
    days: BTreeMap<NaiveDate, Vec<TimeSlot>>,
}

impl AvailabilityCalendar {
    pub(crate) fn from_days(
        property_id: PropertyId,
        days: BTreeMap<NaiveDate, Vec<TimeSlot>>,
    ) -> Self {
        Self { property_id, days }
    }

    pub fn empty(property_id: PropertyId) -> Self {
        Self {
            property_id,
            days: BTreeMap::new(),
        }
    }

    pub fn property_id(&self) -> &PropertyId {
        &self.property_id
    }

    /// Dates with at least one non-expired slot, ascending.
    pub fn available_dates(&self) -> Vec<NaiveDate> {
        self.days.keys().copied().collect()
    }

    /// Slots for one date, ascending by start time. Empty for unknown dates.
    pub fn slots_on(&self, date: NaiveDate) -> &[TimeSlot] {
        self.days.get(&date).map_or(&[], Vec::as_slice)
    }

    /// Iterate `(date, slots)` pairs in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &Vec<TimeSlot>)> {
        self.days.iter()
    }

    pub fn slot_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn slot_time_parses_strict_hh_mm() {
        assert_eq!("09:05".parse::<SlotTime>().unwrap(), SlotTime::new(9, 5).unwrap());
        assert_eq!("23:59".parse::<SlotTime>().unwrap(), SlotTime::new(23, 59).unwrap());
    }

    #[test]
    fn slot_time_rejects_malformed() {
        for raw in ["9:05", "09:5", "0905", "24:00", "12:60", "ab:cd", "", "12:00:00"] {
            assert!(raw.parse::<SlotTime>().is_err(), "{raw:?} should not parse");
        }
    }

    #[test]
    fn slot_time_displays_zero_padded() {
        assert_eq!(SlotTime::new(7, 0).unwrap().to_string(), "07:00");
    }

    #[test]
    fn plus_minutes_stops_at_midnight() {
        let late = SlotTime::new(23, 45).unwrap();
        assert_eq!(late.plus_minutes(30), None);
        assert_eq!(
            SlotTime::new(23, 30).unwrap().plus_minutes(29),
            Some(SlotTime::new(23, 59).unwrap())
        );
    }

    #[test]
    fn slot_time_orders_chronologically() {
        let a = SlotTime::new(9, 30).unwrap();
        let b = SlotTime::new(10, 0).unwrap();
        assert!(a < b);
    }
}
