// ── Availability calendar logic ──
//
// Pure functions over (slots, now). The expiry sweeper, the publish
// validation, and the next-window suggestion all live here so they can
// be exercised with a fixed clock and no networking.
//
// The clock convention throughout is the viewer's local wall-clock
// time, carried as `NaiveDateTime` -- timezone conversion is explicitly
// out of scope for the scheduling domain.

use std::collections::BTreeMap;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::CoreError;
use crate::model::{AvailabilityCalendar, PropertyId, SlotTime, TimeSlot};

/// Minimum interval between "now" and a newly published slot's start.
pub const SLOT_LEAD_TIME_MIN: i64 = 10;

/// Advisory slot length; `end` is derived as `start + 30min`.
pub const SLOT_DURATION_MIN: u32 = 30;

/// How often the local expiry sweeper prunes the cached calendar.
pub const SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(60);

/// How often the visit views are re-fetched from the backend.
pub const VISIT_POLL_INTERVAL: StdDuration = StdDuration::from_secs(20);

fn lead_time() -> Duration {
    Duration::minutes(SLOT_LEAD_TIME_MIN)
}

// ── Input validation ────────────────────────────────────────────────

/// Parse raw `HH:MM` strings, silently dropping malformed entries.
///
/// This mirrors the publish form's behavior: junk input never reaches
/// validation, only well-formed times do.
pub fn parse_times(raw: &[String]) -> Vec<SlotTime> {
    raw.iter().filter_map(|s| s.parse().ok()).collect()
}

/// Lead-time check for a publish batch: every candidate must satisfy
/// `date@time >= now + 10min`. All-or-nothing -- if any time fails, the
/// whole batch is rejected and the offenders are named.
pub fn validate_slot_times(
    date: NaiveDate,
    times: &[SlotTime],
    now: NaiveDateTime,
) -> Result<(), CoreError> {
    let threshold = now + lead_time();
    let offending: Vec<String> = times
        .iter()
        .filter(|t| date.and_time(t.to_naive()) < threshold)
        .map(ToString::to_string)
        .collect();

    if offending.is_empty() {
        Ok(())
    } else {
        Err(CoreError::LeadTimeViolation { offending })
    }
}

/// Future-time check for visit requests: strictly after "now".
pub fn validate_schedule_time(at: NaiveDateTime, now: NaiveDateTime) -> Result<(), CoreError> {
    if at > now {
        Ok(())
    } else {
        Err(CoreError::PastScheduleTime { at })
    }
}

// ── Calendar construction & pruning ─────────────────────────────────

/// Build a pruned calendar from a raw slot list: group by date, order
/// by start time, and drop everything at or before "now".
///
/// Duplicate `(date, start)` pairs are kept as-is -- deduplication is
/// the backend's discretion, not ours.
pub fn build_calendar(
    property_id: PropertyId,
    slots: Vec<TimeSlot>,
    now: NaiveDateTime,
) -> AvailabilityCalendar {
    let today = now.date();
    let now_time = now.time();

    let mut days: BTreeMap<NaiveDate, Vec<TimeSlot>> = BTreeMap::new();
    for slot in slots {
        if slot.date < today || (slot.date == today && slot.start.to_naive() <= now_time) {
            continue;
        }
        days.entry(slot.date).or_default().push(slot);
    }
    for slots in days.values_mut() {
        slots.sort_by_key(|s| s.start);
    }

    AvailabilityCalendar::from_days(property_id, days)
}

/// One expiry sweep over a cached calendar.
///
/// Dates before today are removed wholesale; for today, slots whose
/// start has been reached (`start <= now_time`) are dropped; dates left
/// empty disappear entirely. Returns `None` when the sweep changed
/// nothing, so callers can skip replacing the cache (and waking
/// subscribers) on quiet ticks. Idempotent: sweeping twice with the
/// same clock is a no-op the second time.
pub fn prune(
    calendar: &AvailabilityCalendar,
    now: NaiveDateTime,
) -> Option<AvailabilityCalendar> {
    let today = now.date();
    let now_time = now.time();

    let mut changed = false;
    let mut days: BTreeMap<NaiveDate, Vec<TimeSlot>> = BTreeMap::new();

    for (date, slots) in calendar.iter() {
        if *date < today {
            changed = true;
            continue;
        }
        if *date == today {
            let kept: Vec<TimeSlot> = slots
                .iter()
                .filter(|s| s.start.to_naive() > now_time)
                .cloned()
                .collect();
            if kept.len() != slots.len() {
                changed = true;
            }
            if !kept.is_empty() {
                days.insert(*date, kept);
            }
        } else {
            // Dates strictly after today are never touched by the
            // time-of-day check.
            days.insert(*date, slots.clone());
        }
    }

    changed.then(|| AvailabilityCalendar::from_days(calendar.property_id().clone(), days))
}

// ── Suggestion ──────────────────────────────────────────────────────

/// Suggest the next publishable half-hour window for `date`.
///
/// Computes the next half-hour-aligned start at or after `now + lead
/// time`, paired with an end 30 minutes later. Returns `None` when no
/// such pair validates against `date`: the date is today and the clock
/// has run out of half-hour marks, or the advisory end would cross
/// midnight.
pub fn suggest_next_window(date: NaiveDate, now: NaiveDateTime) -> Option<(SlotTime, SlotTime)> {
    let candidate = align_up_half_hour(now + lead_time());
    if candidate.date() > date {
        return None;
    }
    let start = SlotTime::from_naive(candidate.time());
    let end = start.plus_minutes(SLOT_DURATION_MIN)?;
    Some((start, end))
}

/// Round up to the next half-hour mark (already-aligned instants are
/// kept). May roll over into the next day.
fn align_up_half_hour(t: NaiveDateTime) -> NaiveDateTime {
    let whole_minute = NaiveTime::from_hms_opt(t.hour(), t.minute(), 0)
        .expect("hour/minute taken from a valid time");
    let mut aligned = t.date().and_time(whole_minute);
    if t > aligned {
        aligned += Duration::minutes(1);
    }
    let rem = i64::from(aligned.minute()) % 30;
    if rem != 0 {
        aligned += Duration::minutes(30 - rem);
    }
    aligned
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::SlotId;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at(date: NaiveDate, h: u32, min: u32, s: u32) -> NaiveDateTime {
        date.and_hms_opt(h, min, s).unwrap()
    }

    fn t(raw: &str) -> SlotTime {
        raw.parse().unwrap()
    }

    fn slot(id: &str, date: NaiveDate, start: &str) -> TimeSlot {
        let start = t(start);
        TimeSlot {
            id: SlotId::from(id),
            property_id: "prop-1".into(),
            date,
            start,
            end: start
                .plus_minutes(SLOT_DURATION_MIN)
                .unwrap_or(start),
        }
    }

    // ── parse_times ────────────────────────────────────────────────

    #[test]
    fn parse_times_silently_drops_malformed() {
        let raw = vec![
            "10:00".to_owned(),
            "banana".to_owned(),
            "9:30".to_owned(),
            "10:30".to_owned(),
        ];
        assert_eq!(parse_times(&raw), vec![t("10:00"), t("10:30")]);
    }

    // ── Lead-time invariant ────────────────────────────────────────

    #[test]
    fn slot_exactly_at_lead_time_is_accepted() {
        let now = at(d(2026, 3, 13), 9, 0, 0);
        assert!(validate_slot_times(d(2026, 3, 13), &[t("09:10")], now).is_ok());
    }

    #[test]
    fn slot_one_second_inside_lead_window_is_rejected() {
        let now = at(d(2026, 3, 13), 9, 0, 1);
        let err = validate_slot_times(d(2026, 3, 13), &[t("09:10")], now).unwrap_err();
        match err {
            CoreError::LeadTimeViolation { offending } => {
                assert_eq!(offending, vec!["09:10".to_owned()]);
            }
            other => panic!("expected LeadTimeViolation, got {other:?}"),
        }
    }

    #[test]
    fn batch_is_all_or_nothing_and_names_offenders() {
        // 10:00 would be fine on its own; 09:05 poisons the batch.
        let now = at(d(2026, 3, 13), 9, 0, 0);
        let err =
            validate_slot_times(d(2026, 3, 13), &[t("10:00"), t("09:05")], now).unwrap_err();
        match err {
            CoreError::LeadTimeViolation { offending } => {
                assert_eq!(offending, vec!["09:05".to_owned()]);
            }
            other => panic!("expected LeadTimeViolation, got {other:?}"),
        }
    }

    #[test]
    fn scenario_a_tomorrow_accepted_today_short_notice_rejected() {
        // 09:00 today: tomorrow 10:00 and 10:30 both clear the lead window.
        let now = at(d(2026, 3, 13), 9, 0, 0);
        assert!(
            validate_slot_times(d(2026, 3, 14), &[t("10:00"), t("10:30")], now).is_ok()
        );

        // 09:25 today: 09:30 today is only 5 minutes out.
        let now = at(d(2026, 3, 13), 9, 25, 0);
        assert!(validate_slot_times(d(2026, 3, 13), &[t("09:30")], now).is_err());
    }

    #[test]
    fn visit_schedule_must_be_strictly_future() {
        let now = at(d(2026, 3, 13), 9, 0, 0);
        assert!(validate_schedule_time(at(d(2026, 3, 14), 9, 0, 0), now).is_ok());
        assert!(validate_schedule_time(now, now).is_err());
        assert!(validate_schedule_time(at(d(2026, 3, 13), 8, 59, 59), now).is_err());
    }

    // ── build_calendar ─────────────────────────────────────────────

    #[test]
    fn build_groups_sorts_and_prunes() {
        let now = at(d(2026, 3, 13), 12, 0, 0);
        let slots = vec![
            slot("s1", d(2026, 3, 14), "10:30"),
            slot("s2", d(2026, 3, 14), "10:00"),
            slot("s3", d(2026, 3, 13), "11:00"), // already past
            slot("s4", d(2026, 3, 13), "15:00"),
            slot("s5", d(2026, 3, 12), "10:00"), // yesterday
        ];

        let cal = build_calendar("prop-1".into(), slots, now);

        assert_eq!(cal.available_dates(), vec![d(2026, 3, 13), d(2026, 3, 14)]);
        let tomorrow: Vec<&str> = cal
            .slots_on(d(2026, 3, 14))
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(tomorrow, vec!["s2", "s1"]);
        assert_eq!(cal.slots_on(d(2026, 3, 13)).len(), 1);
    }

    #[test]
    fn build_keeps_duplicate_start_times() {
        let now = at(d(2026, 3, 13), 9, 0, 0);
        let slots = vec![
            slot("s1", d(2026, 3, 14), "10:00"),
            slot("s2", d(2026, 3, 14), "10:00"),
        ];
        let cal = build_calendar("prop-1".into(), slots, now);
        assert_eq!(cal.slots_on(d(2026, 3, 14)).len(), 2);
    }

    // ── prune ──────────────────────────────────────────────────────

    #[test]
    fn scenario_c_partial_day_prune_keeps_date() {
        let now = at(d(2026, 3, 13), 9, 0, 0);
        let cal = build_calendar(
            "prop-1".into(),
            vec![
                slot("s1", d(2026, 3, 13), "10:00"),
                slot("s2", d(2026, 3, 13), "10:30"),
            ],
            now,
        );

        // The clock passes the first slot's start but not the second's.
        let later = at(d(2026, 3, 13), 10, 5, 0);
        let pruned = prune(&cal, later).expect("first slot expired, sweep must report change");

        assert_eq!(pruned.available_dates(), vec![d(2026, 3, 13)]);
        let ids: Vec<&str> = pruned
            .slots_on(d(2026, 3, 13))
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["s2"]);
    }

    #[test]
    fn slot_at_exact_start_time_is_expired() {
        let now = at(d(2026, 3, 13), 8, 0, 0);
        let cal = build_calendar(
            "prop-1".into(),
            vec![slot("s1", d(2026, 3, 13), "10:00")],
            now,
        );
        // startTime <= nowTime counts as past.
        let pruned = prune(&cal, at(d(2026, 3, 13), 10, 0, 0)).unwrap();
        assert!(pruned.is_empty());
    }

    #[test]
    fn fully_expired_date_is_removed_not_left_empty() {
        let now = at(d(2026, 3, 13), 8, 0, 0);
        let cal = build_calendar(
            "prop-1".into(),
            vec![
                slot("s1", d(2026, 3, 13), "09:00"),
                slot("s2", d(2026, 3, 13), "09:30"),
                slot("s3", d(2026, 3, 14), "10:00"),
            ],
            now,
        );

        let pruned = prune(&cal, at(d(2026, 3, 13), 11, 0, 0)).unwrap();
        assert_eq!(pruned.available_dates(), vec![d(2026, 3, 14)]);
        assert!(pruned.slots_on(d(2026, 3, 13)).is_empty());
    }

    #[test]
    fn whole_past_dates_removed_and_future_dates_untouched() {
        let built_at = at(d(2026, 3, 12), 8, 0, 0);
        let cal = build_calendar(
            "prop-1".into(),
            vec![
                slot("s1", d(2026, 3, 12), "23:30"),
                slot("s2", d(2026, 3, 14), "00:15"),
            ],
            built_at,
        );

        // Next morning: the 12th disappears wholesale; the 14th keeps a
        // slot earlier than the current time-of-day.
        let pruned = prune(&cal, at(d(2026, 3, 13), 9, 0, 0)).unwrap();
        assert_eq!(pruned.available_dates(), vec![d(2026, 3, 14)]);
        assert_eq!(pruned.slots_on(d(2026, 3, 14)).len(), 1);
    }

    #[test]
    fn prune_is_idempotent() {
        let now = at(d(2026, 3, 13), 9, 0, 0);
        let cal = build_calendar(
            "prop-1".into(),
            vec![
                slot("s1", d(2026, 3, 13), "10:00"),
                slot("s2", d(2026, 3, 13), "10:30"),
            ],
            now,
        );

        let later = at(d(2026, 3, 13), 10, 5, 0);
        let once = prune(&cal, later).unwrap();
        // Immediately sweeping again must change nothing.
        assert_eq!(prune(&once, later), None);
    }

    #[test]
    fn prune_reports_no_change_on_future_only_calendar() {
        let now = at(d(2026, 3, 13), 9, 0, 0);
        let cal = build_calendar(
            "prop-1".into(),
            vec![slot("s1", d(2026, 3, 20), "10:00")],
            now,
        );
        assert_eq!(prune(&cal, now), None);
    }

    // ── suggest_next_window ────────────────────────────────────────

    #[test]
    fn suggestion_rounds_up_to_half_hour() {
        let now = at(d(2026, 3, 13), 9, 25, 0);
        let (start, end) = suggest_next_window(d(2026, 3, 13), now).unwrap();
        assert_eq!(start, t("10:00"));
        assert_eq!(end, t("10:30"));
    }

    #[test]
    fn suggestion_keeps_exactly_aligned_threshold() {
        // 09:20 + 10min = 09:30, already on a half-hour mark.
        let now = at(d(2026, 3, 13), 9, 20, 0);
        let (start, _) = suggest_next_window(d(2026, 3, 13), now).unwrap();
        assert_eq!(start, t("09:30"));
    }

    #[test]
    fn suggestion_rounds_partial_seconds_up() {
        // 09:19:30 + 10min = 09:29:30 -> next mark is 09:30.
        let now = at(d(2026, 3, 13), 9, 19, 30);
        let (start, _) = suggest_next_window(d(2026, 3, 13), now).unwrap();
        assert_eq!(start, t("09:30"));
    }

    #[test]
    fn suggestion_fails_for_today_when_clock_runs_out() {
        // 23:40 + 10min aligns to midnight -- no slot left today.
        let now = at(d(2026, 3, 13), 23, 40, 0);
        assert_eq!(suggest_next_window(d(2026, 3, 13), now), None);
        // The same clock still suggests for tomorrow.
        let (start, end) = suggest_next_window(d(2026, 3, 14), now).unwrap();
        assert_eq!(start, t("00:00"));
        assert_eq!(end, t("00:30"));
    }

    #[test]
    fn suggestion_fails_when_end_would_cross_midnight() {
        // 23:15 + 10min aligns to 23:30; the paired end would land on
        // midnight, so nothing is suggested.
        let now = at(d(2026, 3, 13), 23, 15, 0);
        assert_eq!(suggest_next_window(d(2026, 3, 13), now), None);
    }

    #[test]
    fn suggestion_fails_for_past_dates() {
        let now = at(d(2026, 3, 13), 9, 0, 0);
        assert_eq!(suggest_next_window(d(2026, 3, 12), now), None);
    }
}
