use healthday_core::calendar::{
    add_days, day_key_of, minutes_since_midnight, start_of_day, weekday_label,
};
use healthday_core::{DayKey, FIXED_OFFSET_MS};

const HOUR_MS: i64 = 60 * 60 * 1000;

// 2024-03-10T00:00:00Z
const MARCH_10_UTC_MS: i64 = 1_710_028_800_000;

// Day keys come from epoch arithmetic alone, so the host `TZ` never enters.
#[test]
fn day_key_follows_fixed_offset_not_host_timezone() {
    let last_local_minute = MARCH_10_UTC_MS + 16 * HOUR_MS + 59 * 60 * 1000; // 23:59 at +07
    let local_midnight = MARCH_10_UTC_MS + 17 * HOUR_MS;

    assert_eq!(day_key_of(last_local_minute).unwrap(), DayKey::from_ymd(2024, 3, 10).unwrap());
    assert_eq!(minutes_since_midnight(last_local_minute).unwrap(), 23 * 60 + 59);
    assert_eq!(day_key_of(local_midnight).unwrap(), DayKey::from_ymd(2024, 3, 11).unwrap());
    assert_eq!(start_of_day(DayKey::from_ymd(2024, 3, 11).unwrap()), local_midnight);
}

#[test]
fn every_instant_of_a_day_maps_back_to_it() {
    let day = DayKey::from_ymd(2023, 12, 31).unwrap();
    let start = start_of_day(day);
    for hour in 0..24 {
        let instant = start + hour * HOUR_MS;
        assert_eq!(day_key_of(instant).unwrap(), day);
        assert_eq!(minutes_since_midnight(instant).unwrap(), hour as u32 * 60);
    }
    assert_eq!(
        day_key_of(start + 24 * HOUR_MS).unwrap(),
        add_days(day, 1).unwrap()
    );
}

#[test]
fn start_of_day_is_utc_midnight_minus_offset() {
    let day = DayKey::from_ymd(1970, 1, 2).unwrap();
    assert_eq!(start_of_day(day), 24 * HOUR_MS - FIXED_OFFSET_MS);
    assert_eq!(day_key_of(-FIXED_OFFSET_MS).unwrap(), DayKey::from_ymd(1970, 1, 1).unwrap());
    assert_eq!(day_key_of(-FIXED_OFFSET_MS - 1).unwrap(), DayKey::from_ymd(1969, 12, 31).unwrap());
}

#[test]
fn week_walk_crosses_year_boundary() {
    let today = DayKey::from_ymd(2024, 1, 3).unwrap();
    let labels = (0..7)
        .rev()
        .map(|offset| weekday_label(add_days(today, -offset).unwrap()))
        .collect::<Vec<_>>();
    assert_eq!(labels, vec!["Thu", "Fri", "Sat", "Sun", "Mon", "Tue", "Wed"]);
}
