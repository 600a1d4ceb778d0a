#![no_main]

//! Fuzz target for elapsed-time arithmetic and its display.
//!
//! Arbitrary start/now pairs (including a start in the future) must give a
//! non-negative elapsed time and formatting must not panic.

use arbitrary::Arbitrary;
use chrono::{DateTime, Utc};
use libfuzzer_sys::fuzz_target;

use redminecli::presenter::{format_clock, format_hours};
use redminecli::timer::{elapsed_hours, elapsed_since, round_hours};

#[derive(Arbitrary, Debug)]
struct ElapsedInput {
    started_secs: i32,
    now_secs: i32,
    raw_hours: f64,
}

fuzz_target!(|input: ElapsedInput| {
    let (Some(started), Some(now)) = (
        DateTime::<Utc>::from_timestamp(i64::from(input.started_secs), 0),
        DateTime::<Utc>::from_timestamp(i64::from(input.now_secs), 0),
    ) else {
        return;
    };

    let elapsed = elapsed_since(started, now);
    assert!(elapsed >= chrono::Duration::zero());
    let hours = elapsed_hours(elapsed);
    assert!(hours >= 0.0);
    let _ = format_clock(elapsed);
    let _ = format_hours(hours);

    if input.raw_hours.is_finite() && input.raw_hours.abs() < 1e6 {
        let rounded = round_hours(input.raw_hours);
        assert!((rounded - input.raw_hours).abs() <= 0.005 + 1e-6);
    }
});
