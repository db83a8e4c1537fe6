//! Integer encodings of the server's temporal types.
//!
//! Date-bearing types are counted from 1970-01-01T00:00:00, time-of-day types
//! from midnight. `MONTH` is `year * 12 + month - 1`.

use crate::{core::data_type::DataType, core::value::Value, error::ModelError};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

const NANOS_PER_SECOND: i128 = 1_000_000_000;
const NANOS_PER_DAY: i128 = 86_400 * NANOS_PER_SECOND;

/// Position of a temporal value on its time axis, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Instant(i128),
    TimeOfDay(i128),
}

pub(crate) fn from_datetime(value: NaiveDateTime) -> Axis {
    let utc = value.and_utc();
    Axis::Instant(
        utc.timestamp() as i128 * NANOS_PER_SECOND + utc.timestamp_subsec_nanos() as i128,
    )
}

pub(crate) fn from_date(value: NaiveDate) -> Axis {
    from_datetime(value.and_time(NaiveTime::MIN))
}

pub(crate) fn from_time(value: NaiveTime) -> Axis {
    Axis::TimeOfDay(
        value.num_seconds_from_midnight() as i128 * NANOS_PER_SECOND
            + value.nanosecond().min(999_999_999) as i128,
    )
}

/// Reads the axis position of an already encoded temporal value.
pub(crate) fn axis_of(value: &Value) -> Option<Axis> {
    let axis = match *value {
        Value::Date(days) => Axis::Instant(days as i128 * NANOS_PER_DAY),
        Value::Month(months) => {
            let date = month_start(months)?;
            return Some(from_date(date));
        }
        Value::DateHour(hours) => Axis::Instant(hours as i128 * 3_600 * NANOS_PER_SECOND),
        Value::DateTime(secs) => Axis::Instant(secs as i128 * NANOS_PER_SECOND),
        Value::Timestamp(ms) => Axis::Instant(ms as i128 * 1_000_000),
        Value::NanoTimestamp(ns) => Axis::Instant(ns as i128),
        Value::Time(ms) => Axis::TimeOfDay(ms as i128 * 1_000_000),
        Value::Minute(m) => Axis::TimeOfDay(m as i128 * 60 * NANOS_PER_SECOND),
        Value::Second(s) => Axis::TimeOfDay(s as i128 * NANOS_PER_SECOND),
        Value::NanoTime(ns) => Axis::TimeOfDay(ns as i128),
        _ => return None,
    };
    Some(axis)
}

/// Encodes an axis position as `target`. Time-of-day targets accept instants
/// (the time of day is kept); date-bearing targets need an instant.
pub(crate) fn encode(target: DataType, axis: Axis) -> Option<Value> {
    let (instant, time_of_day) = match axis {
        Axis::Instant(ns) => (Some(ns), ns.rem_euclid(NANOS_PER_DAY)),
        Axis::TimeOfDay(ns) => (None, ns),
    };

    let value = match target {
        DataType::Time => Value::Time(narrow(time_of_day / 1_000_000)?),
        DataType::Minute => Value::Minute(narrow(time_of_day / (60 * NANOS_PER_SECOND))?),
        DataType::Second => Value::Second(narrow(time_of_day / NANOS_PER_SECOND)?),
        DataType::NanoTime => Value::NanoTime(narrow(time_of_day)?),
        DataType::Date => Value::Date(narrow(instant?.div_euclid(NANOS_PER_DAY))?),
        DataType::Month => {
            let date = to_datetime(instant?)?.date();
            Value::Month(date.year() * 12 + date.month0() as i32)
        }
        DataType::DateHour => {
            Value::DateHour(narrow(instant?.div_euclid(3_600 * NANOS_PER_SECOND))?)
        }
        DataType::DateTime => Value::DateTime(narrow(instant?.div_euclid(NANOS_PER_SECOND))?),
        DataType::Timestamp => Value::Timestamp(narrow(instant?.div_euclid(1_000_000))?),
        DataType::NanoTimestamp => Value::NanoTimestamp(narrow(instant?)?),
        _ => return None,
    };
    Some(value)
}

/// Converts between temporal subtypes sharing an axis.
pub fn cast(value: &Value, target: DataType) -> Result<Value, ModelError> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    let source = value.data_type();
    let compatible = match source {
        Some(s) if s.is_temporal() && target.is_temporal() => {
            (target.has_date() && s.has_date()) || (!target.has_date() && s.has_time())
        }
        _ => false,
    };

    let cast_error = || ModelError::TemporalCast {
        from: source.map_or_else(|| "NULL".to_string(), |s| s.to_string()),
        to: target.to_string(),
    };

    if !compatible {
        return Err(cast_error());
    }

    axis_of(value)
        .and_then(|axis| encode(target, axis))
        .ok_or_else(cast_error)
}

pub(crate) fn format(data_type: DataType, axis: Axis) -> Option<String> {
    let text = match axis {
        Axis::Instant(ns) => {
            let dt = to_datetime(ns)?;
            let pattern = match data_type {
                DataType::Date => "%Y.%m.%d",
                DataType::Month => "%Y.%mM",
                DataType::DateHour => "%Y.%m.%dT%H",
                DataType::DateTime => "%Y.%m.%dT%H:%M:%S",
                DataType::Timestamp => "%Y.%m.%dT%H:%M:%S%.3f",
                _ => "%Y.%m.%dT%H:%M:%S%.9f",
            };
            dt.format(pattern).to_string()
        }
        Axis::TimeOfDay(ns) => {
            let secs = u32::try_from(ns.div_euclid(NANOS_PER_SECOND)).ok()?;
            let nanos = u32::try_from(ns.rem_euclid(NANOS_PER_SECOND)).ok()?;
            let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)?;
            let pattern = match data_type {
                DataType::Time => "%H:%M:%S%.3f",
                DataType::Minute => "%H:%Mm",
                DataType::Second => "%H:%M:%S",
                _ => "%H:%M:%S%.9f",
            };
            time.format(pattern).to_string()
        }
    };
    Some(text)
}

fn month_start(months: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(months.div_euclid(12), months.rem_euclid(12) as u32 + 1, 1)
}

fn to_datetime(ns: i128) -> Option<NaiveDateTime> {
    let secs = i64::try_from(ns.div_euclid(NANOS_PER_SECOND)).ok()?;
    let nanos = u32::try_from(ns.rem_euclid(NANOS_PER_SECOND)).ok()?;
    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
}

fn narrow<T: TryFrom<i128>>(value: i128) -> Option<T> {
    T::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_encodes_dates_from_epoch() {
        let axis = from_date(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap());
        assert_eq!(encode(DataType::Date, axis), Some(Value::Date(1)));
        assert_eq!(encode(DataType::Month, axis), Some(Value::Month(1970 * 12)));
        assert_eq!(encode(DataType::DateTime, axis), Some(Value::DateTime(86_400)));
    }

    #[test]
    fn test_time_of_day_targets_keep_clock_time() {
        let axis = from_datetime(datetime(2022, 1, 1, 1, 1, 1));
        assert_eq!(encode(DataType::Second, axis), Some(Value::Second(3_661)));
        assert_eq!(encode(DataType::Minute, axis), Some(Value::Minute(61)));
        assert_eq!(encode(DataType::Time, axis), Some(Value::Time(3_661_000)));
    }

    #[test]
    fn test_cast_between_subtypes() {
        let ts = Value::Timestamp(86_400_000 + 1_500);
        assert_eq!(cast(&ts, DataType::Date).unwrap(), Value::Date(1));
        assert_eq!(cast(&ts, DataType::DateTime).unwrap(), Value::DateTime(86_401));
        assert_eq!(cast(&Value::Month(24_288), DataType::Date).unwrap(), Value::Date(19_723));
        assert_eq!(cast(&Value::Null, DataType::Date).unwrap(), Value::Null);
    }

    #[test]
    fn test_cast_across_axes_fails() {
        let err = cast(&Value::Time(1_000), DataType::Date).unwrap_err();
        assert_eq!(err.to_string(), "can't convert type from TIME to DATE");
        assert!(cast(&Value::Date(3), DataType::Time).is_err());
        assert!(cast(&Value::Int(3), DataType::Date).is_err());
    }

    #[test]
    fn test_negative_instants_round_down() {
        let axis = from_datetime(datetime(1969, 12, 31, 23, 0, 0));
        assert_eq!(encode(DataType::Date, axis), Some(Value::Date(-1)));
        assert_eq!(encode(DataType::Time, axis), Some(Value::Time(82_800_000)));
    }

    #[test]
    fn test_format() {
        assert_eq!(
            format(DataType::Date, axis_of(&Value::Date(19_723)).unwrap()).unwrap(),
            "2024.01.01"
        );
        assert_eq!(
            format(DataType::Minute, axis_of(&Value::Minute(61)).unwrap()).unwrap(),
            "01:01m"
        );
    }
}
