//! Conversions between CQL `timestamp` values and Unix nanoseconds
//!
//! CQL stores timestamps as signed 64-bit milliseconds since the Unix epoch;
//! application code works in nanoseconds. Milliseconds to nanoseconds is
//! exact. Nanoseconds to milliseconds floors, dropping sub-millisecond
//! precision (negative values round toward negative infinity).
//!
//! Only milliseconds within about ±292 years of the epoch fit in `i64`
//! nanoseconds. Outside that range [`cql_timestamp_to_unix_nanos`] overflows:
//! it panics in debug builds and wraps in release builds. Use
//! [`checked_cql_timestamp_to_unix_nanos`] when the input is untrusted.

use chrono::{DateTime, Utc};
use scylla::value::CqlTimestamp;

pub const NANOS_PER_MILLI: i64 = 1_000_000;

/// Convert a CQL timestamp (milliseconds) to Unix nanoseconds
pub fn cql_timestamp_to_unix_nanos(milliseconds: i64) -> i64 {
    milliseconds * NANOS_PER_MILLI
}

/// Convert a CQL timestamp to Unix nanoseconds, `None` on overflow
pub fn checked_cql_timestamp_to_unix_nanos(milliseconds: i64) -> Option<i64> {
    milliseconds.checked_mul(NANOS_PER_MILLI)
}

/// Convert Unix nanoseconds to a CQL timestamp (milliseconds), flooring
pub fn unix_nanos_to_cql_timestamp(nanoseconds: i64) -> i64 {
    nanoseconds.div_euclid(NANOS_PER_MILLI)
}

/// Unix nanoseconds of a driver timestamp value
pub fn unix_nanos_from_cql(timestamp: CqlTimestamp) -> i64 {
    cql_timestamp_to_unix_nanos(timestamp.0)
}

/// Driver timestamp value for Unix nanoseconds
pub fn cql_from_unix_nanos(nanoseconds: i64) -> CqlTimestamp {
    CqlTimestamp(unix_nanos_to_cql_timestamp(nanoseconds))
}

/// `None` when the timestamp is outside chrono's range
pub fn cql_timestamp_to_datetime(milliseconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(milliseconds)
}

pub fn datetime_to_cql_timestamp(datetime: &DateTime<Utc>) -> i64 {
    datetime.timestamp_millis()
}
