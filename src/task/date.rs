#![forbid(unsafe_code)]

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::error::TaskError;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<Date, TaskError> {
    Date::parse(input.trim(), DATE_FORMAT).map_err(|_| TaskError::InvalidDate {
        value: input.to_owned(),
    })
}

#[must_use]
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Current calendar date in the local timezone, UTC when the offset is unknown.
#[must_use]
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

#[must_use]
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_owned())
}

/// Serde adapter for `Option<Date>` stored as a `YYYY-MM-DD` string.
///
/// A missing field, `null` and `""` all read back as `None`.
pub mod optional {
    use serde::{Deserialize as _, Deserializer, Serializer};
    use time::Date;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Date>, ser: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => ser.serialize_some(&super::format_date(*d)),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Date>, D::Error> {
        let raw: Option<String> = Option::deserialize(de)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_date(s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_date("2024-12-01").unwrap(), date!(2024 - 12 - 01));
        assert_eq!(parse_date(" 2024-02-29 ").unwrap(), date!(2024 - 02 - 29));
    }

    #[test]
    fn rejects_malformed_dates() {
        for bad in ["", "2024/12/01", "2024-13-01", "2023-02-29", "tomorrow", "2024-12-01x"] {
            let err = parse_date(bad).unwrap_err();
            assert!(
                matches!(err, TaskError::InvalidDate { ref value } if value == bad),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(format_date(date!(2024 - 01 - 05)), "2024-01-05");
    }
}
