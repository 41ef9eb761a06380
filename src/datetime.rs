//! TOML date and time values.
//!
//! TOML has four temporal types: offset date-times, local date-times, local
//! dates and local times. [`Datetime`] holds any of them with the matching
//! `chrono` type. Through serde, a `Datetime` travels as a private
//! single-field struct, so that it is written back as a bare TOML datetime
//! rather than a string.
//!
//! ```rust
//! use serde_boa::Datetime;
//!
//! let dt: Datetime = "1979-05-27 07:32:00Z".parse().unwrap();
//! assert!(matches!(dt, Datetime::Offset(_)));
//! assert_eq!(dt.to_string(), "1979-05-27T07:32:00Z");
//!
//! let date: Datetime = "1979-05-27".parse().unwrap();
//! assert!(matches!(date, Datetime::Date(_)));
//! ```

use crate::error::Error;
use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone,
};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub(crate) const DATETIME_STRUCT: &str = "$__serde_boa_private_Datetime";
pub(crate) const DATETIME_TOKEN: &str = "$__serde_boa_private_datetime";

/// An offset date-time, local date-time, local date or local time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Datetime {
    Offset(DateTime<FixedOffset>),
    Local(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl Datetime {
    /// Parses the TOML notation. Lower-case `t`/`z` and a space between the
    /// date and the time are accepted. The forms are tried from the most to
    /// the least specific; when none matches, the error of the first attempt
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns the `chrono` parse error if `text` is not a datetime.
    pub fn parse(text: &str) -> Result<Datetime, chrono::ParseError> {
        let text = text.trim_end_matches(' ').to_uppercase().replacen(' ', "T", 1);
        let first = match DateTime::parse_from_rfc3339(&text) {
            Ok(dt) => return Ok(Datetime::Offset(dt)),
            Err(e) => e,
        };
        if let Ok(dt) = NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Datetime::Local(dt));
        }
        if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
            return Ok(Datetime::Date(date));
        }
        if let Ok(time) = NaiveTime::parse_from_str(&text, "%H:%M:%S%.f") {
            return Ok(Datetime::Time(time));
        }
        Err(first)
    }

    #[inline]
    #[must_use]
    pub fn as_offset(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Datetime::Offset(dt) => Some(dt),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_local(&self) -> Option<&NaiveDateTime> {
        match self {
            Datetime::Local(dt) => Some(dt),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_date(&self) -> Option<&NaiveDate> {
        match self {
            Datetime::Date(d) => Some(d),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_time(&self) -> Option<&NaiveTime> {
        match self {
            Datetime::Time(t) => Some(t),
            _ => None,
        }
    }
}

impl FromStr for Datetime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Datetime::parse(s).map_err(|e| Error::custom(format!("invalid datetime {:?}: {}", s, e)))
    }
}

impl fmt::Display for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datetime::Offset(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Datetime::Local(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Datetime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Datetime::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
        }
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Datetime {
    fn from(value: DateTime<Tz>) -> Self {
        Datetime::Offset(value.fixed_offset())
    }
}

impl From<NaiveDateTime> for Datetime {
    fn from(value: NaiveDateTime) -> Self {
        Datetime::Local(value)
    }
}

impl From<NaiveDate> for Datetime {
    fn from(value: NaiveDate) -> Self {
        Datetime::Date(value)
    }
}

impl From<NaiveTime> for Datetime {
    fn from(value: NaiveTime) -> Self {
        Datetime::Time(value)
    }
}

impl Serialize for Datetime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct(DATETIME_STRUCT, 1)?;
        s.serialize_field(DATETIME_TOKEN, &self.to_string())?;
        s.end()
    }
}

pub(crate) fn datetime_from_token<E: de::Error>(text: &str) -> Result<Datetime, E> {
    Datetime::parse(text).map_err(|e| E::custom(format!("invalid datetime {:?}: {}", text, e)))
}

struct DatetimeVisitor;

impl<'de> Visitor<'de> for DatetimeVisitor {
    type Value = Datetime;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a TOML datetime")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Datetime, E> {
        datetime_from_token(value)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Datetime, A::Error>
    where
        A: MapAccess<'de>,
    {
        match map.next_key::<String>()? {
            Some(key) if key == DATETIME_TOKEN => datetime_from_token(&map.next_value::<String>()?),
            _ => Err(de::Error::invalid_type(de::Unexpected::Map, &self)),
        }
    }
}

impl<'de> Deserialize<'de> for Datetime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DatetimeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order() {
        assert!(matches!(
            Datetime::parse("1979-05-27T00:32:00.999999-07:00").unwrap(),
            Datetime::Offset(_)
        ));
        assert!(matches!(
            Datetime::parse("1979-05-27t07:32:00").unwrap(),
            Datetime::Local(_)
        ));
        assert!(matches!(Datetime::parse("1979-05-27 ").unwrap(), Datetime::Date(_)));
        assert!(matches!(Datetime::parse("07:32:00.5").unwrap(), Datetime::Time(_)));
        assert!(Datetime::parse("1979-13-27").is_err());
    }

    #[test]
    fn test_display() {
        for text in [
            "1979-05-27T07:32:00-07:00",
            "1979-05-27T07:32:00.999Z",
            "1979-05-27T07:32:00",
            "1979-05-27",
            "07:32:00",
        ] {
            assert_eq!(Datetime::parse(text).unwrap().to_string(), text);
        }
    }
}
