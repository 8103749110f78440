// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lenient field readers for stored user documents.
//!
//! Documents written by the older Node service hold ObjectId `_id`s, BSON
//! dates and doubles for every number. Documents written here hold hex
//! strings, RFC 3339 strings and integers. Both load through these readers,
//! from BSON and from JSON alike. Serialization is unchanged.

use chrono::{DateTime, Utc};
use mongodb::bson::Bson;
use serde::de::Error;
use serde::{Deserialize, Deserializer};

fn id_from<E: Error>(value: Bson) -> Result<String, E> {
    match value {
        Bson::ObjectId(oid) => Ok(oid.to_hex()),
        Bson::String(s) => Ok(s),
        other => Err(E::custom(format!("expected an id, got {:?}", other.element_type()))),
    }
}

fn date_from<E: Error>(value: Bson) -> Result<DateTime<Utc>, E> {
    match value {
        Bson::DateTime(dt) => DateTime::from_timestamp_millis(dt.timestamp_millis())
            .ok_or_else(|| E::custom("BSON date out of range")),
        Bson::String(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| E::custom(format!("invalid date {s:?}: {e}"))),
        other => Err(E::custom(format!("expected a date, got {:?}", other.element_type()))),
    }
}

fn whole_from<T, E>(value: Bson) -> Result<T, E>
where
    T: TryFrom<i64>,
    E: Error,
{
    let n = match value {
        Bson::Int32(n) => i64::from(n),
        Bson::Int64(n) => n,
        Bson::Double(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => f as i64,
        other => {
            return Err(E::custom(format!(
                "expected a whole number, got {other}"
            )))
        }
    };
    T::try_from(n).map_err(|_| E::custom(format!("{n} is out of range")))
}

/// An id stored as an ObjectId or as its hex string.
pub(crate) fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    id_from(Bson::deserialize(deserializer)?)
}

/// A timestamp stored as a BSON date or an RFC 3339 string.
pub(crate) fn date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    date_from(Bson::deserialize(deserializer)?)
}

pub(crate) fn opt_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    match Bson::deserialize(deserializer)? {
        Bson::Null | Bson::Undefined => Ok(None),
        value => date_from(value).map(Some),
    }
}

/// An integer that may have been stored as a double (`3.0`).
pub(crate) fn whole<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: TryFrom<i64>,
    D: Deserializer<'de>,
{
    whole_from(Bson::deserialize(deserializer)?)
}

pub(crate) fn opt_whole<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: TryFrom<i64>,
    D: Deserializer<'de>,
{
    match Bson::deserialize(deserializer)? {
        Bson::Null | Bson::Undefined => Ok(None),
        value => whole_from(value).map(Some),
    }
}
