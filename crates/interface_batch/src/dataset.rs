//! Input dataset
//!
//! The carrier exports customers and their lines together with the raw event
//! log. Events are either calls or text messages; messages are not billed.
//!
//! ```json
//! {
//!   "customers": [
//!     {"id": 5555, "lines": [{"number": "867-5309", "contract": "term"}]}
//!   ],
//!   "events": [
//!     {"type": "call", "src_number": "867-5309", "dst_number": "273-8255",
//!      "time": "2018-01-01 01:01:04", "duration": 10,
//!      "src_loc": [-79.428, 43.641], "dst_loc": [-79.527, 43.750]}
//!   ]
//! }
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use domain_billing::{Call, CallDetails, CallDirection, ContractKind, GeoPoint};

use crate::error::BatchError;

/// Customer identifier as exported, either numeric or textual
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomerReference {
    Number(u64),
    Text(String),
}

impl fmt::Display for CustomerReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomerReference::Number(n) => write!(f, "{n}"),
            CustomerReference::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub number: String,
    /// `term`, `mtm` or `prepaid`
    pub contract: String,
    /// Opening credit for prepaid lines; the configured default otherwise
    #[serde(default)]
    pub balance: Option<Decimal>,
}

impl LineRecord {
    pub fn contract_kind(&self) -> Result<ContractKind, BatchError> {
        self.contract
            .parse()
            .map_err(|_| BatchError::invalid_record(format!(
                "line {} has unknown contract type '{}'",
                self.number, self.contract
            )))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: CustomerReference,
    #[serde(default)]
    pub lines: Vec<LineRecord>,
}

/// Event timestamps are local wall-clock times without an offset; they are
/// read as UTC.
mod event_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub src_number: String,
    pub dst_number: String,
    #[serde(with = "event_time")]
    pub time: NaiveDateTime,
    /// Seconds
    pub duration: i64,
    /// `[longitude, latitude]`
    pub src_loc: [f64; 2],
    pub dst_loc: [f64; 2],
}

impl CallRecord {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.time.and_utc()
    }

    /// The call as placed by the source line
    pub fn to_call(&self) -> Result<Call, BatchError> {
        let call = Call::new(CallDetails {
            source_number: self.src_number.clone(),
            destination_number: self.dst_number.clone(),
            timestamp: self.timestamp(),
            duration_seconds: self.duration,
            source_location: GeoPoint::new(self.src_loc[0], self.src_loc[1]),
            destination_location: GeoPoint::new(self.dst_loc[0], self.dst_loc[1]),
            direction: CallDirection::Outgoing,
        })?;
        Ok(call)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsRecord {
    pub src_number: String,
    pub dst_number: String,
    #[serde(with = "event_time")]
    pub time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventRecord {
    Call(CallRecord),
    Sms(SmsRecord),
}

impl EventRecord {
    pub fn time(&self) -> NaiveDateTime {
        match self {
            EventRecord::Call(c) => c.time,
            EventRecord::Sms(s) => s.time,
        }
    }
}

/// A full export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub customers: Vec<CustomerRecord>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
}

impl Dataset {
    pub fn from_json(json: &str) -> Result<Self, BatchError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, BatchError> {
        let json = std::fs::read_to_string(path).map_err(|source| BatchError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Events in chronological order; ties keep their export order
    pub fn events_in_order(&self) -> Vec<&EventRecord> {
        let mut events: Vec<&EventRecord> = self.events.iter().collect();
        events.sort_by_key(|e| e.time());
        events
    }
}
