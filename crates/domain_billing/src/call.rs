//! Call records
//!
//! A `Call` is an immutable fact: once constructed through [`Call::new`] it
//! has passed validation and exposes read accessors only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BillingPeriod, CallId};
use crate::error::BillingError;

/// Direction of a call relative to the line that logs it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Incoming,
    Outgoing,
}

/// A longitude/latitude pair where one end of the call was placed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }
}

/// Raw call attributes, validated by [`Call::new`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDetails {
    pub source_number: String,
    pub destination_number: String,
    pub timestamp: DateTime<Utc>,
    /// Signed so malformed feeds can be rejected rather than wrapped
    pub duration_seconds: i64,
    pub source_location: GeoPoint,
    pub destination_location: GeoPoint,
    pub direction: CallDirection,
}

/// One phone call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    id: CallId,
    source_number: String,
    destination_number: String,
    timestamp: DateTime<Utc>,
    duration_seconds: u32,
    source_location: GeoPoint,
    destination_location: GeoPoint,
    direction: CallDirection,
}

impl Call {
    /// Validates the details and builds the call
    ///
    /// # Errors
    ///
    /// Returns `InvalidCall` for empty numbers, a negative or oversized
    /// duration, or coordinates outside the valid ranges.
    pub fn new(details: CallDetails) -> Result<Self, BillingError> {
        let source_number = details.source_number.trim().to_string();
        let destination_number = details.destination_number.trim().to_string();

        if source_number.is_empty() {
            return Err(BillingError::invalid_call("source number is empty"));
        }
        if destination_number.is_empty() {
            return Err(BillingError::invalid_call("destination number is empty"));
        }
        let duration_seconds = u32::try_from(details.duration_seconds).map_err(|_| {
            BillingError::invalid_call(format!(
                "duration {}s is out of range",
                details.duration_seconds
            ))
        })?;
        if !details.source_location.is_valid() || !details.destination_location.is_valid() {
            return Err(BillingError::invalid_call("location outside valid coordinates"));
        }

        Ok(Self {
            id: CallId::new_v7(),
            source_number,
            destination_number,
            timestamp: details.timestamp,
            duration_seconds,
            source_location: details.source_location,
            destination_location: details.destination_location,
            direction: details.direction,
        })
    }

    /// Returns the same call as seen by the destination line
    pub fn as_incoming(&self) -> Self {
        Self {
            direction: CallDirection::Incoming,
            ..self.clone()
        }
    }

    pub fn id(&self) -> CallId {
        self.id
    }

    pub fn source_number(&self) -> &str {
        &self.source_number
    }

    pub fn destination_number(&self) -> &str {
        &self.destination_number
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub fn source_location(&self) -> GeoPoint {
        self.source_location
    }

    pub fn destination_location(&self) -> GeoPoint {
        self.destination_location
    }

    pub fn direction(&self) -> CallDirection {
        self.direction
    }

    pub fn is_outgoing(&self) -> bool {
        self.direction == CallDirection::Outgoing
    }

    /// Whole minutes charged for this call, rounding any started minute up
    pub fn rated_minutes(&self) -> u32 {
        self.duration_seconds.div_ceil(60)
    }

    /// The billing period the call falls in
    pub fn period(&self) -> BillingPeriod {
        BillingPeriod::of(self.timestamp)
    }
}
