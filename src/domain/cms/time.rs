//! `signingTime` value encoding (RFC 5652 §11.3).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use der::asn1::{GeneralizedTime, UtcTime};
use der::{DateTime, Encode};

use crate::infra::error::{SigningError, SigningResult};

/// Encode `instant` truncated to whole seconds: UTCTime for years
/// 1950–2049, GeneralizedTime otherwise.
pub fn encode_signing_time(instant: SystemTime) -> SigningResult<Vec<u8>> {
    let since_epoch = instant.duration_since(UNIX_EPOCH).map_err(|e| {
        SigningError::signing_failure("signing time precedes the Unix epoch", e)
    })?;
    let whole_seconds = Duration::from_secs(since_epoch.as_secs());
    let date_time = DateTime::from_unix_duration(whole_seconds)?;

    if (1950..2050).contains(&date_time.year()) {
        Ok(UtcTime::from_date_time(date_time)?.to_der()?)
    } else {
        Ok(GeneralizedTime::from_date_time(date_time).to_der()?)
    }
}
