//! Fetching a fresh GPS QuickFix assistance blob over HTTP.
//!
//! The watch can locate satellites far faster with a recent ephemeris
//! prediction than with a cold almanac alone; the reference client fetches
//! this from TomTom's public assistance service before every sync.

use crate::error::SyncError;

/// The assistance data endpoint used by the reference client.
pub const QUICKFIX_URL: &str = "http://gpsquickfix.services.tomtom.com/fitness/sifgps.f2p3enc.ee";

/// Download the current assistance blob.
pub async fn fetch_assistance_data() -> Result<Vec<u8>, SyncError> {
    let response = reqwest::get(QUICKFIX_URL)
        .await
        .map_err(|e| SyncError::Http(e.to_string()))?
        .error_for_status()
        .map_err(|e| SyncError::Http(e.to_string()))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| SyncError::Http(e.to_string()))?;
    Ok(bytes.to_vec())
}
