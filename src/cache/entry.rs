use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::context_bundle::SummaryResult;
use crate::types::identifiers::ContentFingerprint;

/// On-disk record format; bump when `CacheEntry` changes shape.
pub const ENTRY_FORMAT_VERSION: u32 = 1;

/// fingerprint → summary. Written once on a miss, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub format_version: u32,
    pub fingerprint: ContentFingerprint,
    pub created_at: DateTime<Utc>, // informational only
    pub result: SummaryResult,
}

impl CacheEntry {
    pub fn new(fingerprint: ContentFingerprint, result: SummaryResult) -> Self {
        Self {
            format_version: ENTRY_FORMAT_VERSION,
            fingerprint,
            created_at: Utc::now(),
            result,
        }
    }
}
