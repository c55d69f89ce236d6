//! JSON starter bundle: a snapshot without binary framing or uploads.

use super::records::{RecordSet, SourceRecord};
use crate::core::{CloneError, FieldMap, Result};
use crate::schema::catalog::{SITE_UPLOADS, SITES};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const BUNDLE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub starter_id: String,
    pub exported_at: String,
}

impl BundleMetadata {
    pub fn now(starter_id: impl Into<String>) -> Self {
        Self {
            starter_id: starter_id.into(),
            exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawBundle {
    version: u32,
    metadata: BundleMetadata,
    site: FieldMap,
    records: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StarterBundle {
    pub version: u32,
    pub metadata: BundleMetadata,
    pub site: SourceRecord,
    /// Every collection below the root; never carries uploads.
    pub records: RecordSet,
}

impl StarterBundle {
    pub fn new(metadata: BundleMetadata, site: SourceRecord, mut records: RecordSet) -> Self {
        strip_uploads(&mut records);
        Self {
            version: BUNDLE_VERSION,
            metadata,
            site,
            records,
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: RawBundle = serde_json::from_slice(bytes)?;
        if raw.version != BUNDLE_VERSION {
            return Err(CloneError::UnsupportedBundleVersion(raw.version));
        }
        let site = SourceRecord::from_flat(SITES, raw.site)?;
        let mut records = RecordSet::from_json(raw.records)?;
        strip_uploads(&mut records);
        Ok(Self {
            version: raw.version,
            metadata: raw.metadata,
            site,
            records,
        })
    }

    pub fn to_vec_pretty(&self) -> Result<Vec<u8>> {
        let raw = RawBundle {
            version: self.version,
            metadata: self.metadata.clone(),
            site: self.site.to_flat(),
            records: self.records.to_json(),
        };
        Ok(serde_json::to_vec_pretty(&raw)?)
    }
}

fn strip_uploads(records: &mut RecordSet) {
    if records.contains(SITE_UPLOADS) {
        records.set(SITE_UPLOADS, Vec::new());
    }
}
