//! Binary snapshot container.
//!
//! ```text
//! +-------------+---------------------------------+----------+---------+----------+-----------+
//! | PALACMS:3.0 | 4 x u32 LE: meta, records,      | metadata | records | filemeta | file data |
//! | (11 bytes)  |   filemeta, file data lengths   |  (JSON)  | (JSON)  |  (JSON)  |  (raw)    |
//! +-------------+---------------------------------+----------+---------+----------+-----------+
//! ```
//!
//! Upload records carry the index of their file in the filemeta table. On
//! decode the index is swapped for the file name and the blob is attached to
//! the record; encode reverses that.

use super::records::RecordSet;
use crate::core::{CloneError, FileBlob, Result};
use crate::schema::catalog::SITE_UPLOADS;
use byteorder::{ByteOrder, LittleEndian};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SIGNATURE: &[u8; 11] = b"PALACMS:3.0";
pub const HEADER_LEN: usize = 16;

const FILE_COLLECTIONS: [&str; 1] = [SITE_UPLOADS];
const FILE_FIELD: &str = "file";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: String,
    pub source_instance_id: String,
    pub source_instance_version: String,
}

impl SnapshotMetadata {
    /// Metadata stamped with the current time.
    pub fn now(source_instance_id: impl Into<String>, source_instance_version: impl Into<String>) -> Self {
        Self {
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            source_instance_id: source_instance_id.into(),
            source_instance_version: source_instance_version.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct FileEntry {
    name: String,
    size: usize,
}

/// A decoded snapshot: metadata, records and the file table.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub metadata: SnapshotMetadata,
    pub records: RecordSet,
    /// Distinct upload blobs in first-use order.
    pub files: Vec<FileBlob>,
}

impl Snapshot {
    /// Builds a snapshot whose file table is taken from the blobs attached
    /// to its upload records.
    pub fn new(metadata: SnapshotMetadata, records: RecordSet) -> Self {
        let mut files = Vec::new();
        for collection in FILE_COLLECTIONS {
            for file in records.get(collection).iter().filter_map(|r| r.file.as_ref()) {
                if !files.contains(file) {
                    files.push(file.clone());
                }
            }
        }
        Self {
            metadata,
            records,
            files,
        }
    }

    pub fn file_bytes(&self) -> usize {
        self.files.iter().map(FileBlob::size).sum()
    }
}

fn take<'a>(
    bytes: &'a [u8],
    head: &mut usize,
    len: usize,
    section: &'static str,
) -> Result<&'a [u8]> {
    let available = bytes.len().saturating_sub(*head);
    if len > available {
        return Err(CloneError::TruncatedSection {
            section,
            declared: len,
            available,
        });
    }
    let slice = &bytes[*head..*head + len];
    *head += len;
    Ok(slice)
}

fn parse_section<T: serde::de::DeserializeOwned>(bytes: &[u8], section: &'static str) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|err| CloneError::InvalidSectionJson {
        section,
        message: err.to_string(),
    })
}

fn section_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| CloneError::PayloadTooLarge {
        size: len,
        limit: u32::MAX as usize,
    })
}

pub fn decode(bytes: &[u8]) -> Result<Snapshot> {
    if bytes.len() < SIGNATURE.len() || &bytes[..SIGNATURE.len()] != SIGNATURE {
        return Err(CloneError::BadSignature);
    }
    let mut head = SIGNATURE.len();

    let header = take(bytes, &mut head, HEADER_LEN, "header")?;
    let metadata_len = LittleEndian::read_u32(&header[0..4]) as usize;
    let records_len = LittleEndian::read_u32(&header[4..8]) as usize;
    let filemeta_len = LittleEndian::read_u32(&header[8..12]) as usize;
    let filedata_len = LittleEndian::read_u32(&header[12..16]) as usize;

    let metadata: SnapshotMetadata =
        parse_section(take(bytes, &mut head, metadata_len, "metadata")?, "metadata")?;
    let records: Value = parse_section(take(bytes, &mut head, records_len, "records")?, "records")?;
    let mut records = RecordSet::from_json(records).map_err(|err| CloneError::InvalidSectionJson {
        section: "records",
        message: err.to_string(),
    })?;
    let entries: Vec<FileEntry> =
        parse_section(take(bytes, &mut head, filemeta_len, "filemeta")?, "filemeta")?;

    let available = bytes.len() - head;
    if filedata_len > available {
        return Err(CloneError::TruncatedSection {
            section: "file data",
            declared: filedata_len,
            available,
        });
    }

    let mut files = Vec::with_capacity(entries.len());
    for entry in entries {
        let data = take(bytes, &mut head, entry.size, "file data")?;
        files.push(FileBlob::new(entry.name, data.to_vec()));
    }

    attach_files(&mut records, &files);

    Ok(Snapshot {
        metadata,
        records,
        files,
    })
}

fn attach_files(records: &mut RecordSet, files: &[FileBlob]) {
    for collection in FILE_COLLECTIONS {
        if !records.contains(collection) {
            continue;
        }
        for record in records.get_mut(collection) {
            let index = record.fields.get(FILE_FIELD).and_then(Value::as_u64);
            let Some(file) = index.and_then(|i| files.get(i as usize)) else {
                continue;
            };
            record
                .fields
                .insert(FILE_FIELD.to_string(), Value::String(file.name.clone()));
            record.file = Some(file.clone());
        }
    }
}

pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let mut files = snapshot.files.clone();
    let mut records = snapshot.records.clone();

    for collection in FILE_COLLECTIONS {
        if !records.contains(collection) {
            continue;
        }
        for record in records.get_mut(collection) {
            let Some(file) = record.file.take() else {
                continue;
            };
            let index = match files.iter().position(|f| *f == file) {
                Some(index) => index,
                None => {
                    files.push(file);
                    files.len() - 1
                }
            };
            record
                .fields
                .insert(FILE_FIELD.to_string(), Value::from(index));
        }
    }

    let metadata = serde_json::to_vec(&snapshot.metadata)?;
    let records = serde_json::to_vec(&records.to_json())?;
    let entries: Vec<FileEntry> = files
        .iter()
        .map(|f| FileEntry {
            name: f.name.clone(),
            size: f.size(),
        })
        .collect();
    let filemeta = serde_json::to_vec(&entries)?;
    let filedata_len: usize = files.iter().map(FileBlob::size).sum();

    let mut header = [0u8; HEADER_LEN];
    LittleEndian::write_u32(&mut header[0..4], section_len(metadata.len())?);
    LittleEndian::write_u32(&mut header[4..8], section_len(records.len())?);
    LittleEndian::write_u32(&mut header[8..12], section_len(filemeta.len())?);
    LittleEndian::write_u32(&mut header[12..16], section_len(filedata_len)?);

    let mut out = Vec::with_capacity(
        SIGNATURE.len() + HEADER_LEN + metadata.len() + records.len() + filemeta.len() + filedata_len,
    );
    out.extend_from_slice(SIGNATURE);
    out.extend_from_slice(&header);
    out.extend_from_slice(&metadata);
    out.extend_from_slice(&records);
    out.extend_from_slice(&filemeta);
    for file in &files {
        out.extend_from_slice(&file.data);
    }
    Ok(out)
}
