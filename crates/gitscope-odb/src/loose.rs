//! Loose object reading and enumeration.
//!
//! Each loose object lives at `objects/XX/YYYY...` where `XX` is the first
//! id byte in hex. The file is a single zlib stream over
//! `"<type> <size>\0<content>"`.

use std::fs;
use std::path::Path;

use gitscope_hash::ObjectId;
use gitscope_object::{header, ObjectError, ObjectType};
use gitscope_pack::inflate::{inflate_all, inflate_window};

use crate::OdbError;

/// Bytes of decompressed prefix needed to classify an object by type word.
const PROBE_WINDOW: usize = 8;

/// Read and decode a loose object's raw payload.
pub(crate) fn read_raw(
    objects_dir: &Path,
    id: &ObjectId,
) -> Result<(ObjectType, Vec<u8>), OdbError> {
    let path = objects_dir.join(id.loose_path());
    let compressed = match fs::read(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(OdbError::NotFound(*id))
        }
        Err(e) => return Err(OdbError::Io(e)),
    };

    let decompressed = inflate_all(&compressed).map_err(|e| OdbError::CorruptLoose {
        id: *id,
        reason: format!("decompression failed: {e}"),
    })?;

    let (obj_type, size, header_len) = header::parse_header(&decompressed)?;
    let payload = &decompressed[header_len..];
    if payload.len() < size {
        return Err(OdbError::Object(ObjectError::Truncated {
            expected: size,
            actual: payload.len(),
        }));
    }
    Ok((obj_type, payload[..size].to_vec()))
}

/// Classify a loose object by decompressing only a small leading window.
pub(crate) fn probe(objects_dir: &Path, id: &ObjectId) -> Result<ObjectType, OdbError> {
    let path = objects_dir.join(id.loose_path());
    let compressed = match fs::read(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(OdbError::NotFound(*id))
        }
        Err(e) => return Err(OdbError::Io(e)),
    };

    let head = inflate_window(&compressed, PROBE_WINDOW).map_err(|e| OdbError::CorruptLoose {
        id: *id,
        reason: format!("decompression failed: {e}"),
    })?;

    for ty in [
        ObjectType::Commit,
        ObjectType::Tree,
        ObjectType::Blob,
        ObjectType::Tag,
    ] {
        if head.starts_with(ty.as_bytes()) {
            return Ok(ty);
        }
    }
    Err(OdbError::CorruptLoose {
        id: *id,
        reason: "unrecognized type word".into(),
    })
}

/// Scan the shard directories for loose object ids.
///
/// Non-hex file names (temporary files and the like) are skipped.
pub(crate) fn scan(objects_dir: &Path) -> Result<Vec<ObjectId>, OdbError> {
    let mut ids = Vec::new();
    if !objects_dir.is_dir() {
        return Ok(ids);
    }

    let mut shards: Vec<_> = fs::read_dir(objects_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.len() == 2
                && name.chars().all(|c| c.is_ascii_hexdigit())
                && e.path().is_dir()
        })
        .map(|e| e.path())
        .collect();
    shards.sort();

    for shard in shards {
        let prefix = shard
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let mut files: Vec<_> = fs::read_dir(&shard)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();

        for name in files {
            let hex = format!("{prefix}{name}");
            if let Ok(id) = ObjectId::from_hex(&hex) {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}
