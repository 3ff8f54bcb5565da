//! BLAKE3 sealing of audit records.
//!
//! The digest covers the record's JSON with `content_hash` cleared, streamed
//! straight into the hasher.

use crate::AuditRecord;

/// Digest of everything in the record except its stored hash.
pub fn content_digest(record: &AuditRecord) -> Result<blake3::Hash, serde_json::Error> {
    let mut unsealed = record.clone();
    unsealed.content_hash = None;

    let mut hasher = blake3::Hasher::new();
    serde_json::to_writer(&mut hasher, &unsealed)?;
    Ok(hasher.finalize())
}

/// Compute and store the digest.
pub fn seal(record: &mut AuditRecord) -> Result<(), serde_json::Error> {
    let digest = content_digest(record)?;
    record.content_hash = Some(digest.to_hex().to_string());
    Ok(())
}
