//! Public listing export and identifier resolution

use crate::codec::IdCodec;
use crate::model::{PersistedRecord, PublicRecord};
use crate::output::{OutputError, OutputResult};
use crate::sources::SourceRegistry;
use crate::storage::Storage;
use std::io::Write;

/// Writes records as JSON lines, one [`PublicRecord`] per line
///
/// Returns the number of lines written.
pub fn write_listings<W: Write>(
    mut out: W,
    records: &[PersistedRecord],
    codec: &IdCodec,
) -> OutputResult<usize> {
    for record in records {
        let public = PublicRecord::from_record(record, codec)?;
        let line = serde_json::to_string(&public).map_err(|e| OutputError::Format(e.to_string()))?;
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(records.len())
}

/// Exports every stored listing, or one platform's, newest posting first
pub fn export_listings<W: Write>(
    storage: &dyn Storage,
    platform: Option<&str>,
    codec: &IdCodec,
    out: W,
) -> OutputResult<usize> {
    let records = match platform {
        Some(platform) => storage.query_by_platform(platform)?,
        None => storage.query_all()?,
    };
    write_listings(out, &records, codec)
}

/// Turns a public identifier back into the listing's canonical URL
///
/// # Returns
///
/// * `Ok(String)` - The rebuilt marketplace URL
/// * `Err(OutputError::Codec)` - The identifier was not issued under the current key
/// * `Err(OutputError::UnknownSource)` - No enabled source has that platform name
pub fn resolve_listing_url(
    codec: &IdCodec,
    registry: &SourceRegistry,
    platform: &str,
    public_id: &str,
) -> OutputResult<String> {
    let source_id = codec.decode(public_id)?;
    registry
        .canonical_url(platform, &source_id)
        .ok_or_else(|| OutputError::UnknownSource(platform.to_string()))
}
