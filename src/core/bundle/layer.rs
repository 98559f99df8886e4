use super::FetchError;
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Check a blob against its `sha256:<hex>` descriptor digest.
///
/// Digests using other algorithms are accepted unverified.
pub fn verify_digest(expected: &str, blob: &[u8]) -> Result<(), FetchError> {
    let Some(hex_digest) = expected.strip_prefix("sha256:") else {
        tracing::debug!(digest = expected, "skipping verification of non-sha256 digest");
        return Ok(());
    };
    let actual = hex::encode(Sha256::digest(blob));
    if !actual.eq_ignore_ascii_case(hex_digest) {
        return Err(FetchError::DigestMismatch {
            expected: expected.to_string(),
            actual: format!("sha256:{}", actual),
        });
    }
    Ok(())
}

/// Return the contents of the first entry of a (possibly gzip compressed) tar layer.
pub fn read_tar_layer(digest: &str, blob: &[u8]) -> Result<Vec<u8>, FetchError> {
    let layer_error = |reason: String| FetchError::Layer {
        digest: digest.to_string(),
        reason,
    };

    let reader: Box<dyn Read + '_> = if blob.starts_with(&GZIP_MAGIC) {
        Box::new(GzDecoder::new(blob))
    } else {
        Box::new(blob)
    };
    let mut archive = tar::Archive::new(reader);
    let mut entries = archive
        .entries()
        .map_err(|err| layer_error(format!("layer is not a tarball: {}", err)))?;
    let mut entry = match entries.next() {
        Some(Ok(entry)) => entry,
        Some(Err(err)) => return Err(layer_error(format!("layer is not a tarball: {}", err))),
        None => return Err(layer_error("layer is not a tarball".to_string())),
    };

    let mut contents = Vec::new();
    entry
        .read_to_end(&mut contents)
        .map_err(|err| layer_error(format!("failed to read layer contents: {}", err)))?;
    Ok(contents)
}
