use crate::models::ArtifactKind;
use crate::{CoreError, CoreResult};

pub const PDF_MAGIC: &[u8] = b"%PDF-";
pub const ZIP_MAGIC: &[u8] = &[0x50, 0x4b, 0x03, 0x04];

/// Anything shorter than this cannot be a renderable ticket page.
pub const MIN_PDF_BYTES: usize = 512;

/// Structural validity gate applied before artifact bytes are persisted or
/// served. PDF kinds must carry the format signature and a minimum length;
/// bundles must carry the zip signature. Empty payloads never pass.
pub fn validate(kind: ArtifactKind, bytes: &[u8]) -> CoreResult<()> {
    if bytes.is_empty() {
        return Err(CoreError::CacheIntegrity(format!(
            "{} artifact is empty",
            kind.as_str()
        )));
    }
    match kind {
        ArtifactKind::Hold | ArtifactKind::Final => {
            if !bytes.starts_with(PDF_MAGIC) {
                return Err(CoreError::CacheIntegrity(format!(
                    "{} artifact missing PDF signature",
                    kind.as_str()
                )));
            }
            if bytes.len() < MIN_PDF_BYTES {
                return Err(CoreError::CacheIntegrity(format!(
                    "{} artifact too small: {} bytes",
                    kind.as_str(),
                    bytes.len()
                )));
            }
        }
        ArtifactKind::FinalZip => {
            if !bytes.starts_with(ZIP_MAGIC) {
                return Err(CoreError::CacheIntegrity(
                    "final_zip artifact missing zip signature".to_string(),
                ));
            }
        }
    }
    Ok(())
}
