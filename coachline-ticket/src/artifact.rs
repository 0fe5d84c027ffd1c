use coachline_core::models::ArtifactKind;
use sha2::{Digest, Sha256};

pub use coachline_core::artifact::{validate, MIN_PDF_BYTES, PDF_MAGIC, ZIP_MAGIC};

/// SHA-256 of the artifact bytes, lowercase hex, reported alongside the
/// payload for integrity checking.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Deterministic download filename for an artifact.
pub fn artifact_filename(kind: ArtifactKind, pnr: &str) -> String {
    format!("{}-{}.{}", kind.as_str(), pnr, kind.file_extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_stable_hex() {
        let hash = content_hash(b"ticket");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, content_hash(b"ticket"));
        assert_ne!(hash, content_hash(b"other"));
    }

    #[test]
    fn test_filename_pattern() {
        assert_eq!(artifact_filename(ArtifactKind::Hold, "AB12CD"), "hold-AB12CD.pdf");
        assert_eq!(artifact_filename(ArtifactKind::Final, "AB12CD"), "final-AB12CD.pdf");
        assert_eq!(
            artifact_filename(ArtifactKind::FinalZip, "AB12CD"),
            "final_zip-AB12CD.zip"
        );
    }
}
