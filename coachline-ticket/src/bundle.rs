use std::io::{Cursor, Write};

use coachline_core::{CoreError, CoreResult};
use zip::write::SimpleFileOptions;

/// Bundle named artifact parts into a single zip archive, stored under the
/// `final_zip` kind.
pub fn bundle_parts(parts: &[(String, Vec<u8>)]) -> CoreResult<Vec<u8>> {
    if parts.is_empty() {
        return Err(CoreError::Render("nothing to bundle".to_string()));
    }

    let mut buf = Vec::new();
    {
        let mut archive = zip::ZipWriter::new(Cursor::new(&mut buf));
        for (name, bytes) in parts {
            archive
                .start_file(name.as_str(), SimpleFileOptions::default())
                .map_err(|e| CoreError::Render(format!("zip entry {}: {}", name, e)))?;
            archive
                .write_all(bytes)
                .map_err(|e| CoreError::Render(format!("zip entry {}: {}", name, e)))?;
        }
        archive
            .finish()
            .map_err(|e| CoreError::Render(format!("zip finish: {}", e)))?;
    }
    Ok(buf)
}
