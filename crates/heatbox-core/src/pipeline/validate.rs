//! Cheap checks on a frame file before it is decoded.

use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Leading byte signatures of the frame formats the decoder accepts.
const SIGNATURES: &[(&str, &[u8])] = &[
    ("jpeg", &[0xFF, 0xD8, 0xFF]),
    ("png", &[0x89, b'P', b'N', b'G']),
    ("gif", b"GIF8"),
    ("bmp", b"BM"),
    ("tiff", &[b'I', b'I', 0x2A, 0x00]),
    ("tiff", &[b'M', b'M', 0x00, 0x2A]),
];

/// Rejects frames that are missing, oversized, or not an image at all.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check existence, size limit, and magic bytes.
    pub fn validate(&self, path: &Path) -> Result<(), PipelineError> {
        if !path.is_file() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        let size = std::fs::metadata(path)
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot read metadata: {}", e),
            })?
            .len();

        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if size > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: size / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let mut header = [0u8; 12];
        let read = std::fs::File::open(path)
            .and_then(|mut file| file.read(&mut header))
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot read header: {}", e),
            })?;

        if detect_format(&header[..read]).is_none() {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }
        Ok(())
    }
}

/// Name the image format whose signature `header` starts with.
fn detect_format(header: &[u8]) -> Option<&'static str> {
    if let Some((name, _)) = SIGNATURES.iter().find(|(_, sig)| header.starts_with(sig)) {
        return Some(*name);
    }
    // RIFF....WEBP
    if header.len() >= 12 && header.starts_with(b"RIFF") && &header[8..12] == b"WEBP" {
        return Some("webp");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_jpeg_and_png() {
        assert_eq!(detect_format(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("jpeg"));
        assert_eq!(
            detect_format(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            Some("png")
        );
    }

    #[test]
    fn test_detect_webp_needs_full_header() {
        assert_eq!(detect_format(b"RIFF\0\0\0\0WEBP"), Some("webp"));
        assert_eq!(detect_format(b"RIFF\0\0\0\0WAVE"), None);
        assert_eq!(detect_format(b"RIFF"), None);
    }

    #[test]
    fn test_bare_tiff_prefix_rejected() {
        assert_eq!(detect_format(&[b'I', b'I', 0x2A, 0x00]), Some("tiff"));
        assert_eq!(detect_format(&[b'I', b'I', 0x00, 0x00]), None);
    }

    #[test]
    fn test_short_header_rejected() {
        assert_eq!(detect_format(&[0xFF, 0xD8]), None);
        assert_eq!(detect_format(&[]), None);
    }

    #[test]
    fn test_validate_missing_file() {
        let validator = Validator::new(LimitsConfig::default());
        let err = validator
            .validate(Path::new("/nonexistent/seg/0.jpg"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn test_validate_rejects_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.jpg");
        std::fs::write(&path, b"not an image at all").unwrap();

        let validator = Validator::new(LimitsConfig::default());
        let err = validator.validate(&path).unwrap_err();
        assert!(err.to_string().contains("magic bytes"));
    }

    #[test]
    fn test_validate_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.jpg");
        let mut bytes = vec![0xFF, 0xD8, 0xFF];
        bytes.resize(2 * 1024 * 1024, 0);
        std::fs::write(&path, bytes).unwrap();

        let validator = Validator::new(LimitsConfig {
            max_file_size_mb: 1,
            ..LimitsConfig::default()
        });
        assert!(matches!(
            validator.validate(&path),
            Err(PipelineError::FileTooLarge { max_mb: 1, .. })
        ));
    }
}
