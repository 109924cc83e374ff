use std::path::Path;

/// MIME types the intake accepts.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/tiff"];

const OCTET_STREAM: &str = "application/octet-stream";

/// Detect MIME type from file magic bytes (not extension or Content-Type header).
pub fn detect_mime_from_bytes(bytes: &[u8]) -> &'static str {
    if bytes.len() < 4 {
        return OCTET_STREAM;
    }

    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        // TIFF: little-endian (49 49 2A 00) or big-endian (4D 4D 00 2A)
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => "image/tiff",
        [b'%', b'P', b'D', b'F', ..] => "application/pdf",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        _ if bytes.len() >= 12 && bytes[..4] == *b"RIFF" && bytes[8..12] == *b"WEBP" => {
            "image/webp"
        }
        _ => OCTET_STREAM,
    }
}

/// Resolve the effective MIME type of a candidate file.
///
/// Magic bytes win. When they match nothing known, fall back to the declared
/// type, then to a guess from the file extension.
pub fn resolve_mime(bytes: &[u8], declared: Option<&str>, file_name: &str) -> String {
    let sniffed = detect_mime_from_bytes(bytes);
    if sniffed != OCTET_STREAM {
        return sniffed.to_string();
    }

    if let Some(declared) = declared.map(normalize_mime).filter(|m| !m.is_empty()) {
        if declared != OCTET_STREAM {
            return declared;
        }
    }

    mime_guess::from_path(file_name)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Whether a MIME type is on the intake allow-list.
pub fn is_accepted_mime(mime: &str) -> bool {
    ACCEPTED_MIME_TYPES.contains(&normalize_mime(mime).as_str())
}

/// Lowercase and strip parameters (`image/PNG; q=1` -> `image/png`).
fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Sanitize a filename: strip path components, control characters, limit length
pub fn sanitize_filename(original: &str) -> String {
    // Browsers on Windows may send full paths with backslashes.
    let last = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let name = Path::new(last)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let clean: String = name.chars().filter(|c| !c.is_control()).take(255).collect();
    let clean = clean.trim();

    if clean.is_empty() || clean == "." || clean == ".." {
        "image".to_string()
    } else {
        clean.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_jpeg() {
        assert_eq!(detect_mime_from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), "image/jpeg");
    }

    #[test]
    fn detect_png() {
        assert_eq!(
            detect_mime_from_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            "image/png"
        );
    }

    #[test]
    fn detect_tiff_both_byte_orders() {
        assert_eq!(detect_mime_from_bytes(&[0x49, 0x49, 0x2A, 0x00, 0x08]), "image/tiff");
        assert_eq!(detect_mime_from_bytes(&[0x4D, 0x4D, 0x00, 0x2A, 0x00]), "image/tiff");
    }

    #[test]
    fn detect_rejected_formats() {
        assert_eq!(detect_mime_from_bytes(b"%PDF-1.4 body"), "application/pdf");
        assert_eq!(detect_mime_from_bytes(b"GIF89a......"), "image/gif");
        let mut webp = vec![0u8; 12];
        webp[..4].copy_from_slice(b"RIFF");
        webp[8..12].copy_from_slice(b"WEBP");
        assert_eq!(detect_mime_from_bytes(&webp), "image/webp");
    }

    #[test]
    fn detect_too_short_or_unknown() {
        assert_eq!(detect_mime_from_bytes(&[0xFF]), "application/octet-stream");
        assert_eq!(detect_mime_from_bytes(&[]), "application/octet-stream");
        assert_eq!(detect_mime_from_bytes(&[0, 1, 2, 3]), "application/octet-stream");
    }

    #[test]
    fn magic_bytes_override_declared_type() {
        // JPEG bytes declared as PDF
        let mime = resolve_mime(&[0xFF, 0xD8, 0xFF, 0xE0], Some("application/pdf"), "scan.pdf");
        assert_eq!(mime, "image/jpeg");
    }

    #[test]
    fn declared_type_used_when_bytes_unknown() {
        let mime = resolve_mime(&[0, 0, 0, 0], Some("Image/PNG; charset=binary"), "x");
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn extension_guess_is_last_resort() {
        assert_eq!(resolve_mime(&[0, 0, 0, 0], None, "slide.tiff"), "image/tiff");
        assert_eq!(
            resolve_mime(&[0, 0, 0, 0], Some("application/octet-stream"), "notes.txt"),
            "text/plain"
        );
        assert_eq!(resolve_mime(&[0, 0, 0, 0], None, "blob"), "application/octet-stream");
    }

    #[test]
    fn allow_list() {
        assert!(is_accepted_mime("image/jpeg"));
        assert!(is_accepted_mime("IMAGE/TIFF"));
        assert!(!is_accepted_mime("image/webp"));
        assert!(!is_accepted_mime("application/pdf"));
    }

    #[test]
    fn sanitize_path_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\lab\\field_01.jpg"), "field_01.jpg");
        assert_eq!(sanitize_filename(".."), "image");
        assert_eq!(sanitize_filename(""), "image");
    }

    #[test]
    fn sanitize_strips_control_characters() {
        assert_eq!(sanitize_filename("file\0name.png"), "filename.png");
        assert_eq!(sanitize_filename("sediment (1).jpg"), "sediment (1).jpg");
    }
}
