use base64::{engine::general_purpose::STANDARD, Engine as _};

const PDF_MAGIC: &[u8] = b"%PDF";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];

/// A resume as it arrives in the submission body: a data URL
/// (`data:application/pdf;base64,...`) or a bare base64 string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumePayload {
    pub declared_mime: Option<String>,
    pub base64: String,
}

impl ResumePayload {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (declared_mime, payload) = match raw.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',')?;
                let mut parts = header.split(';');
                let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
                if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
                    return None;
                }
                ((!mime.is_empty()).then_some(mime), payload)
            }
            None => (None, raw),
        };

        let base64: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        if base64.is_empty() {
            return None;
        }
        Some(Self {
            declared_mime,
            base64,
        })
    }

    /// Decoded size implied by the encoded length, without decoding.
    pub fn estimated_decoded_len(&self) -> usize {
        let padding = self.base64.bytes().rev().take_while(|b| *b == b'=').count().min(2);
        (self.base64.len() * 3 / 4).saturating_sub(padding)
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.base64.as_bytes())
    }
}

/// Text after the last dot, lowercased. A bare `.pdf` counts as a pdf.
pub fn file_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "rtf" => "application/rtf",
        _ => "application/octet-stream",
    }
}

/// Browsers send this (or nothing) when they cannot classify a file.
pub fn is_generic_mime(mime: &str) -> bool {
    mime.is_empty() || mime == "application/octet-stream"
}

/// Checks the leading bytes against the format the extension claims.
/// Extensions without a known signature are accepted as-is.
pub fn signature_matches(extension: &str, data: &[u8]) -> bool {
    match extension {
        "pdf" => data.starts_with(PDF_MAGIC),
        "doc" => data.starts_with(OLE_MAGIC),
        "docx" => data.starts_with(ZIP_MAGIC),
        _ => true,
    }
}
