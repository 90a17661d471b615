//! Data URL values and the JPEG data URL writer

use std::fmt;
use std::path::Path;

use base64::Engine as Base64Engine;
use log::{debug, warn};

use crate::{Error, ImageFormat, Result};

const JPEG_PREFIX: &str = "data:image/jpeg;base64,";

/// An encoded thumbnail held as a `data:<mime>;base64,<payload>` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Wrap encoded image bytes.
    pub fn from_bytes(format: ImageFormat, bytes: &[u8]) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self(format!("data:{};base64,{}", format.mime_type(), payload))
    }

    /// Accept a data URL produced elsewhere (e.g. by `canvas.toDataURL`).
    pub fn from_data_url(url: String) -> Result<Self> {
        match parse_data_url(&url) {
            Some((mime, _)) if mime.starts_with("image/") => Ok(Self(url)),
            _ => Err(Error::Render(format!(
                "Expected an image data URL, got {:?}",
                url.chars().take(32).collect::<String>()
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn mime_type(&self) -> &str {
        parse_data_url(&self.0).map(|(mime, _)| mime).unwrap_or_default()
    }

    /// Decode the base64 payload back into the encoded image bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let (_, payload) = parse_data_url(&self.0)
            .ok_or_else(|| Error::Decode("Not a base64 data URL".into()))?;
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| Error::Decode(format!("Invalid base64 payload: {}", e)))
    }
}

impl fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<EncodedImage> for String {
    fn from(img: EncodedImage) -> Self {
        img.0
    }
}

/// Split `data:<mime>;base64,<payload>` into its MIME type and payload.
pub fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    url.strip_prefix("data:")?.split_once(";base64,")
}

/// Decode a JPEG data URL and write the raw bytes to `dest`, overwriting.
///
/// Any other MIME type (PNG included) is refused without touching the
/// filesystem.
pub fn try_write_data_url(data_url: &str, dest: impl AsRef<Path>) -> Result<()> {
    let payload = data_url.strip_prefix(JPEG_PREFIX).ok_or_else(|| {
        Error::InvalidInput("Only data:image/jpeg;base64 URLs can be written".into())
    })?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| Error::Decode(format!("Invalid base64 payload: {}", e)))?;

    std::fs::write(dest.as_ref(), &bytes)?;
    debug!("Wrote {} bytes to {}", bytes.len(), dest.as_ref().display());
    Ok(())
}

/// Best-effort variant of [`try_write_data_url`]: failures are logged and
/// the input is handed back unchanged either way.
pub fn write_data_url(data_url: &str, dest: impl AsRef<Path>) -> String {
    if let Err(e) = try_write_data_url(data_url, dest.as_ref()) {
        warn!("Failed to write data URL to {}: {}", dest.as_ref().display(), e);
    }
    data_url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_mime_and_payload() {
        assert_eq!(parse_data_url("data:image/png;base64,AAAA"), Some(("image/png", "AAAA")));
        assert_eq!(parse_data_url("image/png;base64,AAAA"), None);
        assert_eq!(parse_data_url("data:text/plain,hello"), None);
    }

    #[test]
    fn encoded_image_recovers_bytes() {
        let img = EncodedImage::from_bytes(ImageFormat::Jpeg, &[0xFF, 0xD8, 0xFF, 0xE0]);
        assert!(img.as_str().starts_with(JPEG_PREFIX));
        assert_eq!(img.mime_type(), "image/jpeg");
        assert_eq!(img.to_bytes().unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[test]
    fn from_data_url_rejects_non_images() {
        assert!(EncodedImage::from_data_url("data:image/png;base64,iVBO".into()).is_ok());
        assert!(matches!(
            EncodedImage::from_data_url("data:text/html;base64,PGI+".into()),
            Err(Error::Render(_))
        ));
        assert!(EncodedImage::from_data_url("null".into()).is_err());
    }

    #[test]
    fn try_write_refuses_png() {
        let err = try_write_data_url("data:image/png;base64,iVBORw0KGgo=", "/nonexistent/out.png").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn try_write_reports_bad_base64() {
        let err = try_write_data_url("data:image/jpeg;base64,@@@", "/nonexistent/out.jpg").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
