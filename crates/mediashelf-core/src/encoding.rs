use base64::{engine::general_purpose::STANDARD, Engine};

/// Encode bytes as `data:<mime>;base64,<body>`.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    let mime = if mime.is_empty() {
        "application/octet-stream"
    } else {
        mime
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Decoded data URL: MIME type and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Parse a base64 data URL. Returns `None` for anything malformed.
pub fn from_data_url(url: &str) -> Option<DataUrl> {
    let rest = url.strip_prefix("data:")?;
    let (header, body) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(body).ok()?;
    Some(DataUrl {
        mime: mime.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_shape() {
        assert_eq!(to_data_url("image/png", b"abc"), "data:image/png;base64,YWJj");
        assert_eq!(
            to_data_url("", b""),
            "data:application/octet-stream;base64,"
        );
    }

    #[test]
    fn test_parse_data_url() {
        let parsed = from_data_url("data:video/mp4;base64,AAEC").unwrap();
        assert_eq!(parsed.mime, "video/mp4");
        assert_eq!(parsed.bytes, vec![0, 1, 2]);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(from_data_url("blob:abc").is_none());
        assert!(from_data_url("data:text/plain,hello").is_none());
        assert!(from_data_url("data:image/png;base64,@@@").is_none());
    }
}
