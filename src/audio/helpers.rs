pub(super) fn normalize_mime_type(mime_type: &str) -> Option<String> {
    let normalized = mime_type
        .split(';')
        .next()
        .map(str::trim)
        .unwrap_or_default();
    if normalized.is_empty() {
        return None;
    }
    Some(normalized.to_ascii_lowercase())
}

pub(super) fn build_transcription_multipart(
    boundary: &str,
    model: &str,
    audio: &[u8],
    mime_type: &str,
    extension: &str,
    language: Option<&str>,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(audio.len() + 512);

    append_field(&mut body, boundary, "model", model);
    append_field(&mut body, boundary, "response_format", "json");
    if let Some(lang) = language {
        append_field(&mut body, boundary, "language", lang.trim());
    }

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"audio.{extension}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(audio);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    body
}

fn append_field(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_mime_parameters() {
        assert_eq!(normalize_mime_type("Audio/WAV; codecs=1").as_deref(), Some("audio/wav"));
        assert_eq!(normalize_mime_type("  "), None);
    }

    #[test]
    fn multipart_contains_fields_and_file() {
        let body = build_transcription_multipart("b0", "whisper-large-v3", b"RIFF", "audio/wav", "wav", Some("ur"));
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("name=\"model\"\r\n\r\nwhisper-large-v3\r\n"));
        assert!(text.contains("name=\"language\"\r\n\r\nur\r\n"));
        assert!(text.contains("filename=\"audio.wav\""));
        assert!(text.ends_with("--b0--\r\n"));
    }
}
