//! Reading the raw change-set payload.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Read the payload from `input`, or from stdin when `input` is `None` or `-`.
///
/// An empty or whitespace-only payload is an error.
pub fn read_payload(input: Option<&Path>) -> Result<String> {
    match input.filter(|path| *path != Path::new("-")) {
        Some(path) => {
            let payload =
                fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            ensure_not_blank(payload, &path.display().to_string())
        }
        None => read_from(std::io::stdin().lock(), "stdin"),
    }
}

/// Read a payload from any reader. `source` names it in error messages.
pub fn read_from(mut reader: impl Read, source: &str) -> Result<String> {
    let mut payload = String::new();
    reader
        .read_to_string(&mut payload)
        .with_context(|| format!("read payload from {source}"))?;
    ensure_not_blank(payload, source)
}

fn ensure_not_blank(payload: String, source: &str) -> Result<String> {
    if payload.trim().is_empty() {
        bail!("no payload received from {source}");
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_file_payload() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("changes.xml");
        fs::write(&path, "<changes/>").expect("write");

        assert_eq!(read_payload(Some(&path)).expect("read"), "<changes/>");
    }

    #[test]
    fn blank_reader_is_rejected() {
        let err = read_from("  \n".as_bytes(), "stdin").expect_err("blank");
        assert!(err.to_string().contains("no payload received from stdin"));
    }

    #[test]
    fn missing_file_names_path() {
        let err = read_payload(Some(Path::new("/definitely/missing.xml"))).expect_err("missing");
        assert!(err.to_string().contains("missing.xml"));
    }
}
