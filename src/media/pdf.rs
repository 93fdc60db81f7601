//! Plain-text extraction from PDF documents.

use crate::outcome::{Outcome, SkipReason};
use std::panic::{self, UnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Output file for a PDF: `{out_dir}/{stem}.txt`.
pub fn text_path(pdf: &Path, out_dir: &Path) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    out_dir.join(format!("{stem}.txt"))
}

/// Extract the text of one PDF and write it next to the others in `out_dir`.
#[instrument(level = "info", fields(pdf = %pdf.display()), skip_all)]
pub fn extract_pdf_text(pdf: &Path, out_dir: &Path) -> Result<PathBuf, SkipReason> {
    if !pdf.exists() {
        return Err(SkipReason::NotFound(pdf.display().to_string()));
    }

    let text = contain_panics(|| pdf_extract::extract_text(pdf))?;
    std::fs::create_dir_all(out_dir)?;
    let output = text_path(pdf, out_dir);
    std::fs::write(&output, &text)?;

    info!(output = %output.display(), chars = text.chars().count(), "Extracted text");
    Ok(output)
}

/// Run a PDF decoder call, turning both its errors and its panics into a skip.
///
/// The decoder panics on some fonts and encodings it does not support.
fn contain_panics<T, E: std::fmt::Display>(
    decode: impl FnOnce() -> Result<T, E> + UnwindSafe,
) -> Result<T, SkipReason> {
    match panic::catch_unwind(decode) {
        Ok(result) => result.map_err(|e| SkipReason::Pdf(e.to_string())),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(SkipReason::Pdf(format!("decoder panicked: {message}")))
        }
    }
}

/// Extract every PDF into `out_dir`; unreadable files become skips.
pub fn extract_all(pdfs: &[PathBuf], out_dir: &Path) -> Vec<Outcome<PathBuf>> {
    pdfs.iter()
        .map(|pdf| match extract_pdf_text(pdf, out_dir) {
            Ok(output) => Outcome::Done(output),
            Err(reason) => {
                warn!(pdf = %pdf.display(), %reason, "Error reading PDF");
                Outcome::skipped(pdf.display().to_string(), reason)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_path_uses_stem() {
        assert_eq!(
            text_path(Path::new("public/regulamin.pdf"), Path::new("data")),
            PathBuf::from("data/regulamin.txt")
        );
    }

    #[test]
    fn test_decoder_panic_becomes_skip() {
        let result: Result<String, SkipReason> =
            contain_panics(|| -> Result<String, String> { panic!("unsupported font encoding") });
        match result {
            Err(SkipReason::Pdf(message)) => assert!(message.contains("unsupported font encoding")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_decoder_error_becomes_skip() {
        let result = contain_panics(|| Err::<String, _>("bad xref"));
        assert!(matches!(result, Err(SkipReason::Pdf(m)) if m == "bad xref"));
    }

    #[test]
    fn test_missing_pdf_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let outcomes = extract_all(&[tmp.path().join("rodo.pdf")], tmp.path());
        assert_eq!(outcomes[0].skip_reason().map(|r| r.label()), Some("not_found"));
    }

    #[test]
    fn test_invalid_pdf_is_skipped_without_output() {
        let tmp = tempfile::tempdir().unwrap();
        let pdf = tmp.path().join("broken.pdf");
        std::fs::write(&pdf, b"this is not a pdf").unwrap();
        let out_dir = tmp.path().join("out");

        let outcomes = extract_all(&[pdf.clone()], &out_dir);

        assert_eq!(outcomes[0].skip_reason().map(|r| r.label()), Some("pdf"));
        assert!(!text_path(&pdf, &out_dir).exists());
    }
}
