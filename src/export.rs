//! Turns a rendered document into a PDF on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use crate::error::ExportError;
use crate::render::RenderedDocument;

pub trait Exporter {
    /// Writes `document` out and returns the path of the produced file.
    fn export(&mut self, document: &RenderedDocument) -> Result<PathBuf, ExportError>;
}

/// Compiles the Typst source with the `typst` CLI, keeping the `.typ` next to the PDF.
pub struct TypstExporter {
    output_dir: PathBuf,
    typst_bin: String,
    reveal: bool,
}

impl TypstExporter {
    pub fn new(output_dir: impl Into<PathBuf>, typst_bin: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            typst_bin: typst_bin.into(),
            reveal: false,
        }
    }

    /// Open the PDF and its folder after a successful export.
    pub fn reveal(mut self, reveal: bool) -> Self {
        self.reveal = reveal;
        self
    }
}

impl Exporter for TypstExporter {
    fn export(&mut self, document: &RenderedDocument) -> Result<PathBuf, ExportError> {
        if Command::new(&self.typst_bin).arg("--version").output().is_err() {
            return Err(ExportError::TypstMissing(self.typst_bin.clone()));
        }

        fs::create_dir_all(&self.output_dir)?;
        let pdf_path = self.output_dir.join(&document.filename);
        let typ_path = pdf_path.with_extension("typ");

        fs::write(&typ_path, &document.source)?;

        info!(path = %pdf_path.display(), "compiling PDF");
        let status = Command::new(&self.typst_bin)
            .arg("compile")
            .arg(&typ_path)
            .arg(&pdf_path)
            .status()?;

        if !status.success() {
            warn!(?status, path = %typ_path.display(), "typst compile failed");
            return Err(ExportError::Compile(typ_path));
        }

        if self.reveal {
            open_and_reveal(&pdf_path);
        }
        Ok(pdf_path)
    }
}

/// Open a file (or folder) with the desktop's default handler.
pub fn open_path(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(path).spawn().ok();

    #[cfg(target_os = "linux")]
    Command::new("xdg-open").arg(path).spawn().ok();
}

// Show the file in Finder/Explorer, then open it
fn open_and_reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg("-R").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer")
        .arg(format!("/select,{}", path.to_string_lossy()))
        .spawn()
        .ok();

    #[cfg(target_os = "linux")]
    Command::new("xdg-open").arg(path.parent().unwrap_or(path)).spawn().ok();

    open_path(path);
}
