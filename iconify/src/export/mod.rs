//! Writes finished icons and previews to disk.

use crate::ico::FrameSet;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// The media type conventionally served for `.ico` files
pub const ICO_MEDIA_TYPE: &str = "image/x-icon";

/// Builds a file name that is unique per millisecond, e.g. `favicon_1700000000000.ico`.
///
/// Windows caches icons by path, a fresh name makes sure a regenerated icon shows up.
pub fn timestamped_name(stem: &str, now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    format!("{}_{}.ico", stem, millis)
}

/// Returns the file name of a preview image for the given size.
pub fn preview_name(size: u32) -> String {
    format!("preview-{}x{}.png", size, size)
}

#[derive(Debug)]
pub struct Exporter {
    output_dir: PathBuf,
    outputs: ExportOutputs,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            outputs: ExportOutputs::default(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes the encoded icon and records it under the output name `icon`.
    pub async fn write_icon(
        &mut self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, ExportError> {
        let path = self.write_output("icon", file_name, bytes).await?;
        tracing::info!(
            "Wrote {} ({} bytes, {})",
            path.display(),
            bytes.len(),
            ICO_MEDIA_TYPE
        );

        Ok(path)
    }

    /// Writes one preview PNG per frame of the given set.
    pub async fn write_previews(
        &mut self,
        frames: &FrameSet,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let mut paths = Vec::with_capacity(frames.len());

        for frame in frames {
            let name = preview_name(frame.dimension());
            let path = self
                .write_output(&name, &name, frame.encoded_bytes())
                .await?;

            tracing::debug!("Wrote preview {}", path.display());
            paths.push(path);
        }

        Ok(paths)
    }

    async fn write_output(
        &mut self,
        name: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, ExportError> {
        if let Ok(existing) = self.outputs.get_output(name) {
            return Err(ExportError::DuplicatedOutput {
                name: name.to_owned(),
                path: existing.to_path_buf(),
            });
        }

        if Path::new(file_name).file_name() != Some(OsStr::new(file_name)) {
            return Err(ExportError::InvalidFileName(file_name.to_owned()));
        }

        // Creates the output directory on first use
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let path = self.output_dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;

        self.outputs.outputs.insert(name.to_owned(), path.clone());
        Ok(path)
    }

    pub fn finalize(self) -> ExportOutputs {
        self.outputs
    }
}

/// The files produced by an [`Exporter`], keyed by output name.
#[derive(Debug, Default)]
pub struct ExportOutputs {
    outputs: HashMap<String, PathBuf>,
}

impl ExportOutputs {
    pub fn get_output(&self, name: &str) -> Result<&Path, ExportError> {
        self.outputs
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| ExportError::OutputNotFound(name.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("an I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("the output {name} has already been generated at {}", path.display())]
    DuplicatedOutput { name: String, path: PathBuf },

    #[error("the output {0} was not found in the generated outputs")]
    OutputNotFound(String),

    #[error("{0:?} is not a plain file name")]
    InvalidFileName(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ico::Frame;
    use std::time::Duration;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "iconify-export-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn timestamp_names() {
        let now = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        assert_eq!(
            timestamped_name("favicon", now),
            "favicon_1700000000123.ico"
        );
        assert_eq!(preview_name(48), "preview-48x48.png");
    }

    #[tokio::test]
    async fn writes_icon_and_previews() {
        let dir = scratch_dir("write").join("nested");
        let mut exporter = Exporter::new(&dir);

        let path = exporter.write_icon("app.ico", b"ico bytes").await.unwrap();
        assert_eq!(path, dir.join("app.ico"));
        assert_eq!(std::fs::read(&path).unwrap(), b"ico bytes");

        let previews = FrameSet::from(vec![
            Frame::new(32, b"p32".to_vec()),
            Frame::new(16, b"p16".to_vec()),
        ]);
        let paths = exporter.write_previews(&previews).await.unwrap();
        assert_eq!(paths[1], dir.join("preview-16x16.png"));
        assert_eq!(std::fs::read(&paths[0]).unwrap(), b"p32");

        let outputs = exporter.finalize();
        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs.get_output("icon").unwrap(), dir.join("app.ico"));
        assert!(matches!(
            outputs.get_output("missing"),
            Err(ExportError::OutputNotFound(_))
        ));

        std::fs::remove_dir_all(dir.parent().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn refuses_duplicated_outputs() {
        let dir = scratch_dir("duplicate");
        let mut exporter = Exporter::new(&dir);

        exporter.write_icon("first.ico", b"1").await.unwrap();
        assert!(matches!(
            exporter.write_icon("second.ico", b"2").await,
            Err(ExportError::DuplicatedOutput { .. })
        ));
        assert!(!dir.join("second.ico").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn refuses_paths_as_file_names() {
        let dir = scratch_dir("names");
        let mut exporter = Exporter::new(&dir);

        assert!(matches!(
            exporter.write_icon("../escape.ico", b"x").await,
            Err(ExportError::InvalidFileName(_))
        ));
        assert!(exporter.finalize().is_empty());
    }
}
