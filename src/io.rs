use image::codecs::png::PngEncoder;
use image::{ImageEncoder, ImageError, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::log_info;

// ============================================================================
// ARTWORK DECODING
// ============================================================================

#[derive(Debug)]
pub enum ArtworkError {
    Io(std::io::Error),
    Decode(ImageError),
    /// The image decoded but has no pixels.
    Empty,
}

impl std::fmt::Display for ArtworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtworkError::Io(e) => write!(f, "I/O error: {}", e),
            ArtworkError::Decode(e) => write!(f, "Could not decode artwork: {}", e),
            ArtworkError::Empty => write!(f, "Artwork has zero size"),
        }
    }
}

impl std::error::Error for ArtworkError {}

impl From<std::io::Error> for ArtworkError {
    fn from(e: std::io::Error) -> Self {
        ArtworkError::Io(e)
    }
}

impl From<ImageError> for ArtworkError {
    fn from(e: ImageError) -> Self {
        ArtworkError::Decode(e)
    }
}

/// Decode any format the `image` crate understands into straight-alpha RGBA8.
pub fn decode_artwork(bytes: &[u8]) -> Result<RgbaImage, ArtworkError> {
    let img = image::load_from_memory(bytes)?.to_rgba8();
    if img.width() == 0 || img.height() == 0 {
        return Err(ArtworkError::Empty);
    }
    Ok(img)
}

/// Read and decode a line-art file from disk.
pub fn load_artwork_file(path: &Path) -> Result<RgbaImage, ArtworkError> {
    let raw = std::fs::read(path)?;
    decode_artwork(&raw)
}

// ============================================================================
// PNG EXPORT
// ============================================================================

#[derive(Debug)]
pub enum ExportError {
    /// Nothing to export: no artwork is loaded.
    Unloaded,
    Encode(ImageError),
    Io(std::io::Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Unloaded => write!(f, "No artwork loaded"),
            ExportError::Encode(e) => write!(f, "PNG encoding failed: {}", e),
            ExportError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<ImageError> for ExportError {
    fn from(e: ImageError) -> Self {
        ExportError::Encode(e)
    }
}

/// Encode a composited page as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ExportError::Unloaded);
    }
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(bytes)
}

/// Encode and write a composited page to `path`.
pub fn write_export(image: &RgbaImage, path: &Path) -> Result<(), ExportError> {
    let bytes = encode_png(image)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    log_info!(
        "Exported {}x{} page to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

// ============================================================================
// PROGRESS PROJECT (.reef)
// ============================================================================

pub const PROJECT_MAGIC: &str = "REF1";
pub const PROJECT_EXTENSION: &str = "reef";

/// Maximum supported surface dimension in pixels (per axis).
/// Prevents memory exhaustion from crafted project files.
const MAX_SURFACE_DIM: u32 = 16_384;

#[derive(Debug)]
pub enum ProjectError {
    Io(std::io::Error),
    Serialize(String),
    InvalidFormat(String),
}

impl std::fmt::Display for ProjectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectError::Io(e) => write!(f, "I/O error: {}", e),
            ProjectError::Serialize(e) => write!(f, "Serialization error: {}", e),
            ProjectError::InvalidFormat(e) => write!(f, "Invalid format: {}", e),
        }
    }
}

impl std::error::Error for ProjectError {}

impl From<std::io::Error> for ProjectError {
    fn from(e: std::io::Error) -> Self {
        ProjectError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for ProjectError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        ProjectError::Serialize(e.to_string())
    }
}

/// Saved coloring progress: which artwork, and everything painted on it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProgressProject {
    pub magic: String,
    /// Preset id (`"1"`, `"2"`, `"3"`); `None` for line art opened from a file.
    pub artwork_id: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Overlay pixels, row-major RGBA8.
    pub overlay: Vec<u8>,
}

impl ProgressProject {
    pub fn new(artwork_id: Option<String>, overlay: &RgbaImage) -> Self {
        Self {
            magic: PROJECT_MAGIC.to_string(),
            artwork_id,
            width: overlay.width(),
            height: overlay.height(),
            overlay: overlay.as_raw().clone(),
        }
    }

    /// Rebuild the overlay surface stored in the project.
    pub fn overlay_image(&self) -> Result<RgbaImage, ProjectError> {
        RgbaImage::from_raw(self.width, self.height, self.overlay.clone()).ok_or_else(|| {
            ProjectError::InvalidFormat(format!(
                "Overlay holds {} bytes, expected {}",
                self.overlay.len(),
                self.width as usize * self.height as usize * 4
            ))
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProjectError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self, ProjectError> {
        if raw.len() < 12 {
            return Err(ProjectError::InvalidFormat("File too small".into()));
        }
        // bincode writes a String as an 8-byte length then UTF-8 bytes,
        // so the 4-char magic sits at 8..12.
        let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("");
        if magic != PROJECT_MAGIC {
            return Err(ProjectError::InvalidFormat(format!("Unknown magic '{}'", magic)));
        }

        let project: ProgressProject = bincode::deserialize(raw)?;
        if project.width == 0 || project.height == 0 {
            return Err(ProjectError::InvalidFormat(
                "Surface dimensions cannot be zero".into(),
            ));
        }
        if project.width > MAX_SURFACE_DIM || project.height > MAX_SURFACE_DIM {
            return Err(ProjectError::InvalidFormat(format!(
                "Surface size {}x{} exceeds maximum allowed {}x{}",
                project.width, project.height, MAX_SURFACE_DIM, MAX_SURFACE_DIM
            )));
        }
        if project.overlay.len() != project.width as usize * project.height as usize * 4 {
            return Err(ProjectError::InvalidFormat(format!(
                "Overlay holds {} bytes for a {}x{} surface",
                project.overlay.len(),
                project.width,
                project.height
            )));
        }
        Ok(project)
    }
}

/// Write a progress project to disk.
pub fn save_project(project: &ProgressProject, path: &Path) -> Result<(), ProjectError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, project)?;
    log_info!("Saved progress to {}", path.display());
    Ok(())
}

/// Read and validate a progress project.
pub fn load_project(path: &Path) -> Result<ProgressProject, ProjectError> {
    let raw = std::fs::read(path)?;
    ProgressProject::from_bytes(&raw)
}
