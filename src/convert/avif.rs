//! AVIF converter
//!
//! Converts one image in place: the source is decoded, encoded to AVIF in a
//! temporary file next to it, the temporary file is renamed to
//! `<stem>.avif`, and the source is removed. On any failure the source is
//! left untouched and the temporary file is deleted. An existing
//! `<stem>.avif` is never replaced; that job fails instead.

use crate::batch::{ConversionSizes, Job, JobProcessor};
use crate::convert::AVIF_EXTENSION;
use crate::error::{ProcessError, ProcessResult};
use image::io::Reader as ImageReader;
use image::DynamicImage;
use ravif::{Encoder, Img};
use rgb::FromSlice;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Default quality (0-100)
pub const DEFAULT_QUALITY: u8 = 80;

/// Default alpha channel quality (0-100)
pub const DEFAULT_ALPHA_QUALITY: u8 = 80;

/// Default encoder speed (0-10, lower is slower and better)
pub const DEFAULT_SPEED: u8 = 6;

/// AVIF encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingOptions {
    pub quality: u8,
    pub alpha_quality: u8,
    pub speed: u8,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            alpha_quality: DEFAULT_ALPHA_QUALITY,
            speed: DEFAULT_SPEED,
        }
    }
}

impl EncodingOptions {
    fn encoder(&self) -> Encoder {
        // The encoder accepts speed 1-10 and quality 1-100
        Encoder::new()
            .with_quality(f32::from(self.quality.clamp(1, 100)))
            .with_alpha_quality(f32::from(self.alpha_quality.clamp(1, 100)))
            .with_speed(self.speed.clamp(1, 10))
    }
}

/// Converts JPEG/PNG/WebP files to AVIF
#[derive(Debug, Clone, Default)]
pub struct AvifConverter {
    options: EncodingOptions,
}

impl AvifConverter {
    pub fn new(options: EncodingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> EncodingOptions {
        self.options
    }

    /// Where the converted file for `source` is written
    pub fn output_path(source: &Path) -> PathBuf {
        source.with_extension(AVIF_EXTENSION)
    }

    /// Convert a single file, returning its sizes before and after
    pub fn convert(&self, source: &Path) -> ProcessResult<ConversionSizes> {
        let original = fs::metadata(source).map_err(ProcessError::Stat)?.len();

        let img = ImageReader::open(source)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(ProcessError::Open)?
            .decode()
            .map_err(ProcessError::Decode)?;

        let avif = self.encode(&img)?;

        let dir = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // Dropped (and deleted) on every early return below
        let mut temp = tempfile::Builder::new()
            .prefix(".avifconv-")
            .suffix(".avif")
            .tempfile_in(dir)
            .map_err(ProcessError::TempFile)?;

        temp.write_all(&avif)
            .and_then(|()| temp.flush())
            .map_err(ProcessError::Write)?;
        let compressed = avif.len() as u64;

        let output = Self::output_path(source);
        if output == source {
            temp.persist(&output)
                .map_err(|e| ProcessError::Rename(e.error))?;
        } else {
            temp.persist_noclobber(&output).map_err(|e| {
                if e.error.kind() == io::ErrorKind::AlreadyExists {
                    ProcessError::OutputExists(output.clone())
                } else {
                    ProcessError::Rename(e.error)
                }
            })?;
            fs::remove_file(source).map_err(ProcessError::RemoveOriginal)?;
        }

        trace!(
            source = %source.display(),
            output = %output.display(),
            original = original,
            compressed = compressed,
            "Converted"
        );

        Ok(ConversionSizes::new(original, compressed))
    }

    /// Encode to an in-memory AVIF file
    fn encode(&self, img: &DynamicImage) -> ProcessResult<Vec<u8>> {
        let encoder = self.options.encoder();

        let encoded = if img.color().has_alpha() {
            let rgba = img.to_rgba8();
            let (width, height) = (rgba.width() as usize, rgba.height() as usize);
            encoder.encode_rgba(Img::new(rgba.as_raw().as_rgba(), width, height))
        } else {
            let rgb = img.to_rgb8();
            let (width, height) = (rgb.width() as usize, rgb.height() as usize);
            encoder.encode_rgb(Img::new(rgb.as_raw().as_rgb(), width, height))
        };

        encoded
            .map(|image| image.avif_file)
            .map_err(ProcessError::Encode)
    }
}

impl JobProcessor for AvifConverter {
    fn process(&self, job: &Job) -> ProcessResult<ConversionSizes> {
        self.convert(job.path())
    }
}
