//! Image conversion collaborators
//!
//! - [`collect`]: finds convertible images under a directory
//! - [`avif`]: the AVIF converter used as the batch engine's processor

pub mod avif;
pub mod collect;

pub use avif::{AvifConverter, EncodingOptions};
pub use collect::{collect_images, is_supported, SUPPORTED_EXTENSIONS};

/// Extension written for converted files
pub const AVIF_EXTENSION: &str = "avif";
