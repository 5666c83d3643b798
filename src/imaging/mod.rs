//! Image processing: pure Rust, built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Resize → JPEG/PNG/GIF** | Lanczos3 + `image` encoders |
//! | **Width selection** | [`select_widths`] (pure) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for width and dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{scaled_height, select_widths};
pub use params::{Quality, ResizeParams};
pub use rust_backend::RustBackend;
