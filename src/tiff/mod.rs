//! TIFF file format parsing module
//!
//! This module provides structures and functions for reading
//! TIFF and BigTIFF format files.

pub mod errors;
pub mod ifd;
pub(crate) mod types;
pub mod reader;
mod tests;
pub mod constants;
pub(crate) mod validation;
pub mod classifier;
pub mod compat;
pub mod conditional;
pub mod splice;
pub mod writer;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use errors::{TiffError, TiffResult};
pub use ifd::{IFD, IFDEntry};
pub use reader::TiffReader;
pub use types::TIFF;
pub use classifier::{classify, IfdKind};
pub use writer::BigTiffWriter;

// Constants for TIFF format
pub const BIGTIFF_VERSION: u16 = 43;
pub const BIGTIFF_OFFSETSIZE: u16 = 8;
