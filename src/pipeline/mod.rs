//! Normalisation stages for engine output.
//!
//! Each submodule implements one step; [`page`] ties them together per page.
//!
//! ## Data Flow
//!
//! ```text
//!                 ┌─▶ classify ──▶ list   (free text)
//! engine page ──▶ page            └─▶ table  (HTML)
//!                 └─▶ image  (raster → disk)
//! ```
//!
//! 1. [`classify`] — label dispatch onto the closed set of content records
//! 2. [`list`]     — split enumerated/bulleted free text into items
//! 3. [`table`]    — HTML table → header-keyed row mappings
//! 4. [`image`]    — write a region's raster under the document directory
//! 5. [`page`]     — run the above over one page's regions, in order
//! 6. [`metadata`] — page count and filesystem stat for the file record

pub mod classify;
pub mod image;
pub mod list;
pub mod metadata;
pub mod page;
pub mod table;
