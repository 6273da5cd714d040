//! Export orchestration: page selection, job scheduling and the renderer seam.

pub mod error;
pub mod export;
pub mod render;
