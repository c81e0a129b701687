//! Trackplot extracts frames from video files, renders tracking overlays
//! (positions + orientation vectors) onto them, and reassembles the results
//! into output videos.
//!
//! # Pipeline overview
//!
//! 1. **Resolve**: frame ids are looked up in a [`Catalog`] (container,
//!    index, source video).
//! 2. **Extract**: the external decoder materializes frame images into the
//!    path-addressed [`CacheStore`]; complete directories are cache hits.
//! 3. **Render**: [`render_overlay`] draws arrow markers per frame, fanned
//!    out over an owned [`WorkerPool`].
//! 4. **Assemble**: results are collected in submission order, staged as a
//!    numbered sequence, and handed to the external encoder.
//!
//! The key constraints:
//!
//! - **Deterministic order**: assembled frame order always equals the
//!   canonical descriptor order, never worker completion order.
//! - **Idempotent extraction**: re-running extraction reproduces the same
//!   files; partial directories are treated as cache misses.
//! - **Scoped scratch space**: temporary staging directories are removed on
//!   drop, on the error path included.
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//!
//! External decoder and encoder invocations are opaque command templates
//! (see [`PlotConfig`]); nothing in this crate decodes video itself.
#![forbid(unsafe_code)]

pub mod assemble;
pub mod cache;
pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod overlay;
pub mod pool;
pub mod service;

pub use assemble::Assembler;
pub use cache::{CacheStore, Fingerprint, ResultCache, fingerprint_args};
pub use catalog::{Catalog, MemoryCatalog};
pub use command::{CommandRunner, ShellRunner, fill_template, is_ffmpeg_on_path};
pub use config::PlotConfig;
pub use error::{PlotError, PlotResult};
pub use extract::Extractor;
pub use model::{Frame, FrameContainer, FrameDescriptor, ResolvedContainer, ResolvedFrame, Video};
pub use overlay::{direction_vec, render_overlay, scale_coords};
pub use pool::{TaskHandle, WorkerPool};
pub use service::PlotService;
