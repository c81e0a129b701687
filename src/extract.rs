use std::{collections::BTreeSet, path::PathBuf};

use anyhow::Context as _;

use crate::{
    cache::{CacheStore, frame_file_stem},
    catalog::Catalog,
    command::{CommandRunner, fill_template},
    config::PlotConfig,
    error::{PlotError, PlotResult},
    model::ResolvedFrame,
};

/// Materializes frame images into the cache store by invoking the external
/// decoder. All invocations are blocking; failures are fatal for the call
/// with no retry.
pub struct Extractor<'a> {
    config: &'a PlotConfig,
    cache: &'a CacheStore,
    runner: &'a dyn CommandRunner,
}

impl<'a> Extractor<'a> {
    pub fn new(config: &'a PlotConfig, cache: &'a CacheStore, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            cache,
            runner,
        }
    }

    /// Extracts exactly one frame, returning its cached image path.
    ///
    /// A pre-existing image at the expected path is a cache hit and skips
    /// the decoder. After a decoder run the output file must exist.
    pub fn extract_single(&self, frame: &ResolvedFrame) -> PlotResult<PathBuf> {
        let out = self.cache.frame_image(&frame.video_name, frame.index);
        let video_path = frame.video_path.to_string_lossy().into_owned();
        let index = frame.index.to_string();
        self.cache.materialize(&out, |path| {
            let output_path = path.to_string_lossy().into_owned();
            let cmd = fill_template(
                &self.config.extract_single_cmd,
                &[
                    ("video_path", video_path.as_str()),
                    ("frame_index", index.as_str()),
                    ("output_path", output_path.as_str()),
                ],
            )?;
            tracing::info!(frame_id = frame.frame_id, index = frame.index, "extracting single frame");
            self.runner.run(&cmd)
        })
    }

    /// Extracts every frame of a container's video, returning the directory.
    ///
    /// If the directory already holds an image for every expected index the
    /// decoder is not invoked. Otherwise the whole video is decoded in one
    /// run; the freshly written file set is trusted without re-verification.
    pub fn extract_all(&self, catalog: &dyn Catalog, container_id: u64) -> PlotResult<PathBuf> {
        let indices = catalog.container_indices(container_id)?;
        if indices.is_empty() {
            return Err(PlotError::not_found(format!(
                "container {container_id} has no frames"
            )));
        }
        let container = catalog.resolve_container(container_id)?;

        let dir = self.cache.video_dir(&container.video_name);
        if dir.is_dir() && self.dir_covers_indices(&dir, &indices)? {
            tracing::debug!(container_id, dir = %dir.display(), "extraction cache hit");
            return Ok(dir);
        }

        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create '{}'", dir.display()))?;
        let video_path = container.video_path.to_string_lossy().into_owned();
        let output_path = dir.to_string_lossy().into_owned();
        let cmd = fill_template(
            &self.config.extract_all_cmd,
            &[
                ("video_path", video_path.as_str()),
                ("output_path", output_path.as_str()),
            ],
        )?;
        tracing::info!(container_id, video = %container.video_name, "extracting all frames");
        self.runner.run(&cmd)?;
        Ok(dir)
    }

    /// True when the directory's file stems are a superset of the expected
    /// zero-padded index set. Partial directories count as cache misses.
    fn dir_covers_indices(&self, dir: &std::path::Path, indices: &[u32]) -> PlotResult<bool> {
        let mut stems = BTreeSet::new();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to list '{}'", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("failed to list '{}'", dir.display()))?;
            if let Some(stem) = entry.path().file_stem() {
                stems.insert(stem.to_string_lossy().into_owned());
            }
        }
        Ok(indices.iter().all(|i| stems.contains(&frame_file_stem(*i))))
    }
}
