use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    assemble::Assembler,
    cache::{CacheStore, ResultCache, fingerprint_args},
    catalog::Catalog,
    command::{CommandRunner, ShellRunner},
    config::PlotConfig,
    error::{PlotError, PlotResult},
    extract::Extractor,
    model::FrameDescriptor,
    overlay::render_overlay,
    pool::WorkerPool,
};

/// The four top-level operations consumed by the routing layer.
///
/// Owns the worker pool, the artifact cache store and the memoization cache
/// for the two plot operations; everything else is borrowed per call.
pub struct PlotService {
    config: PlotConfig,
    cache: CacheStore,
    catalog: Arc<dyn Catalog>,
    runner: Arc<dyn CommandRunner>,
    pool: WorkerPool,
    results: ResultCache,
}

impl PlotService {
    pub fn new(config: PlotConfig, catalog: Arc<dyn Catalog>) -> PlotResult<Self> {
        Self::with_runner(config, catalog, Arc::new(ShellRunner))
    }

    /// Construction seam for tests: substitute the external-process runner.
    pub fn with_runner(
        config: PlotConfig,
        catalog: Arc<dyn Catalog>,
        runner: Arc<dyn CommandRunner>,
    ) -> PlotResult<Self> {
        config.validate()?;
        let cache = CacheStore::new(&config.work_dir);
        let pool = WorkerPool::new(config.threads)?;
        Ok(Self {
            config,
            cache,
            catalog,
            runner,
            pool,
            results: ResultCache::new(),
        })
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// Path of a single extracted frame image, extracting it on demand.
    #[tracing::instrument(skip(self))]
    pub fn single_frame_path(&self, frame_id: u64) -> PlotResult<PathBuf> {
        let frame = self.catalog.resolve_frame(frame_id)?;
        let extractor = Extractor::new(&self.config, &self.cache, self.runner.as_ref());
        extractor.extract_single(&frame)
    }

    /// Assembles the given frames, in the given order, into a video.
    ///
    /// Fails with `NotFound` before any extraction or encoding if any id is
    /// unresolvable.
    #[tracing::instrument(skip(self, frame_ids), fields(frames = frame_ids.len()))]
    pub fn video_path(&self, frame_ids: &[u64]) -> PlotResult<PathBuf> {
        self.assembler().frames_to_video(frame_ids)
    }

    /// Renders position/orientation overlays onto a single frame.
    ///
    /// Memoized: an identical `(frame_id, x, y, rot)` request returns the
    /// previously produced artifact path without recomputation.
    #[tracing::instrument(skip(self, x, y, rot))]
    pub fn plot_single_frame(
        &self,
        frame_id: u64,
        x: &[f64],
        y: &[f64],
        rot: &[f64],
    ) -> PlotResult<PathBuf> {
        if x.len() != y.len() || x.len() != rot.len() {
            return Err(PlotError::validation(format!(
                "x, y and rot must have the same length (got {}, {}, {})",
                x.len(),
                y.len(),
                rot.len()
            )));
        }

        let key = fingerprint_args(
            "plot_single_frame",
            &serde_json::json!({
                "frame_id": frame_id,
                "x": x,
                "y": y,
                "rot": rot,
            }),
        );
        self.results.get_or_compute(key, || {
            let frame = self.catalog.resolve_frame(frame_id)?;
            let extractor = Extractor::new(&self.config, &self.cache, self.runner.as_ref());
            let src = extractor.extract_single(&frame)?;
            let out = self.cache.unique_artifact("plot", "jpg");
            render_overlay(&src, &out, Some(x), Some(y), Some(rot), self.config.scale)?;
            Ok(out)
        })
    }

    /// Renders a descriptor sequence into a video, optionally gap-filled.
    ///
    /// Memoized on the canonicalized descriptor list plus the `fill_gap`
    /// flag.
    #[tracing::instrument(skip(self, descriptors), fields(descriptors = descriptors.len(), fill_gap))]
    pub fn plot_video(
        &self,
        descriptors: &[FrameDescriptor],
        fill_gap: bool,
    ) -> PlotResult<PathBuf> {
        for desc in descriptors {
            desc.validate()?;
        }

        let args = serde_json::json!({
            "descriptors": descriptors,
            "fill_gap": fill_gap,
        });
        let key = fingerprint_args("plot_video", &args);
        self.results
            .get_or_compute(key, || self.assembler().assemble_video(descriptors, fill_gap))
    }

    fn assembler(&self) -> Assembler<'_> {
        Assembler::new(
            &self.config,
            &self.cache,
            self.catalog.as_ref(),
            self.runner.as_ref(),
            &self.pool,
        )
    }
}
