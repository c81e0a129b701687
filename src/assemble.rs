use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    cache::{CacheStore, frame_file_name},
    catalog::Catalog,
    command::{CommandRunner, fill_template},
    config::PlotConfig,
    error::{PlotError, PlotResult},
    extract::Extractor,
    model::{FrameDescriptor, ResolvedFrame},
    overlay::render_overlay,
    pool::WorkerPool,
};

/// Scratch directory removed on drop, so the error path cleans up too.
struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn create(path: PathBuf) -> PlotResult<Self> {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("failed to create '{}'", path.display()))?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Turns an ordered descriptor sequence into an encoded video artifact.
///
/// Gap-filling, per-container pre-extraction, parallel overlay rendering
/// with order-preserving collection, temp-dir staging and the external
/// encoder all live here.
pub struct Assembler<'a> {
    config: &'a PlotConfig,
    cache: &'a CacheStore,
    catalog: &'a dyn Catalog,
    runner: &'a dyn CommandRunner,
    pool: &'a WorkerPool,
}

impl<'a> Assembler<'a> {
    pub fn new(
        config: &'a PlotConfig,
        cache: &'a CacheStore,
        catalog: &'a dyn Catalog,
        runner: &'a dyn CommandRunner,
        pool: &'a WorkerPool,
    ) -> Self {
        Self {
            config,
            cache,
            catalog,
            runner,
            pool,
        }
    }

    /// Inserts coordinate-free descriptors for every catalog frame between
    /// two consecutive descriptors of the same container whose indices are
    /// not adjacent. Descriptors from different containers are never
    /// bridged. The returned sequence is the canonical frame order.
    pub fn fill_gaps(&self, descriptors: &[FrameDescriptor]) -> PlotResult<Vec<FrameDescriptor>> {
        let mut out = Vec::with_capacity(descriptors.len());
        for (i, desc) in descriptors.iter().enumerate() {
            out.push(desc.clone());
            let Some(next) = descriptors.get(i + 1) else {
                break;
            };
            let cur = self.catalog.resolve_frame(desc.frame_id)?;
            let nxt = self.catalog.resolve_frame(next.frame_id)?;
            if cur.container_id != nxt.container_id {
                continue;
            }
            if nxt.index <= cur.index || nxt.index - cur.index == 1 {
                continue;
            }
            let fill = self
                .catalog
                .frame_ids_between(cur.container_id, cur.index, nxt.index)?;
            tracing::debug!(
                container_id = cur.container_id,
                from = cur.index,
                to = nxt.index,
                inserted = fill.len(),
                "gap-filled descriptor sequence"
            );
            out.extend(fill.into_iter().map(FrameDescriptor::plain));
        }
        Ok(out)
    }

    /// Renders the descriptor sequence and assembles it into a video.
    ///
    /// The output video's frame order exactly matches the canonical
    /// (post-gap-fill) descriptor order regardless of worker completion
    /// order: tasks are submitted in sequence order and their handles are
    /// joined in that same order.
    pub fn assemble_video(
        &self,
        descriptors: &[FrameDescriptor],
        fill_gap: bool,
    ) -> PlotResult<PathBuf> {
        for desc in descriptors {
            desc.validate()?;
        }
        let canonical = if fill_gap {
            self.fill_gaps(descriptors)?
        } else {
            descriptors.to_vec()
        };
        if canonical.is_empty() {
            return Err(PlotError::validation("no frames to assemble"));
        }

        // Fail on unresolvable ids before any extraction is started.
        let resolved: Vec<ResolvedFrame> = canonical
            .iter()
            .map(|d| self.catalog.resolve_frame(d.frame_id))
            .collect::<PlotResult<_>>()?;

        let extractor = Extractor::new(self.config, self.cache, self.runner);
        let mut extracted = HashSet::new();
        let mut handles = Vec::with_capacity(canonical.len());
        for (desc, frame) in canonical.iter().zip(&resolved) {
            // Extraction of a container must finish before any of its
            // render tasks is submitted.
            if extracted.insert(frame.container_id) {
                extractor.extract_all(self.catalog, frame.container_id)?;
            }

            let src = self.cache.frame_image(&frame.video_name, frame.index);
            let out = self.cache.unique_artifact("plot", "jpg");
            let desc = desc.clone();
            let scale = self.config.scale;
            handles.push(self.pool.submit(move || {
                render_overlay(
                    &src,
                    &out,
                    desc.x.as_deref(),
                    desc.y.as_deref(),
                    desc.rot.as_deref(),
                    scale,
                )?;
                Ok(out)
            }));
        }

        let rendered: Vec<PathBuf> = handles
            .into_iter()
            .map(|h| h.join())
            .collect::<PlotResult<_>>()?;

        let staging = TempDirGuard::create(self.cache.unique_dir("assemble"))?;
        for (i, path) in rendered.iter().enumerate() {
            move_file(path, &staging.path().join(frame_file_name(i as u32)))?;
        }
        self.encode_staged(staging.path())
    }

    /// Reassembles already-extracted frames (no overlays) into a video.
    pub fn frames_to_video(&self, frame_ids: &[u64]) -> PlotResult<PathBuf> {
        if frame_ids.is_empty() {
            return Err(PlotError::validation("no frames to assemble"));
        }
        // All ids must resolve before any extraction or encoding happens.
        let resolved: Vec<ResolvedFrame> = frame_ids
            .iter()
            .map(|id| self.catalog.resolve_frame(*id))
            .collect::<PlotResult<_>>()?;

        let extractor = Extractor::new(self.config, self.cache, self.runner);
        let mut extracted = HashSet::new();
        for frame in &resolved {
            if extracted.insert(frame.container_id) {
                extractor.extract_all(self.catalog, frame.container_id)?;
            }
        }

        let staging = TempDirGuard::create(self.cache.unique_dir("frames"))?;
        for (i, frame) in resolved.iter().enumerate() {
            let src = self.cache.frame_image(&frame.video_name, frame.index);
            let dst = staging.path().join(frame_file_name(i as u32));
            // Cached frame images stay in place; stage a copy.
            std::fs::copy(&src, &dst).with_context(|| {
                format!("failed to stage '{}' as '{}'", src.display(), dst.display())
            })?;
        }
        self.encode_staged(staging.path())
    }

    /// Invokes the external encoder on a staged `%04d.jpg` sequence.
    fn encode_staged(&self, staging: &Path) -> PlotResult<PathBuf> {
        let out = self.cache.unique_artifact("video", "mp4");
        let input_path = staging.join("%04d.jpg").to_string_lossy().into_owned();
        let output_path = out.to_string_lossy().into_owned();
        let cmd = fill_template(
            &self.config.encode_cmd,
            &[
                ("input_path", input_path.as_str()),
                ("output_path", output_path.as_str()),
            ],
        )?;
        tracing::info!(out = %out.display(), "encoding assembled video");
        self.runner.run(&cmd)?;
        Ok(out)
    }
}

fn move_file(src: &Path, dst: &Path) -> PlotResult<()> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    // Rename fails across filesystems; fall back to copy + remove.
    std::fs::copy(src, dst)
        .with_context(|| format!("failed to move '{}' to '{}'", src.display(), dst.display()))?;
    std::fs::remove_file(src)
        .with_context(|| format!("failed to remove '{}'", src.display()))?;
    Ok(())
}
