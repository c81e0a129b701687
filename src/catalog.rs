use std::collections::BTreeMap;

use crate::{
    error::{PlotError, PlotResult},
    model::{Frame, FrameContainer, ResolvedContainer, ResolvedFrame, Video},
};

/// Lookup service mapping frame identifiers to container and video locations.
///
/// The persistent catalog itself is an external collaborator; the pipeline
/// only consumes it through this trait. Implementations must fail with
/// [`PlotError::NotFound`] for unknown identifiers.
pub trait Catalog: Send + Sync {
    /// Resolve a frame id to its index, container and source video.
    fn resolve_frame(&self, frame_id: u64) -> PlotResult<ResolvedFrame>;

    /// Resolve a container id to its source video.
    fn resolve_container(&self, container_id: u64) -> PlotResult<ResolvedContainer>;

    /// All frame indices of a container, ascending.
    fn container_indices(&self, container_id: u64) -> PlotResult<Vec<u32>>;

    /// Frame ids of a container with `low < index < high`, ascending by index.
    fn frame_ids_between(&self, container_id: u64, low: u32, high: u32) -> PlotResult<Vec<u64>>;
}

/// In-memory catalog, loadable from a JSON manifest.
///
/// Stands in for the external catalog service in the CLI and in tests.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct MemoryCatalog {
    videos: BTreeMap<String, Video>,
    containers: BTreeMap<u64, FrameContainer>,
    frames: BTreeMap<u64, Frame>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_video(&mut self, video: Video) {
        self.videos.insert(video.name.clone(), video);
    }

    pub fn add_container(&mut self, container: FrameContainer) {
        self.containers.insert(container.id, container);
    }

    pub fn add_frame(&mut self, frame: Frame) {
        self.frames.insert(frame.id, frame);
    }

    fn container(&self, container_id: u64) -> PlotResult<&FrameContainer> {
        self.containers
            .get(&container_id)
            .ok_or_else(|| PlotError::not_found(format!("container {container_id}")))
    }
}

impl Catalog for MemoryCatalog {
    fn resolve_frame(&self, frame_id: u64) -> PlotResult<ResolvedFrame> {
        let frame = self
            .frames
            .get(&frame_id)
            .ok_or_else(|| PlotError::not_found(format!("frame {frame_id}")))?;
        let container = self.container(frame.container_id)?;
        let video = self
            .videos
            .get(&container.video_name)
            .ok_or_else(|| PlotError::not_found(format!("video '{}'", container.video_name)))?;

        Ok(ResolvedFrame {
            frame_id,
            index: frame.index,
            container_id: container.id,
            video_name: video.name.clone(),
            video_path: video.path.clone(),
        })
    }

    fn resolve_container(&self, container_id: u64) -> PlotResult<ResolvedContainer> {
        let container = self.container(container_id)?;
        let video = self
            .videos
            .get(&container.video_name)
            .ok_or_else(|| PlotError::not_found(format!("video '{}'", container.video_name)))?;
        Ok(ResolvedContainer {
            container_id,
            video_name: video.name.clone(),
            video_path: video.path.clone(),
        })
    }

    fn container_indices(&self, container_id: u64) -> PlotResult<Vec<u32>> {
        self.container(container_id)?;
        let mut indices: Vec<u32> = self
            .frames
            .values()
            .filter(|f| f.container_id == container_id)
            .map(|f| f.index)
            .collect();
        indices.sort_unstable();
        Ok(indices)
    }

    fn frame_ids_between(&self, container_id: u64, low: u32, high: u32) -> PlotResult<Vec<u64>> {
        self.container(container_id)?;
        let mut hits: Vec<&Frame> = self
            .frames
            .values()
            .filter(|f| f.container_id == container_id && f.index > low && f.index < high)
            .collect();
        hits.sort_unstable_by_key(|f| f.index);
        Ok(hits.iter().map(|f| f.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample() -> MemoryCatalog {
        let mut cat = MemoryCatalog::new();
        cat.add_video(Video {
            name: "cam0".to_string(),
            path: PathBuf::from("/videos/cam0.mp4"),
        });
        cat.add_container(FrameContainer {
            id: 1,
            data_path: PathBuf::from("/meta/cam0.bin"),
            video_name: "cam0".to_string(),
        });
        for (id, index) in [(100, 10), (101, 11), (102, 12), (103, 13)] {
            cat.add_frame(Frame {
                id,
                container_id: 1,
                index,
            });
        }
        cat
    }

    #[test]
    fn resolve_joins_container_and_video() {
        let cat = sample();
        let r = cat.resolve_frame(101).unwrap();
        assert_eq!(r.index, 11);
        assert_eq!(r.container_id, 1);
        assert_eq!(r.video_name, "cam0");
        assert_eq!(r.video_path, PathBuf::from("/videos/cam0.mp4"));
    }

    #[test]
    fn unknown_frame_is_not_found() {
        let cat = sample();
        assert!(matches!(
            cat.resolve_frame(999),
            Err(PlotError::NotFound(_))
        ));
    }

    #[test]
    fn frame_ids_between_is_exclusive_and_ordered() {
        let cat = sample();
        assert_eq!(cat.frame_ids_between(1, 10, 13).unwrap(), vec![101, 102]);
        assert_eq!(cat.frame_ids_between(1, 10, 11).unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn container_indices_are_sorted() {
        let cat = sample();
        assert_eq!(cat.container_indices(1).unwrap(), vec![10, 11, 12, 13]);
    }
}
