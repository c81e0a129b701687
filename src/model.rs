use std::path::PathBuf;

use crate::error::{PlotError, PlotResult};

/// A registered source video. Immutable once registered; owned by the catalog.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Video {
    pub name: String,
    pub path: PathBuf,
}

/// Logical grouping of all frames belonging to one source video.
///
/// A container is identified independently of the video file; `data_path`
/// points at the binary metadata file the container was imported from.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FrameContainer {
    pub id: u64,
    pub data_path: PathBuf,
    pub video_name: String,
}

/// A single catalog frame record. Read-only from the pipeline's perspective.
///
/// `index` is the frame's zero-based position within its container's own
/// numbering; contiguous there, but not necessarily contiguous in any
/// caller-supplied subset.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Frame {
    pub id: u64,
    pub container_id: u64,
    pub index: u32,
}

/// A frame joined with its container and video, as handed out by the catalog.
#[derive(Clone, Debug)]
pub struct ResolvedFrame {
    pub frame_id: u64,
    pub index: u32,
    pub container_id: u64,
    pub video_name: String,
    pub video_path: PathBuf,
}

/// A container joined with its video, as handed out by the catalog.
#[derive(Clone, Debug)]
pub struct ResolvedContainer {
    pub container_id: u64,
    pub video_name: String,
    pub video_path: PathBuf,
}

/// One entry of a plot request: a frame plus optional overlay data.
///
/// When the coordinate lists are present they must all have the same length;
/// when absent the frame is rendered unmodified.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameDescriptor {
    pub frame_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rot: Option<Vec<f64>>,
}

impl FrameDescriptor {
    /// A descriptor with no overlay data; renders as the unmodified frame.
    pub fn plain(frame_id: u64) -> Self {
        Self {
            frame_id,
            x: None,
            y: None,
            rot: None,
        }
    }

    pub fn with_overlay(frame_id: u64, x: Vec<f64>, y: Vec<f64>, rot: Vec<f64>) -> Self {
        Self {
            frame_id,
            x: Some(x),
            y: Some(y),
            rot: Some(rot),
        }
    }

    pub fn has_overlay(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    /// Checks the equal-cardinality invariant before any work is started.
    pub fn validate(&self) -> PlotResult<()> {
        let x_len = self.x.as_ref().map(Vec::len);
        let y_len = self.y.as_ref().map(Vec::len);
        let rot_len = self.rot.as_ref().map(Vec::len);
        match (x_len, y_len) {
            (None, None) => Ok(()),
            (Some(xl), Some(yl)) => {
                let rl = rot_len.unwrap_or(0);
                if xl != yl || xl != rl {
                    return Err(PlotError::validation(format!(
                        "frame {}: x, y and rot must have the same length (got {xl}, {yl}, {rl})",
                        self.frame_id
                    )));
                }
                Ok(())
            }
            _ => Err(PlotError::validation(format!(
                "frame {}: x and y must be given together",
                self.frame_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_descriptor_validates() {
        assert!(FrameDescriptor::plain(1).validate().is_ok());
    }

    #[test]
    fn equal_lengths_validate() {
        let d = FrameDescriptor::with_overlay(1, vec![1.0, 2.0], vec![3.0, 4.0], vec![0.0, 0.5]);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let d = FrameDescriptor::with_overlay(1, vec![1.0, 2.0], vec![3.0], vec![0.0, 0.5]);
        assert!(matches!(d.validate(), Err(PlotError::Validation(_))));

        let d = FrameDescriptor::with_overlay(1, vec![1.0], vec![3.0], vec![]);
        assert!(matches!(d.validate(), Err(PlotError::Validation(_))));
    }

    #[test]
    fn lone_x_is_rejected() {
        let d = FrameDescriptor {
            frame_id: 1,
            x: Some(vec![1.0]),
            y: None,
            rot: None,
        };
        assert!(matches!(d.validate(), Err(PlotError::Validation(_))));
    }
}
