use std::path::PathBuf;

use crate::error::{PlotError, PlotResult};

/// Pipeline configuration: plot geometry, worker-pool size, working
/// directory and the external decoder/encoder command templates.
///
/// Command templates are expanded with `{placeholder}` substitution, see
/// [`crate::command::fill_template`]. Recognized placeholders:
///
/// - `extract_single_cmd`: `{video_path}`, `{frame_index}`, `{output_path}`
/// - `extract_all_cmd`: `{video_path}`, `{output_path}` (a directory; the
///   decoder writes zero-padded `%04d.jpg` frames into it)
/// - `encode_cmd`: `{input_path}` (an `%04d.jpg` pattern), `{output_path}`
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Frame-to-plot coordinate multiplier.
    pub scale: f64,
    /// Plot canvas width in source-video pixels.
    pub width: u32,
    /// Plot canvas height in source-video pixels.
    pub height: u32,
    /// Worker-pool size for parallel overlay rendering.
    pub threads: usize,
    /// Root directory for extracted frames and produced artifacts.
    pub work_dir: PathBuf,
    pub extract_single_cmd: String,
    pub extract_all_cmd: String,
    pub encode_cmd: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            scale: 0.5,
            width: 4000,
            height: 3000,
            threads: 4,
            work_dir: std::env::temp_dir().join("trackplot"),
            extract_single_cmd: concat!(
                "ffmpeg -v 24 -y -i {video_path} ",
                r#"-vf "select=gte(n\,{frame_index})" -vframes 1 {output_path}"#
            )
            .to_string(),
            extract_all_cmd: "ffmpeg -v 24 -y -i {video_path} -start_number 0 {output_path}/%04d.jpg"
                .to_string(),
            encode_cmd: concat!(
                "ffmpeg -v 24 -y -framerate 3 -i {input_path} ",
                "-c:v h264 -crf 28 -pix_fmt yuv420p {output_path}"
            )
            .to_string(),
        }
    }
}

impl PlotConfig {
    pub fn validate(&self) -> PlotResult<()> {
        if !(self.scale > 0.0) {
            return Err(PlotError::validation("scale must be positive"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(PlotError::validation("width/height must be non-zero"));
        }
        if self.threads == 0 {
            return Err(PlotError::validation("threads must be >= 1"));
        }
        for (name, tpl) in [
            ("extract_single_cmd", &self.extract_single_cmd),
            ("extract_all_cmd", &self.extract_all_cmd),
            ("encode_cmd", &self.encode_cmd),
        ] {
            if tpl.trim().is_empty() {
                return Err(PlotError::validation(format!("{name} must be non-empty")));
            }
        }
        Ok(())
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}
