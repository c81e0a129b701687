//! Shared fixtures: unique temp dirs, a catalog with known containers, and
//! a fake decoder/encoder runner that materializes synthetic frame images.
#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Mutex,
};

use image::Rgb;
use trackplot::{
    CommandRunner, Frame, FrameContainer, MemoryCatalog, PlotConfig, PlotError, PlotResult, Video,
};

pub fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "trackplot_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

/// Config whose command templates are understood by [`FakeRunner`].
pub fn fake_config(work_dir: &Path) -> PlotConfig {
    PlotConfig {
        scale: 1.0,
        width: 64,
        height: 64,
        threads: 4,
        work_dir: work_dir.to_path_buf(),
        extract_single_cmd: "extract-single {video_path} {frame_index} {output_path}".to_string(),
        extract_all_cmd: "extract-all {video_path} {output_path}".to_string(),
        encode_cmd: "encode {input_path} {output_path}".to_string(),
    }
}

/// Two videos/containers; container 1 holds indices 10..=13 (ids 100..=103),
/// container 2 holds indices 11..=12 (ids 201..=202).
pub fn sample_catalog() -> MemoryCatalog {
    let mut cat = MemoryCatalog::new();
    cat.add_video(Video {
        name: "cam0".to_string(),
        path: PathBuf::from("/videos/cam0.mp4"),
    });
    cat.add_video(Video {
        name: "cam1".to_string(),
        path: PathBuf::from("/videos/cam1.mp4"),
    });
    cat.add_container(FrameContainer {
        id: 1,
        data_path: PathBuf::from("/meta/cam0.bin"),
        video_name: "cam0".to_string(),
    });
    cat.add_container(FrameContainer {
        id: 2,
        data_path: PathBuf::from("/meta/cam1.bin"),
        video_name: "cam1".to_string(),
    });
    for (id, index) in [(100, 10), (101, 11), (102, 12), (103, 13)] {
        cat.add_frame(Frame {
            id,
            container_id: 1,
            index,
        });
    }
    for (id, index) in [(201, 11), (202, 12)] {
        cat.add_frame(Frame {
            id,
            container_id: 2,
            index,
        });
    }
    cat
}

/// Flat fill color identifying a frame index; spaced widely enough to
/// survive one JPEG round trip.
pub fn color_for(index: u32) -> Rgb<u8> {
    Rgb([((index % 8) * 32) as u8, 100, 50])
}

pub fn index_from_red(red: u8) -> u32 {
    ((red as f32) / 32.0).round() as u32 % 8
}

#[derive(Default)]
pub struct FakeRunner {
    /// video path -> frame indices the fake decoder produces for it.
    videos: HashMap<String, Vec<u32>>,
    counts: Mutex<HashMap<String, usize>>,
    /// One entry per encode call: the staged frame sequence, decoded back
    /// to frame indices via their fill color.
    encoded: Mutex<Vec<Vec<u32>>>,
    fail_verbs: HashSet<String>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(mut self, video_path: &str, indices: &[u32]) -> Self {
        self.videos.insert(video_path.to_string(), indices.to_vec());
        self
    }

    pub fn failing(mut self, verb: &str) -> Self {
        self.fail_verbs.insert(verb.to_string());
        self
    }

    pub fn count(&self, verb: &str) -> usize {
        self.counts
            .lock()
            .unwrap()
            .get(verb)
            .copied()
            .unwrap_or(0)
    }

    pub fn encoded(&self) -> Vec<Vec<u32>> {
        self.encoded.lock().unwrap().clone()
    }

    fn write_frame(path: &Path, index: u32) -> PlotResult<()> {
        let img = image::RgbImage::from_pixel(8, 8, color_for(index));
        img.save(path)
            .map_err(|e| PlotError::process(format!("fake decoder write failed: {e}")))?;
        Ok(())
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, cmd: &str) -> PlotResult<()> {
        let parts: Vec<&str> = cmd.split_whitespace().collect();
        let verb = parts.first().copied().unwrap_or_default();
        *self
            .counts
            .lock()
            .unwrap()
            .entry(verb.to_string())
            .or_insert(0) += 1;
        if self.fail_verbs.contains(verb) {
            return Err(PlotError::process(format!("fake failure for '{verb}'")));
        }

        match verb {
            "extract-single" => {
                let &[_, _video, index, output] = parts.as_slice() else {
                    return Err(PlotError::process(format!("bad fake command '{cmd}'")));
                };
                let index: u32 = index
                    .parse()
                    .map_err(|_| PlotError::process(format!("bad index in '{cmd}'")))?;
                Self::write_frame(Path::new(output), index)
            }
            "extract-all" => {
                let &[_, video, dir] = parts.as_slice() else {
                    return Err(PlotError::process(format!("bad fake command '{cmd}'")));
                };
                let indices = self.videos.get(video).ok_or_else(|| {
                    PlotError::process(format!("fake decoder knows no video '{video}'"))
                })?;
                for &index in indices {
                    Self::write_frame(&Path::new(dir).join(format!("{index:04}.jpg")), index)?;
                }
                Ok(())
            }
            "encode" => {
                let &[_, pattern, output] = parts.as_slice() else {
                    return Err(PlotError::process(format!("bad fake command '{cmd}'")));
                };
                let staging = Path::new(pattern)
                    .parent()
                    .ok_or_else(|| PlotError::process("encode pattern has no parent"))?;
                let mut sequence = Vec::new();
                for i in 0u32.. {
                    let frame = staging.join(format!("{i:04}.jpg"));
                    if !frame.exists() {
                        break;
                    }
                    let img = image::open(&frame)
                        .map_err(|e| PlotError::process(format!("fake encoder read failed: {e}")))?
                        .to_rgb8();
                    sequence.push(index_from_red(img.get_pixel(4, 4)[0]));
                }
                self.encoded.lock().unwrap().push(sequence);
                std::fs::write(output, b"fake-video")
                    .map_err(|e| PlotError::process(format!("fake encoder write failed: {e}")))?;
                Ok(())
            }
            _ => Err(PlotError::process(format!("unknown fake command '{cmd}'"))),
        }
    }
}
