use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::Context as _;

use crate::error::PlotResult;

/// Path-addressed store of extracted frames and produced artifacts.
///
/// Keys are structured (video name + frame index, or a unique request-scoped
/// token), not free-form paths, so single-flight coordination could be added
/// per key later without touching call sites. Existence of the file at the
/// derived path is the cache-hit criterion; a `materialize` call from a
/// single caller is check-then-produce, with no cross-caller serialization.
#[derive(Clone, Debug)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all extracted frames of one video.
    pub fn video_dir(&self, video_name: &str) -> PathBuf {
        self.root.join(video_name)
    }

    /// Cached image path for one frame of a video (`<video>/<index:04>.jpg`).
    pub fn frame_image(&self, video_name: &str, index: u32) -> PathBuf {
        self.video_dir(video_name).join(frame_file_name(index))
    }

    /// A unique, request-scoped artifact path under the store root.
    pub fn unique_artifact(&self, prefix: &str, ext: &str) -> PathBuf {
        self.root.join(format!("{prefix}-{}.{ext}", unique_token()))
    }

    /// A unique, request-scoped scratch directory path (not yet created).
    pub fn unique_dir(&self, prefix: &str) -> PathBuf {
        self.root.join(format!("{prefix}-{}", unique_token()))
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// Returns `path` if it already exists, otherwise runs `producer` and
    /// verifies the artifact was created. Parent directories are created
    /// first. Never overwrites an existing artifact.
    pub fn materialize(
        &self,
        path: &Path,
        producer: impl FnOnce(&Path) -> PlotResult<()>,
    ) -> PlotResult<PathBuf> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "cache hit");
            return Ok(path.to_path_buf());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create '{}'", parent.display()))?;
        }
        producer(path)?;
        if !path.exists() {
            return Err(crate::error::PlotError::process(format!(
                "producer did not create expected artifact '{}'",
                path.display()
            )));
        }
        Ok(path.to_path_buf())
    }
}

/// Zero-padded frame file name used throughout the pipeline (`0042.jpg`).
pub fn frame_file_name(index: u32) -> String {
    format!("{index:04}.jpg")
}

/// Zero-padded frame file stem (`0042`), matching the decoder's output.
pub fn frame_file_stem(index: u32) -> String {
    format!("{index:04}")
}

fn unique_token() -> String {
    format!(
        "{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    )
}

/// 128-bit fingerprint of an operation name plus its canonicalized
/// arguments; the memoization key for the top-level plot operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub hi: u64,
    pub lo: u64,
}

/// Fingerprints `(op, args)` with a pair of seeded FNV-1a hashers.
///
/// JSON object keys are hashed in sorted order, so two argument encodings
/// that differ only in member ordering produce the same fingerprint.
pub fn fingerprint_args(op: &str, args: &serde_json::Value) -> Fingerprint {
    let mut a = Fnv1a64::new(0xcbf29ce484222325);
    let mut b = Fnv1a64::new(0x9ae16a3b2f90404f);
    write_str_pair(&mut a, &mut b, op);
    write_json_value_pair(&mut a, &mut b, args);
    Fingerprint {
        hi: a.finish(),
        lo: b.finish(),
    }
}

fn write_json_value_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, v: &serde_json::Value) {
    match v {
        serde_json::Value::Null => write_u8_pair(a, b, 0),
        serde_json::Value::Bool(x) => {
            write_u8_pair(a, b, 1);
            write_u8_pair(a, b, u8::from(*x));
        }
        serde_json::Value::Number(n) => {
            write_u8_pair(a, b, 2);
            write_str_pair(a, b, &n.to_string());
        }
        serde_json::Value::String(s) => {
            write_u8_pair(a, b, 3);
            write_str_pair(a, b, s);
        }
        serde_json::Value::Array(items) => {
            write_u8_pair(a, b, 4);
            write_u64_pair(a, b, items.len() as u64);
            for item in items {
                write_json_value_pair(a, b, item);
            }
        }
        serde_json::Value::Object(map) => {
            write_u8_pair(a, b, 5);
            let mut keys = map.keys().collect::<Vec<_>>();
            keys.sort();
            write_u64_pair(a, b, keys.len() as u64);
            for k in keys {
                write_str_pair(a, b, k);
                write_json_value_pair(a, b, &map[k]);
            }
        }
    }
}

fn write_u8_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, v: u8) {
    a.write_u8(v);
    b.write_u8(v);
}

fn write_u64_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, v: u64) {
    a.write_u64(v);
    b.write_u64(v);
}

fn write_str_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, s: &str) {
    write_u64_pair(a, b, s.len() as u64);
    a.write_bytes(s.as_bytes());
    b.write_bytes(s.as_bytes());
}

#[derive(Clone, Copy)]
struct Fnv1a64(u64);

impl Fnv1a64 {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        self.0 = h;
    }

    fn finish(self) -> u64 {
        self.0
    }
}

/// Process-lifetime memoization of top-level plot operations.
///
/// Unbounded and never evicted; a hit returns the recorded path without
/// re-validating that the artifact still exists on disk. The map lock is
/// held only around lookup and insert, so concurrent identical requests may
/// both compute (accepted race, same as first population of the file cache).
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<Fingerprint, PathBuf>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &self,
        key: Fingerprint,
        compute: impl FnOnce() -> PlotResult<PathBuf>,
    ) -> PlotResult<PathBuf> {
        if let Some(hit) = self
            .entries
            .lock()
            .expect("result cache lock poisoned")
            .get(&key)
        {
            tracing::debug!(?key, path = %hit.display(), "memoized result hit");
            return Ok(hit.clone());
        }
        let path = compute()?;
        self.entries
            .lock()
            .expect("result cache lock poisoned")
            .insert(key, path.clone());
        Ok(path)
    }
}
