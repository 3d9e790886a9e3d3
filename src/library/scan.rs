use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::Context;
use rayon::prelude::*;

use crate::{
    assets::{
        decode::{DecodeOptions, decode_overlay, is_supported_overlay},
        thumb::{DEFAULT_THUMB_SIZE, fit_thumbnail},
    },
    foundation::{
        core::RasterImage,
        error::{TokenError, TokenResult},
    },
    library::cancel::CancelToken,
};

/// Settings for [`scan_overlay_library`].
#[derive(Clone, Debug)]
pub struct ScanOptions {
    /// Maximum thumbnail width in pixels.
    pub thumb_size: u32,
    /// Worker threads; `None` lets rayon decide.
    pub threads: Option<usize>,
    /// How each overlay is decoded.
    pub decode: DecodeOptions,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            thumb_size: DEFAULT_THUMB_SIZE,
            threads: None,
            decode: DecodeOptions::default(),
        }
    }
}

/// One decoded overlay in the library.
#[derive(Clone, Debug)]
pub struct OverlayEntry {
    /// File the overlay was read from.
    pub path: PathBuf,
    /// Overlay pass scaled to the thumbnail width.
    pub thumbnail: RasterImage,
}

/// Directory node: subdirectories first, then overlays, each sorted by path.
#[derive(Clone, Debug, Default)]
pub struct OverlayTree {
    /// Directory this node describes.
    pub path: PathBuf,
    /// Subdirectories that contain at least one overlay.
    pub dirs: Vec<OverlayTree>,
    /// Overlays directly inside this directory.
    pub overlays: Vec<OverlayEntry>,
}

impl OverlayTree {
    /// Overlays in this node and all descendants.
    pub fn overlay_count(&self) -> usize {
        self.overlays.len() + self.dirs.iter().map(Self::overlay_count).sum::<usize>()
    }

    /// True when no overlay was found anywhere below this node.
    pub fn is_empty(&self) -> bool {
        self.overlay_count() == 0
    }

    /// Every overlay entry in display order: subdirectories depth-first, then this
    /// node's own overlays.
    pub fn entries(&self) -> Vec<&OverlayEntry> {
        let mut out = Vec::with_capacity(self.overlay_count());
        self.collect_entries(&mut out);
        out
    }

    fn collect_entries<'a>(&'a self, out: &mut Vec<&'a OverlayEntry>) {
        for d in &self.dirs {
            d.collect_entries(out);
        }
        out.extend(self.overlays.iter());
    }
}

/// Live counters, readable from another thread while a scan runs.
#[derive(Debug, Default)]
pub struct ScanProgress {
    total: AtomicUsize,
    loaded: AtomicUsize,
    skipped: AtomicUsize,
}

/// Snapshot of [`ScanProgress`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanCounts {
    /// Supported files discovered so far.
    pub total: usize,
    /// Files decoded successfully.
    pub loaded: usize,
    /// Files that failed to decode.
    pub skipped: usize,
}

impl ScanCounts {
    /// Fraction of discovered files that have been processed, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.loaded + self.skipped) as f64 / self.total as f64
    }
}

impl ScanProgress {
    /// Zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counts.
    pub fn snapshot(&self) -> ScanCounts {
        ScanCounts {
            total: self.total.load(Ordering::Relaxed),
            loaded: self.loaded.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Result of a library scan.
#[derive(Clone, Debug)]
pub struct ScanReport {
    /// Everything decoded before the scan finished or was cancelled.
    pub tree: OverlayTree,
    /// Final counters.
    pub counts: ScanCounts,
    /// True when the scan stopped because of the cancel token.
    pub cancelled: bool,
}

/// Walk `root` recursively, decoding every supported overlay into a thumbnail.
///
/// Overlays in one directory are decoded in parallel. Files that fail to decode are
/// logged and skipped. The cancel token is checked per directory entry and per asset; a
/// cancelled scan returns what it has so far.
pub fn scan_overlay_library(
    root: &Path,
    opts: &ScanOptions,
    cancel: &CancelToken,
) -> TokenResult<ScanReport> {
    scan_overlay_library_with_progress(root, opts, cancel, &ScanProgress::new())
}

/// [`scan_overlay_library`] reporting into caller-owned counters.
#[tracing::instrument(skip(opts, cancel, progress), fields(root = %root.display()))]
pub fn scan_overlay_library_with_progress(
    root: &Path,
    opts: &ScanOptions,
    cancel: &CancelToken,
    progress: &ScanProgress,
) -> TokenResult<ScanReport> {
    if opts.thumb_size == 0 {
        return Err(TokenError::validation("thumb_size must be >= 1"));
    }
    if !root.is_dir() {
        return Err(TokenError::validation(format!(
            "overlay library '{}' is not a directory",
            root.display()
        )));
    }

    let pool = build_thread_pool(opts.threads)?;
    let walker = Walker {
        opts,
        cancel,
        progress,
    };
    let tree = pool.install(|| walker.walk(root))?;

    let counts = progress.snapshot();
    let cancelled = cancel.is_cancelled();
    tracing::info!(
        total = counts.total,
        loaded = counts.loaded,
        skipped = counts.skipped,
        cancelled,
        "overlay library scanned"
    );
    Ok(ScanReport {
        tree,
        counts,
        cancelled,
    })
}

struct Walker<'a> {
    opts: &'a ScanOptions,
    cancel: &'a CancelToken,
    progress: &'a ScanProgress,
}

impl Walker<'_> {
    fn walk(&self, dir: &Path) -> TokenResult<OverlayTree> {
        let mut node = OverlayTree {
            path: dir.to_path_buf(),
            ..OverlayTree::default()
        };

        let listing = fs::read_dir(dir)
            .with_context(|| format!("list overlay directory '{}'", dir.display()))?;

        let mut subdirs = Vec::new();
        let mut files = Vec::new();
        for entry in listing {
            if self.cancel.is_cancelled() {
                return Ok(node);
            }
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!(dir = %dir.display(), error = %err, "unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if path.is_dir() {
                subdirs.push(path);
            } else if is_supported_overlay(&path) {
                files.push(path);
            }
        }
        subdirs.sort();
        files.sort();
        self.progress.total.fetch_add(files.len(), Ordering::Relaxed);

        for sub in subdirs {
            if self.cancel.is_cancelled() {
                return Ok(node);
            }
            match self.walk(&sub) {
                Ok(child) if !child.is_empty() => node.dirs.push(child),
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(dir = %sub.display(), error = %err, "skipping directory");
                }
            }
        }

        // `collect` into Vec keeps the sorted order.
        let decoded: Vec<Option<OverlayEntry>> =
            files.par_iter().map(|path| self.load(path)).collect();
        node.overlays = decoded.into_iter().flatten().collect();
        Ok(node)
    }

    fn load(&self, path: &Path) -> Option<OverlayEntry> {
        if self.cancel.is_cancelled() {
            return None;
        }
        match decode_overlay(path, &self.opts.decode) {
            Ok(asset) => {
                self.progress.loaded.fetch_add(1, Ordering::Relaxed);
                Some(OverlayEntry {
                    path: path.to_path_buf(),
                    thumbnail: fit_thumbnail(&asset.overlay, self.opts.thumb_size),
                })
            }
            Err(err) => {
                self.progress.skipped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(path = %path.display(), error = %err, "skipping overlay");
                None
            }
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> TokenResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(TokenError::validation(
            "library scan 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| TokenError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/library/scan.rs"]
mod tests;
