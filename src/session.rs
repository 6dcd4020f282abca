//! Runtime state around the layout engine.
//!
//! [`justify`](crate::layout::justify) is pure and needs every aspect ratio
//! up front. A gallery does not have them up front: ratios are read from
//! image headers as they become available, item sets are swapped while
//! reads are still running, and the container is resized in bursts. The
//! [`GallerySession`] owns all of that and hands the layout engine a
//! consistent snapshot.
//!
//! ## Resolution
//!
//! Unknown ratios are resolved on a dedicated rayon pool limited to
//! `layout.max_in_flight` threads. Each request is tagged with the session's
//! generation; replacing the item set bumps the generation and raises the
//! previous set's cancellation flag, so queued reads are skipped and late
//! results are dropped. A failed read resolves to `1.0` so the image still
//! gets a square slot.
//!
//! Resolved ratios are perturbed once (see
//! [`perturb_aspect_ratio`](crate::layout::perturb_aspect_ratio)) and cached
//! by source path for the life of the session.
//!
//! ## Recomputation
//!
//! Nothing is recomputed eagerly. [`GallerySession::tick`] drains finished
//! reads and the resize [`Debouncer`], and relayouts only when one of them
//! changed something. Time is passed in so the debounce is testable.

use crate::config::LayoutConfig;
use crate::imaging::{BackendError, ImageBackend, RustBackend};
use crate::layout::{JustifiedItem, LayoutParams, Row, RowGeometry, justify, perturb_aspect_ratio};
use crate::types::ImageItem;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Image read failed: {0}")]
    Backend(#[from] BackendError),
    #[error("Image has no usable dimensions: {0}")]
    Degenerate(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to start resolver pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Where aspect ratios come from.
pub trait AspectSource: Send + Sync {
    /// Natural width / height of `item`.
    fn aspect_ratio(&self, item: &ImageItem) -> Result<f64, ResolveError>;
}

/// Reads ratios from image headers below a project root.
pub struct BackendAspectSource<B = RustBackend> {
    root: PathBuf,
    backend: B,
}

impl BackendAspectSource<RustBackend> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_backend(root, RustBackend::new())
    }
}

impl<B: ImageBackend + Send> BackendAspectSource<B> {
    pub fn with_backend(root: impl Into<PathBuf>, backend: B) -> Self {
        Self {
            root: root.into(),
            backend,
        }
    }
}

impl<B: ImageBackend + Send> AspectSource for BackendAspectSource<B> {
    fn aspect_ratio(&self, item: &ImageItem) -> Result<f64, ResolveError> {
        let dims = self.backend.identify(&self.root.join(&item.source_path))?;
        dims.aspect_ratio()
            .ok_or_else(|| ResolveError::Degenerate(item.source_path.clone()))
    }
}

/// A finished read, tagged with the generation that requested it.
#[derive(Debug)]
pub struct Resolution {
    pub generation: u64,
    pub source_path: String,
    pub result: Result<f64, ResolveError>,
}

/// Coalesces bursts of values: only the last one is released, once nothing
/// new has arrived for the quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let ready = matches!(
            &self.pending,
            Some((_, at)) if now.saturating_duration_since(*at) >= self.quiet
        );
        if ready {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Item set, resolved ratios, and the current layout for one gallery view.
pub struct GallerySession {
    config: LayoutConfig,
    source: Arc<dyn AspectSource>,
    pool: rayon::ThreadPool,
    tx: Sender<Resolution>,
    rx: Receiver<Resolution>,
    generation: u64,
    cancel: Arc<AtomicBool>,
    items: Vec<ImageItem>,
    ratios: HashMap<String, f64>,
    pending: HashSet<String>,
    resize: Debouncer<f64>,
    container_width: f64,
    placed: Vec<JustifiedItem>,
    rows: Vec<Row>,
    geometry: RowGeometry,
    dirty: bool,
}

impl GallerySession {
    pub fn new(
        config: LayoutConfig,
        source: Arc<dyn AspectSource>,
        container_width: f64,
    ) -> Result<Self, SessionError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_in_flight.max(1))
            .thread_name(|i| format!("folio-resolve-{i}"))
            .build()?;
        let (tx, rx) = mpsc::channel();
        let resize = Debouncer::new(Duration::from_millis(config.resize_debounce_ms));
        Ok(Self {
            config,
            source,
            pool,
            tx,
            rx,
            generation: 0,
            cancel: Arc::new(AtomicBool::new(false)),
            items: Vec::new(),
            ratios: HashMap::new(),
            pending: HashSet::new(),
            resize,
            container_width,
            placed: Vec::new(),
            rows: Vec::new(),
            geometry: RowGeometry::new(&[], 0.0),
            dirty: false,
        })
    }

    /// Replace the item set. In-flight reads for the previous set are
    /// cancelled; ratios already cached are reused.
    pub fn set_items(&mut self, items: Vec<ImageItem>) {
        self.cancel.store(true, Ordering::Relaxed);
        self.cancel = Arc::new(AtomicBool::new(false));
        self.generation += 1;
        self.pending.clear();

        for item in &items {
            if self.ratios.contains_key(&item.source_path)
                || !self.pending.insert(item.source_path.clone())
            {
                continue;
            }
            let generation = self.generation;
            let cancel = Arc::clone(&self.cancel);
            let source = Arc::clone(&self.source);
            let tx = self.tx.clone();
            let item = item.clone();
            self.pool.spawn(move || {
                if cancel.load(Ordering::Relaxed) {
                    return;
                }
                let result = source.aspect_ratio(&item);
                tx.send(Resolution {
                    generation,
                    source_path: item.source_path,
                    result,
                })
                .ok();
            });
        }
        log::debug!(
            "generation {}: {} items, {} to resolve",
            self.generation,
            items.len(),
            self.pending.len()
        );

        self.items = items;
        self.dirty = true;
    }

    /// Record a finished read. Returns `false` when it belongs to an older
    /// generation and was dropped.
    pub fn apply(&mut self, resolution: Resolution) -> bool {
        if resolution.generation != self.generation {
            return false;
        }
        if !self.pending.remove(&resolution.source_path) {
            return false;
        }
        let ratio = match resolution.result {
            Ok(r) if r.is_finite() && r > 0.0 => {
                perturb_aspect_ratio(&resolution.source_path, r, self.config.aspect_jitter)
            }
            Ok(r) => {
                log::warn!("{}: invalid aspect ratio {r}", resolution.source_path);
                1.0
            }
            Err(e) => {
                log::warn!("{}: {e}", resolution.source_path);
                1.0
            }
        };
        self.ratios.insert(resolution.source_path, ratio);
        self.dirty = true;
        true
    }

    /// Request a new container width. Takes effect on the first [`tick`]
    /// after the debounce period.
    ///
    /// [`tick`]: Self::tick
    pub fn resize(&mut self, width: f64, now: Instant) {
        self.resize.push(width, now);
    }

    /// Drain finished reads and the resize debouncer. Returns `true` when
    /// the layout was recomputed.
    pub fn tick(&mut self, now: Instant) -> bool {
        while let Ok(resolution) = self.rx.try_recv() {
            self.apply(resolution);
        }
        if let Some(width) = self.resize.poll(now)
            && width != self.container_width
        {
            self.container_width = width;
            self.dirty = true;
        }
        self.relayout_if_dirty()
    }

    /// Block until every read for the current item set has arrived, or
    /// `timeout` passes. Returns `false` on timeout.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(resolution) => {
                    self.apply(resolution);
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.relayout_if_dirty();
                    return false;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    unreachable!("session holds a sender")
                }
            }
        }
        self.relayout_if_dirty();
        true
    }

    /// Stop waiting for reads still in flight. Their items fall back to a
    /// `1.0` ratio, like a failed read, and the layout is recomputed.
    pub fn fail_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        self.cancel.store(true, Ordering::Relaxed);
        for path in self.pending.drain() {
            log::warn!("{path}: aspect ratio not read in time, using 1.0");
            self.ratios.insert(path, 1.0);
        }
        self.dirty = true;
        self.relayout_if_dirty();
    }

    fn relayout_if_dirty(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.placed = self
            .items
            .iter()
            .filter_map(|item| {
                self.ratios
                    .get(&item.source_path)
                    .map(|&aspect_ratio| JustifiedItem {
                        item: item.clone(),
                        aspect_ratio,
                    })
            })
            .collect();
        let params = LayoutParams::from_config(&self.config, self.container_width);
        self.rows = justify(&self.placed, &params);
        self.geometry = RowGeometry::new(&self.rows, self.config.gap);
        self.dirty = false;
        true
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn items(&self) -> &[ImageItem] {
        &self.items
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn container_width(&self) -> f64 {
        self.container_width
    }

    /// Cached (perturbed) ratio for a source path.
    pub fn aspect_ratio(&self, source_path: &str) -> Option<f64> {
        self.ratios.get(source_path).copied()
    }

    /// Items in the current layout; [`Row`] indices point into this.
    pub fn placed(&self) -> &[JustifiedItem] {
        &self.placed
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn geometry(&self) -> &RowGeometry {
        &self.geometry
    }

    /// Rows to materialize for a viewport, with the configured buffer.
    pub fn visible_rows(&self, scroll_top: f64, viewport_height: f64) -> Range<usize> {
        self.geometry
            .visible_rows(scroll_top, viewport_height, self.config.viewport_buffer)
    }
}

/// Resolve every item's ratio in one batch and return them in input order.
///
/// Items still unresolved after `timeout` get a `1.0` ratio.
pub fn resolve_items(
    config: &LayoutConfig,
    source: Arc<dyn AspectSource>,
    items: Vec<ImageItem>,
    timeout: Duration,
) -> Result<Vec<JustifiedItem>, SessionError> {
    let mut session = GallerySession::new(config.clone(), source, config.reference_width)?;
    session.set_items(items);
    if !session.wait(timeout) {
        log::warn!(
            "{} image(s) still unresolved after {:?}",
            session.pending_count(),
            timeout
        );
        session.fail_pending();
    }
    Ok(session.placed().to_vec())
}
