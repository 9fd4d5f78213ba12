//! Windowed list computation
//!
//! Given fixed item sizes, a viewport and a scroll offset, works out which
//! items need rendering. Inputs are sanitized rather than rejected:
//! negative, NaN and infinite values count as zero.
//!
//! [`WindowTracker`] runs the computation on a tokio task and coalesces
//! bursts of scroll/resize updates into one recomputation per debounce
//! window.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Items rendered beyond each edge of the viewport
pub const DEFAULT_OVERSCAN: usize = 5;
/// Overscan for grids (rows and columns)
pub const DEFAULT_GRID_OVERSCAN: usize = 2;
/// About one frame at 60 Hz
pub const DEFAULT_SCROLL_DEBOUNCE: Duration = Duration::from_millis(16);

fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// Scroll alignment for [`VirtualWindow::scroll_to_item`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    Start,
    Center,
    End,
    /// Scroll the minimum distance; `None` when already fully visible
    #[default]
    Auto,
}

/// Inputs of a window computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowParams {
    /// Height (or width, horizontally) of every item
    pub item_size: f64,
    pub item_count: usize,
    pub viewport_size: f64,
    pub scroll_offset: f64,
    pub overscan: usize,
    pub orientation: Orientation,
}

impl WindowParams {
    pub fn new(item_size: f64, item_count: usize, viewport_size: f64) -> Self {
        Self {
            item_size,
            item_count,
            viewport_size,
            scroll_offset: 0.0,
            overscan: DEFAULT_OVERSCAN,
            orientation: Orientation::Vertical,
        }
    }

    pub fn with_scroll_offset(mut self, offset: f64) -> Self {
        self.scroll_offset = offset;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn horizontal(mut self) -> Self {
        self.orientation = Orientation::Horizontal;
        self
    }

    fn sanitized(self) -> Self {
        Self {
            item_size: sanitize(self.item_size),
            viewport_size: sanitize(self.viewport_size),
            scroll_offset: sanitize(self.scroll_offset),
            ..self
        }
    }
}

/// One item of the window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualItem {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub size: f64,
    pub is_visible: bool,
}

/// Inclusive index range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRange {
    pub start_index: usize,
    pub end_index: usize,
}

impl WindowRange {
    /// Number of indices; never zero
    pub fn count(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start_index..=self.end_index).contains(&index)
    }
}

/// Result of a window computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualWindow {
    params: WindowParams,
    range: Option<WindowRange>,
    first_visible: usize,
    last_visible: usize,
}

impl VirtualWindow {
    pub fn compute(params: WindowParams) -> Self {
        let params = params.sanitized();
        let size = params.item_size;
        if params.item_count == 0 || size == 0.0 {
            return Self {
                params,
                range: None,
                first_visible: 0,
                last_visible: 0,
            };
        }

        let first_visible = (params.scroll_offset / size).floor() as usize;
        let last_visible = ((params.scroll_offset + params.viewport_size) / size).floor() as usize;
        let visible_count = (params.viewport_size / size).ceil() as usize;

        let start_index = first_visible.saturating_sub(params.overscan);
        let end_index = (params.item_count - 1)
            .min(first_visible.saturating_add(visible_count).saturating_add(params.overscan));

        let range = (start_index <= end_index).then_some(WindowRange {
            start_index,
            end_index,
        });
        Self {
            params,
            range,
            first_visible,
            last_visible,
        }
    }

    pub fn params(&self) -> &WindowParams {
        &self.params
    }

    /// `None` when nothing needs rendering
    pub fn range(&self) -> Option<WindowRange> {
        self.range
    }

    pub fn total_size(&self) -> f64 {
        self.params.item_count as f64 * self.params.item_size
    }

    /// Lazily yields the items of the window
    pub fn items(&self) -> VirtualItems {
        let (next, last) = match self.range {
            Some(r) => (r.start_index, r.end_index + 1),
            None => (0, 0),
        };
        VirtualItems {
            next,
            end: last,
            size: self.params.item_size,
            first_visible: self.first_visible,
            last_visible: self.last_visible,
        }
    }

    /// Items intersecting the viewport, clamped to the item count
    pub fn visible_range(&self) -> Option<WindowRange> {
        self.range?;
        let end_index = self.last_visible.min(self.params.item_count.checked_sub(1)?);
        (self.first_visible <= end_index).then_some(WindowRange {
            start_index: self.first_visible,
            end_index,
        })
    }

    pub fn is_item_visible(&self, index: usize) -> bool {
        self.range.is_some()
            && index < self.params.item_count
            && (self.first_visible..=self.last_visible).contains(&index)
    }

    /// Start offset of `index`; `None` when out of range
    pub fn item_offset(&self, index: usize) -> Option<f64> {
        (index < self.params.item_count).then(|| index as f64 * self.params.item_size)
    }

    /// Clamp an offset to `[0, total_size - viewport]`
    pub fn clamp_offset(&self, offset: f64) -> f64 {
        let max = (self.total_size() - self.params.viewport_size).max(0.0);
        sanitize(offset).min(max)
    }

    /// Alias for [`clamp_offset`](Self::clamp_offset) matching the scroll API
    pub fn scroll_to_offset(&self, offset: f64) -> f64 {
        self.clamp_offset(offset)
    }

    /// Offset to scroll to so that `index` is aligned; `None` when the
    /// index is out of range or, under [`Align::Auto`], already visible.
    pub fn scroll_to_item(&self, index: usize, align: Align) -> Option<f64> {
        let item_start = self.item_offset(index)?;
        let size = self.params.item_size;
        let viewport = self.params.viewport_size;
        let target = match align {
            Align::Start => item_start,
            Align::Center => item_start - viewport / 2.0 + size / 2.0,
            Align::End => item_start - viewport + size,
            Align::Auto => {
                let current_start = self.params.scroll_offset;
                let current_end = current_start + viewport;
                if item_start < current_start {
                    item_start
                } else if item_start + size > current_end {
                    item_start + size - viewport
                } else {
                    return None;
                }
            }
        };
        Some(self.clamp_offset(target))
    }
}

/// Iterator over the items of a [`VirtualWindow`]
#[derive(Debug, Clone)]
pub struct VirtualItems {
    next: usize,
    end: usize,
    size: f64,
    first_visible: usize,
    last_visible: usize,
}

impl Iterator for VirtualItems {
    type Item = VirtualItem;

    fn next(&mut self) -> Option<VirtualItem> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next;
        self.next += 1;
        let start = index as f64 * self.size;
        Some(VirtualItem {
            index,
            start,
            end: start + self.size,
            size: self.size,
            is_visible: index >= self.first_visible && index <= self.last_visible,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end.saturating_sub(self.next);
        (n, Some(n))
    }
}

impl ExactSizeIterator for VirtualItems {}

/// Two-dimensional window: rows by columns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualGrid {
    pub rows: VirtualWindow,
    pub columns: VirtualWindow,
}

/// One cell of a [`VirtualGrid`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualCell {
    pub row: VirtualItem,
    pub column: VirtualItem,
}

impl VirtualGrid {
    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        row_height: f64,
        row_count: usize,
        column_width: f64,
        column_count: usize,
        viewport_width: f64,
        viewport_height: f64,
        scroll_top: f64,
        scroll_left: f64,
    ) -> Self {
        let rows = WindowParams::new(row_height, row_count, viewport_height)
            .with_scroll_offset(scroll_top)
            .with_overscan(DEFAULT_GRID_OVERSCAN);
        let columns = WindowParams::new(column_width, column_count, viewport_width)
            .with_scroll_offset(scroll_left)
            .with_overscan(DEFAULT_GRID_OVERSCAN)
            .horizontal();
        Self {
            rows: VirtualWindow::compute(rows),
            columns: VirtualWindow::compute(columns),
        }
    }

    /// Row-major cells of the window
    pub fn cells(&self) -> impl Iterator<Item = VirtualCell> + '_ {
        self.rows.items().flat_map(move |row| {
            self.columns
                .items()
                .map(move |column| VirtualCell { row, column })
        })
    }

    pub fn total_width(&self) -> f64 {
        self.columns.total_size()
    }

    pub fn total_height(&self) -> f64 {
        self.rows.total_size()
    }
}

/// Change fed into a [`WindowTracker`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowUpdate {
    ScrollOffset(f64),
    ItemCount(usize),
    ViewportSize(f64),
    ItemSize(f64),
}

impl WindowUpdate {
    fn apply(self, params: &mut WindowParams) {
        match self {
            WindowUpdate::ScrollOffset(v) => params.scroll_offset = v,
            WindowUpdate::ItemCount(v) => params.item_count = v,
            WindowUpdate::ViewportSize(v) => params.viewport_size = v,
            WindowUpdate::ItemSize(v) => params.item_size = v,
        }
    }
}

/// Background recomputation of a [`VirtualWindow`]
///
/// Updates arriving within `debounce` of the first one in a burst are
/// folded into a single recomputation, published on a `watch` channel.
pub struct WindowTracker {
    updates: mpsc::UnboundedSender<WindowUpdate>,
    window: watch::Receiver<VirtualWindow>,
    recomputations: Arc<AtomicU64>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl WindowTracker {
    /// Spawn the tracker on the current tokio runtime
    pub fn spawn(params: WindowParams, debounce: Duration) -> Self {
        let (updates, mut rx) = mpsc::unbounded_channel::<WindowUpdate>();
        let (tx, window) = watch::channel(VirtualWindow::compute(params));
        let recomputations = Arc::new(AtomicU64::new(0));
        let cancel = CancellationToken::new();

        let counter = recomputations.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut current = params;
            loop {
                let first = tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Some(update) => update,
                        None => break,
                    },
                };
                first.apply(&mut current);

                let deadline = Instant::now() + debounce;
                let mut closed = false;
                loop {
                    tokio::select! {
                        _ = sleep_until(deadline) => break,
                        _ = token.cancelled() => return,
                        msg = rx.recv() => match msg {
                            Some(update) => update.apply(&mut current),
                            None => {
                                closed = true;
                                break;
                            }
                        },
                    }
                }

                counter.fetch_add(1, Ordering::SeqCst);
                tx.send_replace(VirtualWindow::compute(current));
                if closed {
                    break;
                }
            }
            tracing::trace!("Window tracker stopped");
        });

        Self {
            updates,
            window,
            recomputations,
            cancel,
            handle: Some(handle),
        }
    }

    fn push(&self, update: WindowUpdate) {
        // Send only fails after shutdown, when updates no longer matter
        let _ = self.updates.send(update);
    }

    pub fn set_scroll_offset(&self, offset: f64) {
        self.push(WindowUpdate::ScrollOffset(offset));
    }

    pub fn set_item_count(&self, count: usize) {
        self.push(WindowUpdate::ItemCount(count));
    }

    pub fn set_viewport_size(&self, size: f64) {
        self.push(WindowUpdate::ViewportSize(size));
    }

    pub fn set_item_size(&self, size: f64) {
        self.push(WindowUpdate::ItemSize(size));
    }

    /// Latest published window
    pub fn current(&self) -> VirtualWindow {
        *self.window.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<VirtualWindow> {
        self.window.clone()
    }

    /// Number of recomputations performed so far
    pub fn recomputations(&self) -> u64 {
        self.recomputations.load(Ordering::SeqCst)
    }

    /// Stop the background task and wait for it to finish
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for WindowTracker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
