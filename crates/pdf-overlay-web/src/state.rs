use pdf_overlay_core::{
    AppConfig, BatchEdit, GesturePreview, NormPoint, OverlayFont, OverlayRenderer, ProjectSession,
    ProjectStore, RasterCache, Result, Selection, SelectionController, SelectionMode,
    TextSegment, Translator,
    config::SelectionConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Viewers idle for longer than this are dropped; the store keeps everything.
const VIEWER_MAX_IDLE: Duration = Duration::from_secs(3600);

/// Phase of a pointer event sent by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Leave,
}

/// Progress tracking for a background translation pass
#[derive(Default)]
pub struct PassJob {
    pub first: u32,
    pub last: u32,
    pub done: AtomicU32,
    finished: AtomicBool,
    completed: RwLock<Vec<u32>>,
    error: RwLock<Option<String>>,
}

/// Snapshot of a [`PassJob`] for clients
#[derive(Debug, Clone, Serialize)]
pub struct PassStatus {
    pub first: u32,
    pub last: u32,
    pub done: u32,
    pub finished: bool,
    pub completed: Vec<u32>,
    pub error: Option<String>,
}

impl PassJob {
    pub fn new(first: u32, last: u32) -> Self {
        Self {
            first,
            last,
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        !self.finished.load(Ordering::SeqCst)
    }

    pub async fn finish(&self, completed: Vec<u32>, error: Option<String>) {
        *self.completed.write().await = completed;
        *self.error.write().await = error;
        self.finished.store(true, Ordering::SeqCst);
    }

    pub async fn status(&self) -> PassStatus {
        PassStatus {
            first: self.first,
            last: self.last,
            done: self.done.load(Ordering::SeqCst),
            finished: !self.is_running(),
            completed: self.completed.read().await.clone(),
            error: self.error.read().await.clone(),
        }
    }
}

/// Gesture feedback as sent to clients
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GestureView {
    Marquee {
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
    },
    Anchor {
        x: f32,
        y: f32,
    },
}

impl From<GesturePreview> for GestureView {
    fn from(preview: GesturePreview) -> Self {
        match preview {
            GesturePreview::Marquee(r) => Self::Marquee {
                min_x: r.min_x,
                min_y: r.min_y,
                max_x: r.max_x,
                max_y: r.max_y,
            },
            GesturePreview::Anchor(p) => Self::Anchor { x: p.x, y: p.y },
        }
    }
}

/// Viewer state reported after every viewer or pointer request
#[derive(Debug, Clone, Serialize)]
pub struct ViewerView {
    pub project_id: Uuid,
    pub page: u32,
    pub page_count: u32,
    pub translated: bool,
    pub available: bool,
    pub segment_count: usize,
    pub mode: SelectionMode,
    pub show_original: bool,
    pub edit_mode: bool,
    pub selected: Vec<usize>,
    pub gesture: Option<GestureView>,
    pub batch_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Everything needed to draw one frame, copied out of the viewer lock
pub struct FrameJob {
    pub image_data: String,
    pub segments: Vec<TextSegment>,
    pub selected: BTreeSet<usize>,
    pub show_original: bool,
    pub edit_mode: bool,
    pub gesture: Option<GesturePreview>,
}

/// Interactive state of one project's viewer
pub struct ViewerSession {
    pub session: ProjectSession,
    pub page: u32,
    pub controller: SelectionController,
    pub selection: Selection,
    pub show_original: bool,
    pub edit_mode: bool,
    pub hover: Option<NormPoint>,
    pub batch: Option<BatchEdit>,
    pub pass: Option<Arc<PassJob>>,
    last_active: Instant,
}

impl ViewerSession {
    /// Opens on the first translated page, or page 1.
    pub fn new(session: ProjectSession, selection: SelectionConfig) -> Self {
        let page = session
            .translated_page_numbers()
            .first()
            .copied()
            .unwrap_or(1);
        let mut viewer = Self {
            session,
            page,
            controller: SelectionController::new(selection),
            selection: Selection::default(),
            show_original: false,
            edit_mode: false,
            hover: None,
            batch: None,
            pass: None,
            last_active: Instant::now(),
        };
        viewer.selection.activate_page(page);
        viewer
    }

    pub const fn page_count(&self) -> u32 {
        self.session.project().page_count
    }

    pub fn pass_running(&self) -> bool {
        self.pass.as_ref().is_some_and(|job| job.is_running())
    }

    /// Switch to `page`; pending gestures, selection and batch of the old
    /// page are dropped. Returns `false` for an out-of-range page.
    pub fn go_to(&mut self, page: u32) -> bool {
        if page == 0 || page > self.page_count() {
            return false;
        }
        if page != self.page {
            self.page = page;
            self.hover = None;
            self.batch = None;
        }
        self.selection.activate_page(page);
        self.controller.page_changed(page);
        true
    }

    /// Jump to the first untranslated page after the current one.
    pub fn go_to_next_untranslated(&mut self) -> Option<u32> {
        let next = self.session.first_untranslated(self.page)?;
        self.go_to(next);
        Some(next)
    }

    pub fn set_mode(&mut self, mode: SelectionMode) {
        if mode != self.controller.mode() {
            self.controller.set_mode(mode);
        }
    }

    /// Feed one pointer event; returns whether the selection changed.
    ///
    /// Pointer input only selects in edit mode.
    pub fn pointer(&mut self, phase: PointerPhase, point: NormPoint) -> bool {
        if !self.edit_mode {
            return false;
        }

        match phase {
            PointerPhase::Move => {
                self.hover = Some(point);
                false
            }
            PointerPhase::Leave => {
                self.hover = None;
                false
            }
            PointerPhase::Down => {
                self.hover = Some(point);
                self.controller.pointer_down(self.page, point);
                false
            }
            PointerPhase::Up => {
                self.hover = Some(point);
                let segments = self
                    .session
                    .page(self.page)
                    .map_or(&[][..], |p| p.segments.as_slice());
                let current = self.selection.indices_for(self.page);
                match self.controller.pointer_up(self.page, point, segments, &current) {
                    Some(update) => {
                        self.selection.apply(update);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Pull in pages written by a pass since the session was loaded.
    pub fn refresh(&mut self) -> Result<()> {
        self.session.reload()
    }

    pub fn view(&self, message: Option<String>) -> ViewerView {
        let page = self.session.page(self.page);
        ViewerView {
            project_id: self.session.project().id,
            page: self.page,
            page_count: self.page_count(),
            translated: page.is_some(),
            available: page.is_some_and(pdf_overlay_core::TranslatedPage::is_available),
            segment_count: page.map_or(0, |p| p.segments.len()),
            mode: self.controller.mode(),
            show_original: self.show_original,
            edit_mode: self.edit_mode,
            selected: self.selection.indices_for(self.page).into_iter().collect(),
            gesture: self
                .controller
                .preview(self.page, self.hover)
                .map(GestureView::from),
            batch_open: self.batch.is_some(),
            message,
        }
    }

    /// Frame inputs for the current page; `None` when it is not translated.
    pub fn frame_job(&self) -> Option<FrameJob> {
        let page = self.session.page(self.page)?;
        Some(FrameJob {
            image_data: page.image_data.clone(),
            segments: page.segments.clone(),
            selected: self.selection.indices_for(self.page),
            show_original: self.show_original,
            edit_mode: self.edit_mode,
            gesture: self.controller.preview(self.page, self.hover),
        })
    }
}

/// Global application state
pub struct AppState {
    pub store: ProjectStore,
    pub config: AppConfig,
    pub translator: Arc<dyn Translator>,
    pub font: OverlayFont,
    pub renderer: OverlayRenderer,
    pub rasters: RasterCache,
    /// Open viewers indexed by project id
    viewers: RwLock<HashMap<Uuid, ViewerSession>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: ProjectStore,
        translator: Arc<dyn Translator>,
        font: OverlayFont,
    ) -> Self {
        let renderer = OverlayRenderer::new(&config.overlay, config.text_color);
        Self {
            store,
            config,
            translator,
            font,
            renderer,
            rasters: RasterCache::default(),
            viewers: RwLock::new(HashMap::new()),
        }
    }

    /// Get the viewer of a project, loading it from the store on first use.
    pub async fn viewer(&self, project_id: Uuid) -> Result<SessionRef<'_>> {
        if self.viewers.read().await.contains_key(&project_id) {
            return Ok(SessionRef {
                id: project_id,
                state: self,
            });
        }

        let session = ProjectSession::load(self.store.clone(), project_id)?;
        self.viewers
            .write()
            .await
            .entry(project_id)
            .or_insert_with(|| ViewerSession::new(session, self.config.selection));

        Ok(SessionRef {
            id: project_id,
            state: self,
        })
    }

    /// Drop the viewer of a project about to be deleted.
    ///
    /// Returns `false`, keeping the viewer, while a pass is running for it.
    pub async fn forget(&self, project_id: Uuid) -> bool {
        let mut viewers = self.viewers.write().await;
        if viewers.get(&project_id).is_some_and(ViewerSession::pass_running) {
            return false;
        }
        viewers.remove(&project_id);
        true
    }

    /// Drop idle viewers unless a pass is still running for them.
    pub async fn cleanup_idle_viewers(&self) -> usize {
        let mut viewers = self.viewers.write().await;
        let before = viewers.len();
        let now = Instant::now();

        viewers.retain(|_, viewer| {
            viewer.pass_running()
                || now.duration_since(viewer.last_active) < VIEWER_MAX_IDLE
        });
        before - viewers.len()
    }
}

/// A borrowed reference to a viewer that provides safe access patterns.
///
/// Holding a lock guard across an `.await` point can deadlock and the
/// guard is not `Send`. Locks are only taken inside synchronous closures
/// and released before the method returns.
///
/// ```ignore
/// let job = viewer.with_session(|v| v.frame_job()).await?;
/// render(job).await;
/// ```
pub struct SessionRef<'a> {
    id: Uuid,
    state: &'a AppState,
}

impl SessionRef<'_> {
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Access viewer data immutably within a closure.
    pub async fn with_session<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&ViewerSession) -> R,
    {
        let viewers = self.state.viewers.read().await;
        viewers.get(&self.id).map(f)
    }

    /// Access viewer data mutably within a closure; counts as activity.
    pub async fn with_session_mut<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut ViewerSession) -> R,
    {
        let mut viewers = self.state.viewers.write().await;
        viewers.get_mut(&self.id).map(|viewer| {
            viewer.last_active = Instant::now();
            f(viewer)
        })
    }
}
