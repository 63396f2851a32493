//! Animation lifecycle controller
//!
//! Owns the scene, the catalog of selectable animations and the playback
//! state, and runs one model at a time. Selecting an animation starts an
//! asynchronous load; loads run as local tasks on a [`LocalPool`] that is
//! polled from [`AnimationController::update`], and report back through a
//! channel. Every load carries a [`RequestToken`]; only the result of the
//! most recent request is ever applied.

use std::sync::Arc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::{self, FutureExt};
use futures::task::LocalSpawnExt;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::animation::{AnimationMixer, LoopMode};
use crate::assets::{AssetLoader, GltfAssetLoader, ModelAsset, ProgressReporter};
use crate::config::ViewerConfig;
use crate::errors::{AssetError, Result, SetupError, ViewerError};
use crate::scene::{Disposed, NodeHandle, Scene};
use crate::utils::time::FrameLoop;
use crate::viewer::catalog::{AnimationCatalog, AnimationDescriptor};
use crate::viewer::diagnostics::{DiagnosticLevel, DiagnosticLog};
use crate::viewer::mount::{ListenerGuard, MountTarget};
use crate::viewer::normalize::{Normalization, normalize_model};
use crate::viewer::playback::PlaybackState;
use crate::viewer::token::{RequestToken, TokenGenerator};

/// Lifecycle state of the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerState {
    /// No model shown and nothing loading, or torn down.
    Idle,
    /// A load is in flight; the previous model (if any) is still shown.
    Loading {
        token: RequestToken,
        animation_id: String,
    },
    /// The model for `animation_id` is in the scene.
    Playing { animation_id: String },
    /// The last load failed. The previously shown model stays in place.
    Error {
        animation_id: String,
        error: ViewerError,
    },
}

/// Messages sent from load tasks back to the controller.
#[derive(Debug)]
pub enum LoadEvent {
    Progress {
        token: RequestToken,
        fraction: f32,
    },
    Completed {
        token: RequestToken,
        animation_id: String,
        result: std::result::Result<Arc<ModelAsset>, AssetError>,
    },
}

/// The model currently in the scene.
#[derive(Debug)]
struct ActiveModel {
    animation_id: String,
    root: NodeHandle,
    /// `None` when the model has no playable clip; it is shown static.
    mixer: Option<AnimationMixer>,
}

impl ActiveModel {
    /// Stops playback and removes the model's nodes and meshes.
    fn dispose(self, scene: &mut Scene) -> Disposed {
        if let Some(mut mixer) = self.mixer {
            mixer.stop_all_action();
        }
        scene.remove_node(self.root)
    }
}

/// Snapshot of everything the UI renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerStatus {
    pub descriptors: Vec<AnimationDescriptor>,
    pub active_animation: Option<String>,
    pub displayed_animation: Option<String>,
    pub is_loading: bool,
    /// Load progress in percent while loading.
    pub progress_percent: Option<u8>,
    pub paused: bool,
    pub speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub speed_step: f32,
    /// Message of the last failed load, while in the error state.
    pub error: Option<String>,
}

pub struct AnimationController<L: AssetLoader = GltfAssetLoader> {
    config: ViewerConfig,
    loader: L,
    mount: Box<dyn MountTarget>,

    catalog: AnimationCatalog,
    playback: PlaybackState,
    state: ControllerState,
    tokens: TokenGenerator,
    progress: Option<f32>,

    /// `None` once torn down.
    scene: Option<Scene>,
    active: Option<ActiveModel>,
    cache: FxHashMap<String, Arc<ModelAsset>>,

    pool: Option<LocalPool>,
    spawner: LocalSpawner,
    events_tx: flume::Sender<LoadEvent>,
    events_rx: flume::Receiver<LoadEvent>,

    frames: FrameLoop,
    listeners: Vec<ListenerGuard>,
    diagnostics: DiagnosticLog,
}

impl<L: AssetLoader> AnimationController<L> {
    /// Builds the controller, starts the frame loop and, when configured,
    /// selects the start-up animation.
    ///
    /// Fails with [`ViewerError::Environment`] when the mount target is
    /// missing or already detached, and with [`ViewerError::Config`] when
    /// the configuration is invalid.
    pub fn init<M: MountTarget + 'static>(
        config: ViewerConfig,
        loader: L,
        mount: Option<M>,
    ) -> Result<Self> {
        let Some(mount) = mount else {
            log::error!("Viewer mount target is missing");
            return Err(ViewerError::Environment("mount target is missing".into()));
        };
        if !mount.is_attached() {
            log::error!("{} is not attached", mount.describe());
            return Err(ViewerError::Environment(format!(
                "{} is not attached",
                mount.describe()
            )));
        }
        config.validate()?;

        let pool = LocalPool::new();
        let spawner = pool.spawner();
        let (events_tx, events_rx) = flume::unbounded();

        log::info!(
            "Starting viewer on {} with {} animations from '{}'",
            mount.describe(),
            config.animations.len(),
            config.models_root
        );

        let mut controller = Self {
            catalog: AnimationCatalog::from_entries(&config.animations),
            playback: PlaybackState::new(config.playback.initial_speed),
            diagnostics: DiagnosticLog::new(config.diagnostics_capacity),
            config,
            loader,
            mount: Box::new(mount),
            state: ControllerState::Idle,
            tokens: TokenGenerator::new(),
            progress: None,
            scene: Some(Scene::new()),
            active: None,
            cache: FxHashMap::default(),
            pool: Some(pool),
            spawner,
            events_tx,
            events_rx,
            frames: FrameLoop::start(),
            listeners: Vec::new(),
        };

        if let Some(id) = controller.config.startup_animation().map(str::to_string) {
            controller.select_animation(&id)?;
        }

        Ok(controller)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Starts loading the model for `animation_id`.
    ///
    /// The descriptor becomes active immediately and any load still in
    /// flight is superseded. Selecting the already active animation does
    /// nothing.
    pub fn select_animation(&mut self, animation_id: &str) -> Result<()> {
        if self.is_torn_down() {
            return Err(ViewerError::TornDown);
        }
        if !self.catalog.contains(animation_id) {
            let error = ViewerError::UnknownAnimation(animation_id.to_string());
            self.diagnostics.record_error(&error);
            return Err(error);
        }
        if self.catalog.is_active(animation_id) {
            self.diagnostics.record(
                DiagnosticLevel::Debug,
                Some(animation_id),
                "already selected, ignoring",
            );
            return Ok(());
        }

        if let ControllerState::Loading {
            token,
            animation_id: pending,
        } = &self.state
        {
            self.diagnostics.record(
                DiagnosticLevel::Info,
                Some(pending),
                format!("load {token} superseded by '{animation_id}'"),
            );
        }

        let token = self.tokens.issue();
        self.catalog.set_active(animation_id);
        self.playback.paused = false;
        self.sync_mixer();
        self.state = ControllerState::Loading {
            token,
            animation_id: animation_id.to_string(),
        };
        self.progress = Some(0.0);

        let path = self.config.asset_path(animation_id);
        let cached = self
            .config
            .cache_assets
            .then(|| self.cache.get(animation_id).cloned())
            .flatten();

        let load = match cached {
            Some(asset) => {
                log::debug!("Reusing cached asset for '{animation_id}' ({token})");
                future::ready(Ok(asset)).boxed_local()
            }
            None => {
                log::info!("Loading '{animation_id}' from {path} ({token})");
                let tx = self.events_tx.clone();
                let progress = ProgressReporter::new(move |fraction| {
                    let _ = tx.send(LoadEvent::Progress { token, fraction });
                });
                self.loader
                    .load(&path, progress)
                    .map(|result| result.map(Arc::new))
                    .boxed_local()
            }
        };

        let tx = self.events_tx.clone();
        let id = animation_id.to_string();
        let task = async move {
            let result = load.await;
            let _ = tx.send(LoadEvent::Completed {
                token,
                animation_id: id,
                result,
            });
        };

        if let Err(err) = self.spawner.spawn_local(task) {
            log::error!("Failed to spawn load task: {err}");
            let _ = self.events_tx.send(LoadEvent::Completed {
                token,
                animation_id: animation_id.to_string(),
                result: Err(AssetError::Cancelled),
            });
        }

        Ok(())
    }

    /// Changes the playback speed without restarting the clip.
    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        if self.is_torn_down() {
            return Err(ViewerError::TornDown);
        }
        if let Err(error) = self.playback.set_speed(speed) {
            self.diagnostics.record_error(&error);
            return Err(error);
        }
        self.sync_mixer();
        Ok(())
    }

    /// Flips the paused flag. Returns `false` and does nothing when no
    /// model is loaded.
    pub fn toggle_pause(&mut self) -> bool {
        if self.is_torn_down() || self.active.is_none() {
            self.diagnostics
                .record(DiagnosticLevel::Debug, None, "no model loaded, pause ignored");
            return false;
        }
        let paused = self.playback.toggle_pause();
        self.sync_mixer();
        log::debug!("Playback {}", if paused { "paused" } else { "resumed" });
        true
    }

    /// Keeps a host event listener alive until teardown.
    pub fn register_listener(&mut self, guard: ListenerGuard) {
        if self.is_torn_down() {
            guard.detach();
            return;
        }
        self.listeners.push(guard);
    }

    // ========================================================================
    // Frame loop
    // ========================================================================

    /// Runs one frame when the frame loop is active. Returns whether a
    /// frame was run.
    pub fn frame(&mut self) -> bool {
        match self.frames.tick() {
            Some(dt) => {
                self.update(dt);
                true
            }
            None => false,
        }
    }

    /// Polls pending loads, applies their results and advances playback by
    /// `dt` seconds. Does nothing after teardown.
    pub fn update(&mut self, dt: f32) {
        if self.is_torn_down() {
            return;
        }

        if let Some(pool) = &mut self.pool {
            pool.run_until_stalled();
        }
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }

        if !self.mount.is_attached() {
            return;
        }
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        if let Some(active) = &mut self.active
            && let Some(mixer) = &mut active.mixer
        {
            mixer.update(dt, scene);
        }
        scene.update_matrix_world();
    }

    fn handle_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Progress { token, fraction } => {
                if self.is_current_load(token) {
                    self.progress = Some(fraction);
                }
            }
            LoadEvent::Completed {
                token,
                animation_id,
                result,
            } => self.on_load_completed(token, animation_id, result),
        }
    }

    fn is_current_load(&self, token: RequestToken) -> bool {
        self.tokens.is_current(token)
            && matches!(&self.state, ControllerState::Loading { token: t, .. } if *t == token)
    }

    fn on_load_completed(
        &mut self,
        token: RequestToken,
        animation_id: String,
        result: std::result::Result<Arc<ModelAsset>, AssetError>,
    ) {
        if !self.is_current_load(token) {
            let outcome = match &result {
                Ok(_) => "result".to_string(),
                Err(err) => format!("failure ({err})"),
            };
            self.diagnostics.record(
                DiagnosticLevel::Info,
                Some(&animation_id),
                format!("discarding stale {outcome} of load {token}"),
            );
            return;
        }

        self.progress = None;

        if !self.mount.is_attached() {
            self.diagnostics.record(
                DiagnosticLevel::Warn,
                Some(&animation_id),
                format!("{} was removed, dropping loaded model", self.mount.describe()),
            );
            self.catalog.clear_active(&animation_id);
            // The model from before the selection is still in the scene.
            self.state = match &self.active {
                Some(active) => ControllerState::Playing {
                    animation_id: active.animation_id.clone(),
                },
                None => ControllerState::Idle,
            };
            return;
        }

        match result {
            Ok(asset) => self.install_model(animation_id, asset),
            Err(source) => {
                let error = ViewerError::Load {
                    animation_id: animation_id.clone(),
                    source,
                };
                self.diagnostics.record_error(&error);
                self.catalog.clear_active(&animation_id);
                self.state = ControllerState::Error {
                    animation_id,
                    error,
                };
            }
        }
    }

    /// Replaces the displayed model with `asset` and starts its first clip.
    fn install_model(&mut self, animation_id: String, asset: Arc<ModelAsset>) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };

        if self.config.cache_assets {
            self.cache.insert(animation_id.clone(), Arc::clone(&asset));
        }
        self.catalog.mark_loaded(&animation_id);

        if let Some(previous) = self.active.take() {
            let previous_id = previous.animation_id.clone();
            let disposed = previous.dispose(scene);
            self.diagnostics.record(
                DiagnosticLevel::Debug,
                Some(&previous_id),
                format!(
                    "disposed previous model: {} nodes, {} meshes",
                    disposed.nodes, disposed.meshes
                ),
            );
        }

        let root = scene.instantiate(&asset);
        match normalize_model(scene, root, &self.config.normalization) {
            Normalization::Fitted { scale, offset } => {
                log::debug!("Fitted '{animation_id}': scale {scale}, offset {offset}");
            }
            Normalization::Fallback { scale } => self.diagnostics.record(
                DiagnosticLevel::Warn,
                Some(&animation_id),
                format!("model bounds unusable, using fallback scale {scale}"),
            ),
        }

        let mixer = match build_mixer(scene, root, &asset) {
            Ok(mixer) => Some(mixer),
            Err(reason) => {
                let error = ViewerError::Setup {
                    animation_id: animation_id.clone(),
                    reason,
                };
                self.diagnostics.record_error(&error);
                None
            }
        };

        log::info!("Playing '{animation_id}' ({} nodes)", scene.node_count());
        self.active = Some(ActiveModel {
            animation_id: animation_id.clone(),
            root,
            mixer,
        });
        self.state = ControllerState::Playing { animation_id };
        self.sync_mixer();
    }

    /// Pushes the playback speed and paused flag into every action.
    fn sync_mixer(&mut self) {
        let speed = self.playback.speed();
        let paused = self.playback.paused;
        if let Some(mixer) = self.active.as_mut().and_then(|a| a.mixer.as_mut()) {
            for action in mixer.actions_mut() {
                action.set_effective_time_scale(speed);
                action.paused = paused;
            }
        }
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Stops the frame loop, drops pending loads, disposes the model and
    /// removes every registered listener. Idempotent.
    pub fn teardown(&mut self) {
        if self.is_torn_down() {
            return;
        }

        self.frames.cancel();
        self.tokens.invalidate();
        // Dropping the pool drops every pending load future.
        self.pool = None;
        while self.events_rx.try_recv().is_ok() {}

        if let Some(mut scene) = self.scene.take()
            && let Some(active) = self.active.take()
        {
            let disposed = active.dispose(&mut scene);
            log::debug!(
                "Disposed model on teardown: {} nodes, {} meshes",
                disposed.nodes,
                disposed.meshes
            );
        }

        for guard in self.listeners.drain(..) {
            guard.detach();
        }

        self.catalog.clear_all_active();
        self.cache.clear();
        self.progress = None;
        self.state = ControllerState::Idle;
        log::info!("Viewer torn down");
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.scene.is_none()
    }

    #[must_use]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.state, ControllerState::Loading { .. })
    }

    /// Load progress in `[0, 1]` while loading.
    #[must_use]
    pub fn progress(&self) -> Option<f32> {
        self.progress
    }

    #[must_use]
    pub fn descriptors(&self) -> &[AnimationDescriptor] {
        self.catalog.descriptors()
    }

    #[must_use]
    pub fn catalog(&self) -> &AnimationCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.diagnostics
    }

    #[must_use]
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Root node of the displayed model.
    #[must_use]
    pub fn model_root(&self) -> Option<NodeHandle> {
        self.active.as_ref().map(|a| a.root)
    }

    /// Animation whose model is displayed, which may differ from the
    /// active descriptor while a load is in flight.
    #[must_use]
    pub fn displayed_animation(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.animation_id.as_str())
    }

    #[must_use]
    pub fn mixer(&self) -> Option<&AnimationMixer> {
        self.active.as_ref().and_then(|a| a.mixer.as_ref())
    }

    #[must_use]
    pub fn is_frame_loop_running(&self) -> bool {
        self.frames.is_running()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn status(&self) -> ViewerStatus {
        let playback = &self.config.playback;
        ViewerStatus {
            descriptors: self.catalog.descriptors().to_vec(),
            active_animation: self.catalog.active().map(|d| d.id.clone()),
            displayed_animation: self.displayed_animation().map(str::to_string),
            is_loading: self.is_loading(),
            progress_percent: self.progress.map(|p| (p * 100.0).round().clamp(0.0, 100.0) as u8),
            paused: self.playback.paused,
            speed: self.playback.speed(),
            min_speed: playback.min_speed,
            max_speed: playback.max_speed,
            speed_step: playback.speed_step,
            error: match &self.state {
                ControllerState::Error { error, .. } => Some(error.to_string()),
                _ => None,
            },
        }
    }
}

impl<L: AssetLoader> Drop for AnimationController<L> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Creates a looping mixer for the first clip of `asset`.
fn build_mixer(
    scene: &Scene,
    root: NodeHandle,
    asset: &ModelAsset,
) -> std::result::Result<AnimationMixer, SetupError> {
    let clip = asset.first_clip().ok_or(SetupError::NoClips)?;

    let mut mixer = AnimationMixer::new(root);
    let action = mixer.clip_action(scene, clip);
    if action.bindings.is_empty() {
        return Err(SetupError::NoBindings {
            clip: clip.name.clone(),
        });
    }
    action.loop_mode = LoopMode::Loop;
    action.reset().play();

    Ok(mixer)
}
