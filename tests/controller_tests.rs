//! Animation Controller Lifecycle Tests
//!
//! Tests for:
//! - Start-up selection and looped playback
//! - Last-writer-wins between overlapping loads
//! - Load failures and mixer setup failures
//! - Speed and pause propagation to the live mixer
//! - Teardown with loads still in flight, detached mount targets
//!
//! Loads go through a scripted loader: every `load` call parks a oneshot
//! sender that the test resolves in whatever order it needs.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use glam::Vec3;

use skinview::animation::{
    AnimationClip, InterpolationMode, KeyframeTrack, LoopMode, TargetPath, Track, TrackData,
    TrackMeta,
};
use skinview::assets::{AssetLoader, AssetPath, ModelAsset, ModelNode, ProgressReporter};
use skinview::config::ViewerConfig;
use skinview::errors::{AssetError, ViewerError};
use skinview::scene::{BoundingBox, Mesh};
use skinview::ui::Dropdown;
use skinview::viewer::{
    AnimationController, ControllerState, DiagnosticLevel, HeadlessMount, ListenerGuard,
};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Scripted Loader
// ============================================================================

type LoadResult = Result<ModelAsset, AssetError>;

struct PendingLoad {
    file: String,
    progress: ProgressReporter,
    reply: oneshot::Sender<LoadResult>,
}

#[derive(Clone, Default)]
struct ScriptedLoader {
    pending: Rc<RefCell<Vec<PendingLoad>>>,
    calls: Rc<Cell<usize>>,
}

impl ScriptedLoader {
    /// Resolves the oldest pending load of `file`. Returns whether anyone
    /// was still waiting for it.
    fn release(&self, file: &str, result: LoadResult) -> bool {
        let mut pending = self.pending.borrow_mut();
        let index = pending
            .iter()
            .position(|p| p.file == file)
            .unwrap_or_else(|| panic!("no pending load for {file}"));
        pending.remove(index).reply.send(result).is_ok()
    }

    fn report(&self, file: &str, fraction: f32) {
        let pending = self.pending.borrow();
        let load = pending.iter().find(|p| p.file == file).unwrap();
        load.progress.report(fraction);
    }

    fn pending_files(&self) -> Vec<String> {
        self.pending.borrow().iter().map(|p| p.file.clone()).collect()
    }

    fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl AssetLoader for ScriptedLoader {
    fn load(&self, path: &AssetPath, progress: ProgressReporter) -> LocalBoxFuture<'static, LoadResult> {
        let (reply, rx) = oneshot::channel();
        self.calls.set(self.calls.get() + 1);
        self.pending.borrow_mut().push(PendingLoad {
            file: path.file.clone(),
            progress,
            reply,
        });
        async move { rx.await.unwrap_or(Err(AssetError::Cancelled)) }.boxed_local()
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A character whose "Hips" node carries a 1.8 unit tall mesh and, when
/// `with_clip` is set, a two second clip sliding the hips along +X.
fn character(name: &str, with_clip: bool) -> ModelAsset {
    character_with_bounds(
        name,
        with_clip,
        BoundingBox::new(Vec3::new(-0.4, 0.0, -0.2), Vec3::new(0.4, 1.8, 0.2)),
    )
}

fn character_with_bounds(name: &str, with_clip: bool, bounds: BoundingBox) -> ModelAsset {
    let mut asset = ModelAsset::new(name);
    let mut hips = ModelNode::new("Hips");
    hips.mesh = Some(Mesh::new("Body", bounds));
    asset.roots = vec![asset.push_node(hips)];

    if with_clip {
        let track = Track {
            meta: TrackMeta {
                node_name: "Hips".to_string(),
                target: TargetPath::Translation,
            },
            data: TrackData::Vector3(KeyframeTrack::new(
                vec![0.0, 2.0],
                vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)],
                InterpolationMode::Linear,
            )),
        };
        asset.clips.push(Arc::new(AnimationClip::new("mixamo.com", vec![track])));
    }
    asset
}

fn manual_config() -> ViewerConfig {
    ViewerConfig {
        autoload: false,
        ..ViewerConfig::default()
    }
}

fn controller(config: ViewerConfig, loader: &ScriptedLoader) -> AnimationController<ScriptedLoader> {
    init_logger();
    match AnimationController::init(config, loader.clone(), Some(HeadlessMount::new("canvas"))) {
        Ok(controller) => controller,
        Err(err) => panic!("init failed: {err}"),
    }
}

/// Selects `id`, resolves its load with a clip-carrying character and
/// applies the result.
fn load_and_play(controller: &mut AnimationController<ScriptedLoader>, loader: &ScriptedLoader, id: &str) {
    controller.select_animation(id).unwrap();
    loader.release(&format!("{id}.glb"), Ok(character(id, true)));
    controller.update(0.0);
    assert_eq!(
        controller.state(),
        &ControllerState::Playing {
            animation_id: id.to_string()
        }
    );
}

fn action_time(controller: &AnimationController<ScriptedLoader>) -> f32 {
    controller.mixer().unwrap().actions()[0].time
}

fn active_ids(controller: &AnimationController<ScriptedLoader>) -> Vec<String> {
    controller
        .descriptors()
        .iter()
        .filter(|d| d.active)
        .map(|d| d.id.clone())
        .collect()
}

// ============================================================================
// Init
// ============================================================================

#[test]
fn init_selects_startup_animation_and_plays_it_looped() -> anyhow::Result<()> {
    init_logger();
    let loader = ScriptedLoader::default();
    let config = ViewerConfig {
        initial_animation: Some("Walking".into()),
        ..ViewerConfig::default()
    };
    let mut controller =
        AnimationController::init(config, loader.clone(), Some(HeadlessMount::new("canvas")))?;

    assert_eq!(loader.pending_files(), vec!["Walking.glb".to_string()]);
    let status = controller.status();
    assert!(status.is_loading);
    assert_eq!(status.progress_percent, Some(0));
    assert_eq!(status.active_animation.as_deref(), Some("Walking"));

    loader.release("Walking.glb", Ok(character("Walking", true)));
    controller.update(0.0);

    let status = controller.status();
    assert!(!status.is_loading);
    assert_eq!(status.progress_percent, None);
    assert!(!status.paused);
    assert!(approx(status.speed, 1.0));

    let walking = controller.catalog().get("Walking").unwrap();
    assert!(walking.active && walking.loaded);

    let action = &controller.mixer().unwrap().actions()[0];
    assert_eq!(action.loop_mode, LoopMode::Loop);
    assert!(action.is_running());
    assert!(approx(action.time_scale, 1.0));
    Ok(())
}

#[test]
fn init_without_autoload_stays_idle() {
    let loader = ScriptedLoader::default();
    let controller = controller(manual_config(), &loader);
    assert_eq!(controller.state(), &ControllerState::Idle);
    assert_eq!(loader.calls(), 0);
    assert!(controller.is_frame_loop_running());
}

#[test]
fn init_requires_an_attached_mount() {
    let loader = ScriptedLoader::default();
    let missing = AnimationController::init(manual_config(), loader.clone(), None::<HeadlessMount>);
    assert!(matches!(missing, Err(ViewerError::Environment(_))));

    let mount = HeadlessMount::new("canvas");
    mount.handle().detach();
    let detached = AnimationController::init(manual_config(), loader.clone(), Some(mount));
    assert!(matches!(detached, Err(ViewerError::Environment(_))));
    assert_eq!(loader.calls(), 0);
}

#[test]
fn init_rejects_invalid_config() {
    let loader = ScriptedLoader::default();
    let config = ViewerConfig {
        initial_animation: Some("Moonwalk".into()),
        ..ViewerConfig::default()
    };
    let result = AnimationController::init(config, loader, Some(HeadlessMount::new("canvas")));
    assert!(matches!(result, Err(ViewerError::Config(_))));
}

// ============================================================================
// Selection Races
// ============================================================================

#[test]
fn newer_selection_wins_when_older_load_finishes_last() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);

    controller.select_animation("Walking").unwrap();
    controller.select_animation("Sitting").unwrap();
    assert_eq!(active_ids(&controller), vec!["Sitting".to_string()]);

    loader.release("Sitting.glb", Ok(character("Sitting", true)));
    controller.update(0.0);
    loader.release("Walking.glb", Ok(character("Walking", true)));
    controller.update(0.0);

    assert_eq!(controller.displayed_animation(), Some("Sitting"));
    assert_eq!(active_ids(&controller), vec!["Sitting".to_string()]);
    assert!(!controller.catalog().get("Walking").unwrap().loaded);
    assert!(
        controller
            .diagnostics()
            .iter()
            .any(|e| e.message.contains("stale") && e.animation_id.as_deref() == Some("Walking"))
    );
}

#[test]
fn stale_result_arriving_first_is_ignored() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);

    controller.select_animation("Walking").unwrap();
    controller.select_animation("Sitting").unwrap();

    loader.release("Walking.glb", Ok(character("Walking", true)));
    controller.update(0.0);
    assert!(controller.is_loading());
    assert!(controller.model_root().is_none());

    loader.release("Sitting.glb", Ok(character("Sitting", true)));
    controller.update(0.0);
    assert_eq!(controller.displayed_animation(), Some("Sitting"));
    assert_eq!(controller.catalog().active_count(), 1);
}

#[test]
fn stale_failure_is_ignored() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);

    controller.select_animation("Walking").unwrap();
    controller.select_animation("Sitting").unwrap();

    loader.release("Walking.glb", Err(AssetError::NotFound("models/Walking.glb".into())));
    controller.update(0.0);

    assert!(matches!(
        controller.state(),
        ControllerState::Loading { animation_id, .. } if animation_id == "Sitting"
    ));
    assert_eq!(active_ids(&controller), vec!["Sitting".to_string()]);
    let status = controller.status();
    assert!(status.is_loading);
    assert!(status.error.is_none());
    assert_eq!(controller.diagnostics().at_least(DiagnosticLevel::Error).count(), 0);

    loader.release("Sitting.glb", Ok(character("Sitting", true)));
    controller.update(0.0);
    assert_eq!(controller.displayed_animation(), Some("Sitting"));
}

#[test]
fn last_of_three_selections_wins_in_any_completion_order() {
    const IDS: [&str; 3] = ["Walking", "Running", "Sitting"];
    const ORDERS: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    for order in ORDERS {
        let loader = ScriptedLoader::default();
        let mut controller = controller(manual_config(), &loader);
        for id in IDS {
            controller.select_animation(id).unwrap();
        }

        for index in order {
            let id = IDS[index];
            loader.release(&format!("{id}.glb"), Ok(character(id, true)));
            controller.update(0.0);

            let displayed = controller.displayed_animation();
            assert!(
                displayed.is_none() || displayed == Some("Sitting"),
                "order {order:?}: {displayed:?} shown after releasing {id}"
            );
            assert_eq!(active_ids(&controller), vec!["Sitting".to_string()]);
        }

        assert_eq!(controller.displayed_animation(), Some("Sitting"), "order {order:?}");
        assert_eq!(controller.scene().unwrap().mesh_count(), 1, "order {order:?}");
        assert!(!controller.is_loading());
    }
}

#[test]
fn reselecting_active_animation_is_a_no_op() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);
    load_and_play(&mut controller, &loader, "Walking");

    controller.select_animation("Walking").unwrap();
    assert_eq!(loader.calls(), 1);
    assert!(!controller.is_loading());
    assert_eq!(
        controller.diagnostics().last().map(|e| e.level),
        Some(DiagnosticLevel::Debug)
    );
}

#[test]
fn unknown_animation_is_rejected() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);

    let err = controller.select_animation("Moonwalk").unwrap_err();
    assert_eq!(err, ViewerError::UnknownAnimation("Moonwalk".into()));
    assert_eq!(controller.state(), &ControllerState::Idle);
    assert_eq!(loader.calls(), 0);
}

#[test]
fn switching_models_disposes_the_previous_one() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);
    load_and_play(&mut controller, &loader, "Walking");
    let first_root = controller.model_root().unwrap();
    let nodes_per_model = controller.scene().unwrap().node_count();

    load_and_play(&mut controller, &loader, "Running");

    let scene = controller.scene().unwrap();
    assert!(!scene.contains(first_root));
    assert_eq!(scene.node_count(), nodes_per_model);
    assert_eq!(scene.mesh_count(), 1);
}

#[test]
fn cached_assets_are_not_fetched_again() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);
    load_and_play(&mut controller, &loader, "Walking");
    load_and_play(&mut controller, &loader, "Running");

    controller.select_animation("Walking").unwrap();
    assert!(controller.is_loading());
    controller.update(0.0);

    assert_eq!(loader.calls(), 2);
    assert_eq!(controller.displayed_animation(), Some("Walking"));
}

#[test]
fn progress_reports_reach_the_status() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);
    controller.select_animation("Jumping").unwrap();

    loader.report("Jumping.glb", 0.5);
    controller.update(0.0);
    assert_eq!(controller.status().progress_percent, Some(50));

    let dropdown = Dropdown::from_status(&controller.status());
    assert!(dropdown.is_disabled());
    assert_eq!(dropdown.value(), Some("Jumping"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn failed_load_keeps_previous_model_and_unblocks_ui() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);
    load_and_play(&mut controller, &loader, "Walking");
    let walking_root = controller.model_root();

    controller.select_animation("Running").unwrap();
    loader.release("Running.glb", Err(AssetError::NotFound("models/Running.glb".into())));
    controller.update(0.0);

    let status = controller.status();
    assert!(!status.is_loading);
    assert_eq!(status.active_animation, None);
    assert!(status.error.is_some());
    assert_eq!(controller.model_root(), walking_root);
    assert_eq!(controller.displayed_animation(), Some("Walking"));
    assert!(matches!(
        controller.state(),
        ControllerState::Error { animation_id, error: ViewerError::Load { .. } } if animation_id == "Running"
    ));
    assert_eq!(controller.diagnostics().at_least(DiagnosticLevel::Error).count(), 1);

    // Selecting it again retries
    controller.select_animation("Running").unwrap();
    assert_eq!(loader.pending_files(), vec!["Running.glb".to_string()]);
}

#[test]
fn model_without_clips_is_shown_static() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);

    controller.select_animation("Idle").unwrap();
    loader.release("Idle.glb", Ok(character("Idle", false)));
    controller.update(0.0);

    assert_eq!(
        controller.state(),
        &ControllerState::Playing {
            animation_id: "Idle".into()
        }
    );
    assert!(controller.model_root().is_some());
    assert!(controller.mixer().is_none());
    assert!(!controller.is_loading());
    assert!(
        controller
            .diagnostics()
            .at_least(DiagnosticLevel::Error)
            .any(|e| e.message.contains("no animation clips"))
    );
}

#[test]
fn degenerate_bounds_fall_back_to_fixed_scale() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);

    controller.select_animation("Waving").unwrap();
    let flat = BoundingBox::new(Vec3::ZERO, Vec3::ZERO);
    loader.release("Waving.glb", Ok(character_with_bounds("Waving", true, flat)));
    controller.update(0.0);

    let root = controller.model_root().unwrap();
    let scale = controller.scene().unwrap().get_node(root).unwrap().transform.scale;
    assert!(scale.abs_diff_eq(Vec3::splat(0.01), EPSILON), "got {scale}");
}

#[test]
fn loaded_model_is_fitted_to_target_size() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);
    load_and_play(&mut controller, &loader, "Dancing");

    let scene = controller.scene().unwrap();
    let bounds = scene.world_bounds(controller.model_root().unwrap()).unwrap();
    assert!(approx(bounds.size().max_element(), 2.0));
    assert!(approx(bounds.min.y, 0.0));
}

// ============================================================================
// Playback Controls
// ============================================================================

#[test]
fn set_speed_updates_live_mixer_without_restarting() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);
    load_and_play(&mut controller, &loader, "Walking");

    controller.update(0.5);
    assert!(approx(action_time(&controller), 0.5));

    controller.set_speed(2.0).unwrap();
    assert!(approx(action_time(&controller), 0.5));
    assert!(approx(controller.mixer().unwrap().actions()[0].time_scale, 2.0));

    controller.update(0.25);
    assert!(approx(action_time(&controller), 1.0));
}

#[test]
fn invalid_speeds_are_rejected() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);

    for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        assert!(matches!(controller.set_speed(bad), Err(ViewerError::InvalidSpeed(_))));
    }
    assert!(approx(controller.playback().speed(), 1.0));
}

#[test]
fn speed_set_before_load_applies_to_new_mixer() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);
    controller.set_speed(1.5).unwrap();
    load_and_play(&mut controller, &loader, "Walking");

    assert!(approx(controller.mixer().unwrap().actions()[0].time_scale, 1.5));
}

#[test]
fn toggle_pause_twice_resumes_without_time_jump() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);
    load_and_play(&mut controller, &loader, "Walking");
    controller.update(0.5);

    assert!(controller.toggle_pause());
    assert!(controller.status().paused);
    controller.update(1.0);
    assert!(approx(action_time(&controller), 0.5));

    assert!(controller.toggle_pause());
    assert!(!controller.status().paused);
    controller.update(0.1);
    assert!(approx(action_time(&controller), 0.6));
}

#[test]
fn toggle_pause_without_model_does_nothing() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);
    assert!(!controller.toggle_pause());
    assert!(!controller.status().paused);
}

#[test]
fn selecting_resumes_paused_playback() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);
    load_and_play(&mut controller, &loader, "Walking");
    controller.toggle_pause();

    load_and_play(&mut controller, &loader, "Running");
    assert!(!controller.status().paused);
    assert!(controller.mixer().unwrap().actions()[0].is_running());
}

#[test]
fn mixer_moves_the_bound_node() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);
    load_and_play(&mut controller, &loader, "Walking");
    controller.update(1.0);

    let scene = controller.scene().unwrap();
    let hips = scene
        .find_node_by_name(controller.model_root().unwrap(), "Hips")
        .unwrap();
    let position = scene.get_node(hips).unwrap().transform.position;
    assert!(position.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), EPSILON), "got {position}");
}

// ============================================================================
// Teardown & Mount Lifetime
// ============================================================================

#[test]
fn teardown_during_load_discards_result() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);
    load_and_play(&mut controller, &loader, "Walking");

    let removed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&removed);
    controller.register_listener(ListenerGuard::new("resize", move || flag.set(true)));

    controller.select_animation("Sitting").unwrap();
    controller.teardown();

    assert!(removed.get());
    assert_eq!(controller.listener_count(), 0);
    assert!(controller.is_torn_down());
    assert!(!controller.is_frame_loop_running());
    assert!(controller.scene().is_none());

    // Nobody is listening any more; resolving must not panic.
    assert!(!loader.release("Sitting.glb", Ok(character("Sitting", true))));
    controller.update(0.016);
    assert!(!controller.frame());
    assert_eq!(controller.state(), &ControllerState::Idle);
    assert_eq!(controller.select_animation("Idle"), Err(ViewerError::TornDown));

    controller.teardown();
}

#[test]
fn detached_mount_drops_completed_load() {
    init_logger();
    let loader = ScriptedLoader::default();
    let mount = HeadlessMount::new("canvas");
    let handle = mount.handle();
    let mut controller = match AnimationController::init(manual_config(), loader.clone(), Some(mount)) {
        Ok(controller) => controller,
        Err(err) => panic!("init failed: {err}"),
    };

    controller.select_animation("Walking").unwrap();
    handle.detach();
    loader.release("Walking.glb", Ok(character("Walking", true)));
    controller.update(0.0);

    assert!(controller.model_root().is_none());
    assert_eq!(controller.scene().unwrap().node_count(), 0);
    assert_eq!(controller.catalog().active_count(), 0);
    assert!(!controller.is_loading());
}

#[test]
fn detached_mount_keeps_previous_model_playing() {
    init_logger();
    let loader = ScriptedLoader::default();
    let mount = HeadlessMount::new("canvas");
    let handle = mount.handle();
    let mut controller = match AnimationController::init(manual_config(), loader.clone(), Some(mount)) {
        Ok(controller) => controller,
        Err(err) => panic!("init failed: {err}"),
    };
    load_and_play(&mut controller, &loader, "Walking");
    let walking_root = controller.model_root();

    controller.select_animation("Running").unwrap();
    handle.detach();
    loader.release("Running.glb", Ok(character("Running", true)));
    controller.update(0.0);

    assert_eq!(
        controller.state(),
        &ControllerState::Playing {
            animation_id: "Walking".to_string()
        }
    );
    assert_eq!(controller.model_root(), walking_root);
    assert_eq!(controller.displayed_animation(), Some("Walking"));
    assert_eq!(controller.catalog().active_count(), 0);
    assert!(!controller.is_loading());
}

#[test]
fn frame_drives_update_until_torn_down() {
    let loader = ScriptedLoader::default();
    let mut controller = controller(manual_config(), &loader);
    assert!(controller.frame());
    controller.teardown();
    assert!(!controller.frame());
}
