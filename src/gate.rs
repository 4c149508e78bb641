// gate.rs — motion permission and immersive session before playback
//
// Runs from a user gesture: ask for motion-sensor access, try to enter an
// immersive session, then play. Every enhancement step may fail or be missing
// without stopping the ones after it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use thiserror::Error;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// Prompt dismissed without an answer.
    Default,
}

/// Platform hook for motion-sensor permission. Absent on platforms that grant
/// sensor access implicitly.
pub trait MotionPermissionApi {
    fn request_permission(&self) -> BoxFuture<'_, PermissionState>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    ImmersiveVr,
    ImmersiveAr,
    Inline,
}

impl SessionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionMode::ImmersiveVr => "immersive-vr",
            SessionMode::ImmersiveAr => "immersive-ar",
            SessionMode::Inline => "inline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrFeature {
    LocalFloor,
    BoundedFloor,
    HandTracking,
}

impl XrFeature {
    pub fn as_str(self) -> &'static str {
        match self {
            XrFeature::LocalFloor => "local-floor",
            XrFeature::BoundedFloor => "bounded-floor",
            XrFeature::HandTracking => "hand-tracking",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInit {
    pub mode: SessionMode,
    pub optional_features: Vec<XrFeature>,
}

impl Default for SessionInit {
    fn default() -> Self {
        Self {
            mode: SessionMode::ImmersiveVr,
            optional_features: vec![
                XrFeature::LocalFloor,
                XrFeature::BoundedFloor,
                XrFeature::HandTracking,
            ],
        }
    }
}

/// Opaque handle for an active immersive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrSessionHandle {
    pub id: u64,
    pub mode: SessionMode,
    pub granted_features: Vec<XrFeature>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("{0} sessions are not supported")]
    NotSupported(&'static str),
    #[error("session request was cancelled")]
    Cancelled,
    #[error("session request failed: {0}")]
    Failed(String),
}

pub trait XrSystem {
    /// Requests a session; must be called while handling a user gesture.
    fn request_session<'a>(
        &'a self,
        init: &'a SessionInit,
    ) -> BoxFuture<'a, Result<XrSessionHandle, SessionError>>;

    /// Advertises that the page can enter `init.mode`; resolves once the user
    /// accepts through the browser's own affordance.
    fn offer_session<'a>(
        &'a self,
        init: &'a SessionInit,
    ) -> BoxFuture<'a, Result<XrSessionHandle, SessionError>> {
        Box::pin(std::future::ready(Err(SessionError::NotSupported(
            init.mode.as_str(),
        ))))
    }

    /// Hands the session to the renderer.
    fn set_session<'a>(&'a self, session: &'a XrSessionHandle) -> BoxFuture<'a, Result<(), SessionError>>;
}

/// What the host platform exposes. Missing APIs mean "unsupported".
pub trait Platform {
    fn motion_permission(&self) -> Option<Rc<dyn MotionPermissionApi>>;
    fn xr(&self) -> Option<Rc<dyn XrSystem>>;
}

/// A platform with neither API, e.g. a desktop window.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPlatform;

impl Platform for NoPlatform {
    fn motion_permission(&self) -> Option<Rc<dyn MotionPermissionApi>> {
        None
    }

    fn xr(&self) -> Option<Rc<dyn XrSystem>> {
        None
    }
}

/// Resolved once per session; a `Some(false)` is never retried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilityFlags {
    pub motion_permission: Option<bool>,
    pub immersive_supported: Option<bool>,
}

#[derive(Debug, Default)]
pub struct ActivationContext {
    pub flags: CapabilityFlags,
    pub session: Option<XrSessionHandle>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Skipped,
    Failed(String),
}

pub trait ActivationStep {
    fn name(&self) -> &'static str;
    fn run<'a>(&'a mut self, ctx: &'a mut ActivationContext) -> BoxFuture<'a, StepOutcome>;
}

pub struct MotionPermissionStep {
    api: Option<Rc<dyn MotionPermissionApi>>,
}

impl MotionPermissionStep {
    pub fn new(api: Option<Rc<dyn MotionPermissionApi>>) -> Self {
        Self { api }
    }
}

impl ActivationStep for MotionPermissionStep {
    fn name(&self) -> &'static str {
        "motion-permission"
    }

    fn run<'a>(&'a mut self, ctx: &'a mut ActivationContext) -> BoxFuture<'a, StepOutcome> {
        Box::pin(async move {
            if ctx.flags.motion_permission.is_some() {
                return StepOutcome::Skipped;
            }
            let Some(api) = self.api.as_ref() else {
                // implicit access; nothing to ask
                return StepOutcome::Skipped;
            };
            match api.request_permission().await {
                PermissionState::Granted => {
                    ctx.flags.motion_permission = Some(true);
                    StepOutcome::Completed
                }
                state => {
                    ctx.flags.motion_permission = Some(false);
                    log::warn!("{} ({:?})", crate::i18n::tr("log.permission_denied"), state);
                    StepOutcome::Failed(format!("motion permission {:?}", state))
                }
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEntry {
    /// Explicit request from a user gesture.
    Request,
    /// Browser-provided "Enter VR" affordance.
    Offer,
}

pub struct ImmersiveSessionStep {
    xr: Option<Rc<dyn XrSystem>>,
    init: SessionInit,
    entry: SessionEntry,
}

impl ImmersiveSessionStep {
    pub fn new(xr: Option<Rc<dyn XrSystem>>, init: SessionInit, entry: SessionEntry) -> Self {
        Self { xr, init, entry }
    }
}

impl ActivationStep for ImmersiveSessionStep {
    fn name(&self) -> &'static str {
        "immersive-session"
    }

    fn run<'a>(&'a mut self, ctx: &'a mut ActivationContext) -> BoxFuture<'a, StepOutcome> {
        Box::pin(async move {
            if ctx.session.is_some() || ctx.flags.immersive_supported == Some(false) {
                return StepOutcome::Skipped;
            }
            let Some(xr) = self.xr.as_ref() else {
                ctx.flags.immersive_supported = Some(false);
                log::info!("no XR system; staying in flat mode");
                return StepOutcome::Skipped;
            };

            let requested = match self.entry {
                SessionEntry::Request => xr.request_session(&self.init).await,
                SessionEntry::Offer => xr.offer_session(&self.init).await,
            };
            let result = match requested {
                Ok(session) => xr.set_session(&session).await.map(|()| session),
                Err(e) => Err(e),
            };

            match result {
                Ok(session) => {
                    log::info!("entered {} session {}", session.mode.as_str(), session.id);
                    ctx.flags.immersive_supported = Some(true);
                    ctx.session = Some(session);
                    StepOutcome::Completed
                }
                Err(e) => {
                    // a cancelled prompt can be retried on the next gesture
                    if !matches!(e, SessionError::Cancelled) {
                        ctx.flags.immersive_supported = Some(false);
                    }
                    log::warn!("{}: {e}", crate::i18n::tr("log.immersive_unsupported"));
                    StepOutcome::Failed(e.to_string())
                }
            }
        })
    }
}

/// The control's own behaviour (e.g. start playback). Always runs last.
pub struct DefaultActionStep {
    action: Box<dyn FnMut()>,
}

impl DefaultActionStep {
    pub fn new(action: impl FnMut() + 'static) -> Self {
        Self {
            action: Box::new(action),
        }
    }
}

impl ActivationStep for DefaultActionStep {
    fn name(&self) -> &'static str {
        "default-action"
    }

    fn run<'a>(&'a mut self, _ctx: &'a mut ActivationContext) -> BoxFuture<'a, StepOutcome> {
        (self.action)();
        Box::pin(std::future::ready(StepOutcome::Completed))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    pub outcomes: Vec<(&'static str, StepOutcome)>,
}

impl ActivationReport {
    pub fn outcome(&self, step: &str) -> Option<&StepOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| *name == step)
            .map(|(_, o)| o)
    }
}

/// Ordered, independent activation steps sharing one context.
pub struct ActivationPipeline {
    steps: Vec<Box<dyn ActivationStep>>,
    ctx: ActivationContext,
}

impl ActivationPipeline {
    pub fn new(steps: Vec<Box<dyn ActivationStep>>) -> Self {
        Self {
            steps,
            ctx: ActivationContext::default(),
        }
    }

    /// Permission, then session request, then `play`.
    pub fn vr_play(platform: &dyn Platform, entry: SessionEntry, play: impl FnMut() + 'static) -> Self {
        Self::new(vec![
            Box::new(MotionPermissionStep::new(platform.motion_permission())),
            Box::new(ImmersiveSessionStep::new(
                platform.xr(),
                SessionInit::default(),
                entry,
            )),
            Box::new(DefaultActionStep::new(play)),
        ])
    }

    pub fn flags(&self) -> CapabilityFlags {
        self.ctx.flags
    }

    pub fn session(&self) -> Option<&XrSessionHandle> {
        self.ctx.session.as_ref()
    }

    /// Runs every step in order. Failures are recorded, never propagated.
    pub async fn run(&mut self) -> ActivationReport {
        let mut outcomes = Vec::with_capacity(self.steps.len());
        for step in self.steps.iter_mut() {
            let outcome = step.run(&mut self.ctx).await;
            log::debug!("activation step {}: {:?}", step.name(), outcome);
            outcomes.push((step.name(), outcome));
        }
        ActivationReport { outcomes }
    }
}

/// What a player control renders as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlView {
    pub css_class: String,
    pub label: String,
}

/// Capability interface for player controls.
pub trait PlayerControl {
    /// Whether activating the control runs a sequence of its own.
    fn handles_activation(&self) -> bool;
    fn render(&self) -> ControlView;
}

/// Plain big play button: shared base the VR variant composes.
#[derive(Debug, Clone)]
pub struct PlayButton {
    pub css_class: &'static str,
    pub label_key: &'static str,
}

impl Default for PlayButton {
    fn default() -> Self {
        Self {
            css_class: "vjs-big-play-button",
            label_key: "control.play",
        }
    }
}

impl PlayerControl for PlayButton {
    fn handles_activation(&self) -> bool {
        false
    }

    fn render(&self) -> ControlView {
        ControlView {
            css_class: self.css_class.to_string(),
            label: crate::i18n::tr(self.label_key),
        }
    }
}

/// Big play button that asks for motion access and an immersive session
/// before starting playback.
pub struct VrPlayButton {
    base: PlayButton,
    pipeline: RefCell<ActivationPipeline>,
    flags: Cell<CapabilityFlags>,
}

impl VrPlayButton {
    pub fn new(platform: &dyn Platform, play: impl FnMut() + 'static) -> Self {
        Self {
            base: PlayButton::default(),
            pipeline: RefCell::new(ActivationPipeline::vr_play(
                platform,
                SessionEntry::Request,
                play,
            )),
            flags: Cell::new(CapabilityFlags::default()),
        }
    }

    /// Click handler. A click while an earlier activation is still waiting on
    /// a prompt runs nothing and returns an empty report.
    pub async fn activate(&self) -> ActivationReport {
        let Ok(mut pipeline) = self.pipeline.try_borrow_mut() else {
            log::debug!("activation already in progress; ignoring click");
            return ActivationReport::default();
        };
        let report = pipeline.run().await;
        self.flags.set(pipeline.flags());
        report
    }

    pub fn is_activating(&self) -> bool {
        self.pipeline.try_borrow_mut().is_err()
    }

    /// Flags as of the last finished activation.
    pub fn flags(&self) -> CapabilityFlags {
        self.flags.get()
    }
}

impl PlayerControl for VrPlayButton {
    fn handles_activation(&self) -> bool {
        true
    }

    fn render(&self) -> ControlView {
        let base = self.base.render();
        ControlView {
            css_class: format!("vjs-big-vr-play-button {}", base.css_class),
            label: crate::i18n::tr("control.vr_play"),
        }
    }
}

impl fmt::Debug for VrPlayButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VrPlayButton")
            .field("base", &self.base)
            .field("flags", &self.flags())
            .finish()
    }
}
