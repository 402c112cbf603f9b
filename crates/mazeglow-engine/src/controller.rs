//! Main-thread controller for the maze background.
//!
//! [`MazeBackground`] ties the pieces together. It turns environment
//! changes into generation requests, fades the canvas out before every new
//! job, forwards requests to the worker, accepts only events tagged with the
//! current request id and hands adopted tiles to the [`Compositor`].
//!
//! Time is logical: the host calls [`MazeBackground::update`] with the frame
//! delta and everything (fades, debounces, auto-regeneration) advances from
//! there.

use std::time::Duration;

use image::RgbaImage;
use mazeglow_common::{RequestCounter, RequestId, Theme, TransportError};
use tracing::{debug, info, trace, warn};

use crate::compositor::Compositor;
use crate::config::{EngineConfig, LifecycleTimings, WorkerMode};
use crate::lifecycle::{VisualLifecycle, VisualState};
use crate::protocol::{Trigger, WorkerCommand, WorkerEvent};
use crate::scheduler::{CancellationToken, Fired, Scheduler};
use crate::transport::{InlineTransport, ThreadedTransport, Transport};
use crate::watchers::{EnvironmentEvent, ResizeWatcher, ThemeWatcher, VisibilityWatcher};
use crate::worker::{WorkerSettings, WorkerStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Issue a request once the canvas is hidden.
    StartGeneration(Trigger),
    /// The finished maze has been shown long enough.
    FadeOutForRegen,
}

/// Controller counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackgroundStats {
    /// Generate commands sent to the worker
    pub requests_issued: u64,
    /// Render events adopted for display
    pub frames_adopted: u64,
    /// Render events dropped as stale
    pub frames_discarded: u64,
    /// Jobs that reported completion
    pub jobs_finished: u64,
}

/// The maze background effect.
pub struct MazeBackground {
    timings: LifecycleTimings,
    transport: Box<dyn Transport>,
    requests: RequestCounter,
    lifecycle: VisualLifecycle,
    scheduler: Scheduler<Action>,
    attempt: CancellationToken,
    compositor: Compositor,
    theme: Theme,
    viewport: (u32, u32),
    first_load: bool,
    paused: bool,
    disabled: bool,
    resize: ResizeWatcher,
    themes: ThemeWatcher,
    visibility: VisibilityWatcher,
    stats: BackgroundStats,
}

impl MazeBackground {
    /// Builds and starts the effect with the transport selected by
    /// `config.worker_mode`. Returns `None`, after logging why, when the
    /// worker cannot be created.
    #[must_use]
    pub fn try_new(config: &EngineConfig, theme: Theme, width: u32, height: u32) -> Option<Self> {
        let settings = match WorkerSettings::from_config(config) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Maze background disabled: {e}");
                return None;
            },
        };
        let transport: Box<dyn Transport> = match config.worker_mode {
            WorkerMode::Threaded => match ThreadedTransport::spawn(settings, config.frame_interval()) {
                Ok(transport) => Box::new(transport),
                Err(e) => {
                    warn!("Maze background disabled, no worker: {e}");
                    return None;
                },
            },
            WorkerMode::Inline => Box::new(InlineTransport::new(settings)),
        };

        let mut background = Self::with_transport(config, transport, theme, width, height);
        match background.start() {
            Ok(()) => Some(background),
            Err(e) => {
                warn!("Maze background disabled, worker refused init: {e}");
                None
            },
        }
    }

    /// Builds the controller around an existing transport. Nothing happens
    /// until [`MazeBackground::start`].
    #[must_use]
    pub fn with_transport(
        config: &EngineConfig,
        transport: Box<dyn Transport>,
        theme: Theme,
        width: u32,
        height: u32,
    ) -> Self {
        let timings = config.timings;
        let mut compositor = Compositor::new(config.enable_glow, config.glow_radius_dark, config.glow_radius_light);
        compositor.set_theme(theme);
        Self {
            lifecycle: VisualLifecycle::new(timings.fade_in(), timings.fade_out()),
            timings,
            transport,
            requests: RequestCounter::new(),
            scheduler: Scheduler::new(),
            attempt: CancellationToken::new(),
            compositor,
            theme,
            viewport: (width, height),
            first_load: true,
            paused: false,
            disabled: false,
            resize: ResizeWatcher::new(),
            themes: ThemeWatcher::new(theme),
            visibility: VisibilityWatcher::new(),
            stats: BackgroundStats::default(),
        }
    }

    /// Initializes the worker and arms the first generation.
    pub fn start(&mut self) -> Result<(), TransportError> {
        self.transport.send(WorkerCommand::Init { theme: self.theme })?;
        let (width, height) = self.viewport;
        self.resize.observe(width, height);
        info!("Maze background starting at {width}x{height}, {} theme", self.theme);
        self.trigger(Trigger::Init, Duration::ZERO);
        Ok(())
    }

    /// Reports the container size.
    pub fn notify_resize(&mut self, width: u32, height: u32) {
        if let Some(event) = self.resize.observe(width, height) {
            self.apply(event);
        }
    }

    /// Reports a mutation of the theme attribute.
    pub fn notify_theme_attribute(&mut self, value: Option<&str>) {
        if let Some(event) = self.themes.observe(value) {
            self.apply(event);
        }
    }

    /// Reports page visibility.
    pub fn notify_visibility(&mut self, visible: bool) {
        if let Some(event) = self.visibility.observe(visible) {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: EnvironmentEvent) {
        if self.disabled {
            return;
        }
        match event {
            EnvironmentEvent::Resized { width, height } => {
                self.viewport = (width, height);
                let delay = if self.first_load {
                    self.timings.first_load_debounce()
                } else {
                    self.timings.resize_debounce()
                };
                self.trigger(Trigger::Resize, delay);
            },
            EnvironmentEvent::ThemeChanged(theme) => {
                self.theme = theme;
                self.trigger(Trigger::ThemeChange, self.timings.fade_out());
            },
            EnvironmentEvent::VisibilityChanged(visible) => {
                self.paused = !visible;
                let command = if visible {
                    WorkerCommand::Resume
                } else {
                    WorkerCommand::Pause
                };
                debug!("Page {}, worker {command:?}", if visible { "visible" } else { "hidden" });
                if let Err(e) = self.transport.send(command) {
                    self.fail(&e);
                }
            },
        }
    }

    /// Invalidates in-flight work, starts the fade-out and arms a
    /// generation for `trigger` after `delay`.
    fn trigger(&mut self, trigger: Trigger, delay: Duration) {
        let id = self.requests.advance();
        self.attempt.cancel();
        self.attempt = CancellationToken::new();
        if self.lifecycle.conceal() {
            debug!("Canvas fading out for {trigger}");
        }
        self.scheduler
            .schedule_after(delay, Action::StartGeneration(trigger), self.attempt.clone());
        debug!("{trigger} armed {id}, generating in {delay:?}");
    }

    /// Advances time by `dt`, runs due timers and processes worker events.
    /// Fades and timers stand still while the page is in the background.
    pub fn update(&mut self, dt: Duration) {
        if self.disabled {
            return;
        }
        if !self.paused {
            if let Some(state) = self.lifecycle.update(dt) {
                debug!("Canvas {state}");
            }
            self.scheduler.advance(dt);
            for fired in self.scheduler.take_due() {
                self.run(fired);
            }
            self.transport.pump();
        }
        while let Some(event) = self.transport.try_recv() {
            self.on_event(event);
        }
    }

    fn run(&mut self, fired: Fired<Action>) {
        match fired.action {
            Action::StartGeneration(trigger) => {
                if self.lifecycle.is_hidden() {
                    self.issue(trigger);
                } else {
                    trace!("Canvas still {}, polling", self.lifecycle.state());
                    self.scheduler
                        .schedule_after(self.timings.hidden_poll(), fired.action, fired.token);
                }
            },
            Action::FadeOutForRegen => {
                let id = self.requests.advance();
                self.lifecycle.conceal();
                debug!("Auto-regenerating as {id}");
                self.scheduler.schedule_after(
                    self.timings.fade_out(),
                    Action::StartGeneration(Trigger::FinishedRegen),
                    fired.token,
                );
            },
        }
    }

    fn issue(&mut self, trigger: Trigger) {
        self.compositor.release();
        self.compositor.set_theme(self.theme);
        let id = self.requests.current();
        let (width, height) = self.viewport;
        let command = WorkerCommand::Generate {
            id,
            trigger,
            theme: self.theme,
            width,
            height,
        };
        match self.transport.send(command) {
            Ok(()) => {
                self.first_load = false;
                self.stats.requests_issued += 1;
                info!("Requested {id} ({trigger}) for {width}x{height}, {} theme", self.theme);
            },
            Err(e) => self.fail(&e),
        }
    }

    fn on_event(&mut self, event: WorkerEvent) {
        let id = event.id();
        if !self.requests.is_current(id) {
            trace!("Dropping stale {} for {id}", event.kind());
            if matches!(event, WorkerEvent::Render { .. }) {
                self.stats.frames_discarded += 1;
            }
            event.discard();
            return;
        }

        match event {
            WorkerEvent::Started { .. } => {
                self.compositor.clear_heads();
                debug!("{id} started");
            },
            WorkerEvent::Render { bitmap, heads, .. } => {
                self.compositor.adopt(bitmap, heads);
                self.stats.frames_adopted += 1;
                if let Err(e) = self.transport.send(WorkerCommand::Ack { id }) {
                    self.fail(&e);
                    return;
                }
                if self.lifecycle.reveal() {
                    debug!("Canvas fading in for {id}");
                }
            },
            WorkerEvent::Finished { .. } => {
                self.stats.jobs_finished += 1;
                let delay = self.timings.auto_regen_delay();
                info!("{id} complete, regenerating in {delay:?}");
                self.scheduler
                    .schedule_after(delay, Action::FadeOutForRegen, self.attempt.clone());
            },
        }
    }

    fn fail(&mut self, error: &TransportError) {
        warn!("Maze background disabled: {error}");
        self.disabled = true;
        self.attempt.cancel();
        self.scheduler.clear();
        self.compositor.release();
    }

    /// Draws the current frame into `frame`. Returns `false` without
    /// drawing while the page is in the background or the effect is
    /// disabled.
    pub fn compose(&mut self, frame: &mut RgbaImage, scroll_y: f32) -> bool {
        if self.paused || self.disabled {
            return false;
        }
        self.compositor.compose(frame, scroll_y, self.lifecycle.opacity());
        true
    }

    /// Canvas state.
    #[must_use]
    pub fn visual_state(&self) -> VisualState {
        self.lifecycle.state()
    }

    /// Canvas fade state machine.
    #[must_use]
    pub fn lifecycle(&self) -> &VisualLifecycle {
        &self.lifecycle
    }

    /// Currently accepted request id.
    #[must_use]
    pub fn current_request(&self) -> RequestId {
        self.requests.current()
    }

    /// Controller counters.
    #[must_use]
    pub fn stats(&self) -> BackgroundStats {
        self.stats
    }

    /// Latest worker counters.
    #[must_use]
    pub fn worker_status(&self) -> WorkerStatus {
        self.transport.status()
    }

    /// Theme the next job will use.
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Last reported container size.
    #[must_use]
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Whether the page is in the background.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the worker failed and the effect stopped.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// The compositor holding the displayed tile.
    #[must_use]
    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Number of armed timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }
}

impl std::fmt::Debug for MazeBackground {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MazeBackground")
            .field("state", &self.lifecycle.state())
            .field("request", &self.requests.current())
            .field("theme", &self.theme)
            .field("viewport", &self.viewport)
            .field("paused", &self.paused)
            .field("disabled", &self.disabled)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazeglow_kernel::GenerationConfig;

    const FRAME: Duration = Duration::from_millis(16);

    fn config() -> EngineConfig {
        EngineConfig {
            generation: GenerationConfig {
                rng_seed: Some(11),
                ..Default::default()
            },
            worker_mode: WorkerMode::Inline,
            ..Default::default()
        }
    }

    fn background() -> MazeBackground {
        MazeBackground::try_new(&config(), Theme::Dark, 240, 240).expect("inline worker")
    }

    fn run_for(bg: &mut MazeBackground, total: Duration) {
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            bg.update(FRAME);
            elapsed += FRAME;
        }
    }

    #[test]
    fn test_first_update_issues_init() {
        let mut bg = background();
        assert_eq!(bg.stats().requests_issued, 0);
        bg.update(FRAME);
        assert_eq!(bg.stats().requests_issued, 1);
        assert_eq!(bg.worker_status().request, Some(bg.current_request()));
    }

    #[test]
    fn test_first_frame_starts_fade_in() {
        let mut bg = background();
        bg.update(FRAME);
        assert_eq!(bg.visual_state(), VisualState::FadingIn);
        assert!(bg.compositor().has_bitmap());
        run_for(&mut bg, Duration::from_millis(900));
        assert_eq!(bg.visual_state(), VisualState::Visible);
    }

    #[test]
    fn test_stale_render_is_discarded() {
        let mut bg = background();
        bg.update(FRAME);
        let stale = bg.current_request();
        bg.notify_resize(300, 300);
        let bitmap = mazeglow_kernel::TileBitmap::new(RgbaImage::new(4, 4));
        bg.on_event(WorkerEvent::Render {
            id: stale,
            bitmap,
            heads: Vec::new(),
        });
        assert_eq!(bg.stats().frames_discarded, 1);
    }

    #[test]
    fn test_stale_started_and_finished_are_ignored() {
        let mut bg = background();
        bg.update(FRAME);
        let first = bg.current_request();
        bg.notify_resize(300, 300);
        let second = bg.current_request();
        bg.notify_theme_attribute(Some("light"));
        assert_ne!(bg.current_request(), second);

        let heads = bg.compositor().heads().to_vec();
        let timers = bg.pending_timers();
        for id in [first, second] {
            bg.on_event(WorkerEvent::Started { id });
            bg.on_event(WorkerEvent::Finished { id });
        }

        assert_eq!(bg.compositor().heads(), heads.as_slice());
        assert_eq!(bg.pending_timers(), timers);
        assert_eq!(bg.stats().jobs_finished, 0);
        assert_eq!(bg.stats().frames_discarded, 0);
    }

    #[test]
    fn test_repeated_resize_is_ignored() {
        let mut bg = background();
        let before = bg.current_request();
        bg.notify_resize(240, 240);
        assert_eq!(bg.current_request(), before);
    }

    #[test]
    fn test_hidden_page_pauses() {
        let mut bg = background();
        bg.update(FRAME);
        bg.notify_visibility(false);
        assert!(bg.is_paused());
        assert!(bg.worker_status().paused);
        let adopted = bg.stats().frames_adopted;
        run_for(&mut bg, Duration::from_millis(200));
        assert_eq!(bg.stats().frames_adopted, adopted);
        let mut frame = RgbaImage::new(16, 16);
        assert!(!bg.compose(&mut frame, 0.0));

        bg.notify_visibility(true);
        bg.update(FRAME);
        assert!(bg.stats().frames_adopted > adopted);
        assert!(bg.compose(&mut frame, 0.0));
    }

    #[test]
    fn test_auto_regeneration_after_finish() {
        let mut bg = background();
        let mut guard = 0;
        while bg.stats().jobs_finished == 0 && guard < 10_000 {
            bg.update(FRAME);
            guard += 1;
        }
        assert_eq!(bg.stats().jobs_finished, 1);
        assert_eq!(bg.pending_timers(), 1);
        let issued = bg.stats().requests_issued;
        run_for(&mut bg, Duration::from_millis(6000 + 800 + 100));
        assert_eq!(bg.stats().requests_issued, issued + 1);
    }

    #[test]
    fn test_background_tab_holds_auto_regeneration() {
        let mut bg = background();
        let mut guard = 0;
        while bg.stats().jobs_finished == 0 && guard < 10_000 {
            bg.update(FRAME);
            guard += 1;
        }
        assert_eq!(bg.stats().jobs_finished, 1);
        let state = bg.visual_state();
        let issued = bg.stats().requests_issued;
        let request = bg.current_request();

        bg.notify_visibility(false);
        run_for(&mut bg, Duration::from_millis(7_000));
        assert_eq!(bg.stats().requests_issued, issued);
        assert_eq!(bg.current_request(), request);
        assert_eq!(bg.visual_state(), state);
        assert_eq!(bg.pending_timers(), 1);

        bg.notify_visibility(true);
        run_for(&mut bg, Duration::from_millis(6000 + 800 + 100));
        assert_eq!(bg.stats().requests_issued, issued + 1);
    }
}
