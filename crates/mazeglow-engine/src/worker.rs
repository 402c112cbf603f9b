//! Generation worker state machine.
//!
//! [`WorkerCore`] is the part of the worker that does not care which thread
//! it runs on. It turns [`WorkerCommand`]s into job changes and produces
//! [`WorkerEvent`]s from [`WorkerCore::tick`]. The transports in
//! [`crate::transport`] drive it either on a background thread or inline.

use mazeglow_common::{JobId, MazeResult, Palette, RequestId, Theme};
use mazeglow_kernel::{GenerationConfig, GenerationSession, JobPhase};
use tracing::{debug, info, trace};

use crate::config::EngineConfig;
use crate::protocol::{WorkerCommand, WorkerEvent};

/// Everything the worker needs to run jobs.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSettings {
    /// Generator parameters
    pub generation: GenerationConfig,
    /// Palette for the dark theme
    pub dark: Palette,
    /// Palette for the light theme
    pub light: Palette,
    /// Hold back frames until the previous one is acknowledged
    pub backpressure: bool,
}

impl WorkerSettings {
    /// Builds settings from the engine configuration.
    pub fn from_config(config: &EngineConfig) -> MazeResult<Self> {
        Ok(Self {
            generation: config.generation.clone(),
            dark: config.palette(Theme::Dark)?,
            light: config.palette(Theme::Light)?,
            backpressure: config.backpressure,
        })
    }

    fn palette(&self, theme: Theme) -> Palette {
        match theme {
            Theme::Dark => self.dark.clone(),
            Theme::Light => self.light.clone(),
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            dark: Palette::dark(),
            light: Palette::light(),
            backpressure: true,
        }
    }
}

/// Snapshot of worker counters, shared with the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkerStatus {
    /// Latest job number
    pub job: JobId,
    /// Request served by the current job
    pub request: Option<RequestId>,
    /// Phase of the current job
    pub phase: Option<JobPhase>,
    /// Whether ticking is paused
    pub paused: bool,
    /// Whether a frame is waiting for its ack
    pub awaiting_ack: bool,
    /// Jobs started so far
    pub jobs_started: u64,
    /// Render events produced
    pub frames_sent: u64,
    /// Render events dropped by the transport
    pub frames_dropped: u64,
}

struct ActiveJob {
    request: RequestId,
    session: GenerationSession,
    finished: bool,
}

/// Thread-agnostic worker logic.
pub struct WorkerCore {
    settings: WorkerSettings,
    theme: Theme,
    initialized: bool,
    job: JobId,
    active: Option<ActiveJob>,
    paused: bool,
    awaiting_ack: Option<RequestId>,
    jobs_started: u64,
    frames_sent: u64,
    frames_dropped: u64,
}

impl WorkerCore {
    /// Creates an idle worker.
    #[must_use]
    pub fn new(settings: WorkerSettings) -> Self {
        Self {
            settings,
            theme: Theme::Dark,
            initialized: false,
            job: JobId::default(),
            active: None,
            paused: false,
            awaiting_ack: None,
            jobs_started: 0,
            frames_sent: 0,
            frames_dropped: 0,
        }
    }

    /// Applies one command. Returns the events it produced immediately.
    pub fn handle(&mut self, command: WorkerCommand) -> Vec<WorkerEvent> {
        match command {
            WorkerCommand::Init { theme } => {
                self.theme = theme;
                self.initialized = true;
                debug!("Worker initialized with {theme} theme");
                Vec::new()
            },
            WorkerCommand::Generate {
                id,
                trigger,
                theme,
                width,
                height,
            } => {
                if !self.initialized {
                    debug!("Generate before init; initializing with {theme} theme");
                    self.initialized = true;
                }
                self.theme = theme;
                self.job = self.job.next();
                if let Some(previous) = self.active.take() {
                    trace!("{} superseded {}", self.job, previous.request);
                }

                let mut session = GenerationSession::for_viewport(
                    self.settings.generation.clone(),
                    self.settings.palette(theme),
                    width,
                    height,
                );
                session.seed();
                info!(
                    "{} for {id} ({trigger}): {}px tile, {} seeds, {theme} theme",
                    self.job,
                    session.tile_size_px(),
                    session.crawler_count()
                );

                self.active = Some(ActiveJob {
                    request: id,
                    session,
                    finished: false,
                });
                self.awaiting_ack = None;
                self.jobs_started += 1;
                vec![WorkerEvent::Started { id }]
            },
            WorkerCommand::Pause => {
                self.paused = true;
                Vec::new()
            },
            WorkerCommand::Resume => {
                self.paused = false;
                Vec::new()
            },
            WorkerCommand::Ack { id } => {
                if self.awaiting_ack == Some(id) {
                    self.awaiting_ack = None;
                } else {
                    trace!("Ignoring ack for {id}");
                }
                Vec::new()
            },
            WorkerCommand::Shutdown => {
                self.active = None;
                Vec::new()
            },
        }
    }

    /// Advances the current job by one frame.
    pub fn tick(&mut self) -> Vec<WorkerEvent> {
        if self.paused || (self.settings.backpressure && self.awaiting_ack.is_some()) {
            return Vec::new();
        }
        let Some(job) = self.active.as_mut() else {
            return Vec::new();
        };
        if job.finished {
            return Vec::new();
        }

        let report = job.session.tick();
        let id = job.request;
        let mut events = vec![WorkerEvent::Render {
            id,
            bitmap: job.session.snapshot(),
            heads: job.session.heads(),
        }];
        self.frames_sent += 1;
        if self.settings.backpressure {
            self.awaiting_ack = Some(id);
        }

        if report.is_complete() {
            job.finished = true;
            info!(
                "{} finished after {} ticks",
                self.job,
                job.session.ticks()
            );
            events.push(WorkerEvent::Finished { id });
        }
        events
    }

    /// Called by a transport that had to drop a render event.
    pub fn frame_dropped(&mut self) {
        self.frames_dropped += 1;
        self.awaiting_ack = None;
    }

    /// Whether the current job still has work to do.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        !self.paused && self.active.as_ref().is_some_and(|job| !job.finished)
    }

    /// Current counters.
    #[must_use]
    pub fn status(&self) -> WorkerStatus {
        WorkerStatus {
            job: self.job,
            request: self.active.as_ref().map(|job| job.request),
            phase: self.active.as_ref().map(|job| job.session.phase()),
            paused: self.paused,
            awaiting_ack: self.awaiting_ack.is_some(),
            jobs_started: self.jobs_started,
            frames_sent: self.frames_sent,
            frames_dropped: self.frames_dropped,
        }
    }
}
