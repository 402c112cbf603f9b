//! # Mazeglow Engine
//!
//! Everything around the maze generator that makes it a page background:
//!
//! - [`worker`] and [`transport`]: the generation worker and the channel
//!   seam between it and the controller
//! - [`protocol`]: the request-id tagged messages crossing that seam
//! - [`compositor`]: tiling, scroll offset and head glows
//! - [`lifecycle`] and [`scheduler`]: canvas fades and cancellable timers
//! - [`watchers`]: resize, theme and visibility notifications
//! - [`controller`]: [`MazeBackground`], which ties them together
//! - [`config`]: the TOML configuration file

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod compositor;
pub mod config;
pub mod controller;
pub mod lifecycle;
pub mod protocol;
pub mod scheduler;
pub mod timing;
pub mod transport;
pub mod watchers;
pub mod worker;

#[cfg(test)]
mod e2e_tests;

pub use compositor::Compositor;
pub use config::{EngineConfig, LifecycleTimings, PaletteSpec, WorkerMode};
pub use controller::{BackgroundStats, MazeBackground};
pub use lifecycle::{FadeEasing, VisualLifecycle, VisualState};
pub use protocol::{Trigger, WorkerCommand, WorkerEvent};
pub use scheduler::{CancellationToken, Scheduler};
pub use timing::FrameTiming;
pub use transport::{InlineTransport, ThreadedTransport, Transport};
pub use watchers::{EnvironmentEvent, ResizeWatcher, ThemeWatcher, VisibilityWatcher};
pub use worker::{WorkerCore, WorkerSettings, WorkerStatus};
