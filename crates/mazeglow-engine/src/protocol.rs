//! Messages exchanged between the controller and the generation worker.
//!
//! Every message that concerns a job carries the [`RequestId`] the
//! controller issued for it. The receiving side compares it with the id it
//! currently accepts and drops anything else, closing any attached bitmap.

use mazeglow_common::{RequestId, Theme};
use mazeglow_kernel::{HeadMarker, TileBitmap};

/// Why a generation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// First generation after start-up.
    Init,
    /// The container changed size.
    Resize,
    /// The page theme flipped.
    ThemeChange,
    /// The previous maze finished and was faded out.
    FinishedRegen,
}

impl Trigger {
    /// Short name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Resize => "resize",
            Self::ThemeChange => "theme_change",
            Self::FinishedRegen => "finished_regen",
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Controller to worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    /// One-time setup.
    Init {
        /// Initial theme
        theme: Theme,
    },
    /// Start a new job, superseding any job in progress.
    Generate {
        /// Request this job answers
        id: RequestId,
        /// What caused it
        trigger: Trigger,
        /// Theme to draw with
        theme: Theme,
        /// Viewport width in pixels
        width: u32,
        /// Viewport height in pixels
        height: u32,
    },
    /// Stop ticking (page went to the background).
    Pause,
    /// Resume ticking.
    Resume,
    /// The controller has consumed the frame for `id`.
    Ack {
        /// Request whose frame was consumed
        id: RequestId,
    },
    /// Stop the worker.
    Shutdown,
}

/// Worker to controller.
#[derive(Debug)]
pub enum WorkerEvent {
    /// The tile was cleared and seeding is done.
    Started {
        /// Request being served
        id: RequestId,
    },
    /// A new tile snapshot.
    Render {
        /// Request being served
        id: RequestId,
        /// Ownership of the snapshot passes to the receiver
        bitmap: TileBitmap,
        /// Live crawler heads for the glow pass
        heads: Vec<HeadMarker>,
    },
    /// No crawler is left; the maze is complete.
    Finished {
        /// Request that finished
        id: RequestId,
    },
}

impl WorkerEvent {
    /// Request the event belongs to.
    #[must_use]
    pub fn id(&self) -> RequestId {
        match self {
            Self::Started { id } | Self::Render { id, .. } | Self::Finished { id } => *id,
        }
    }

    /// Releases any resource attached to the event.
    pub fn discard(self) {
        if let Self::Render { bitmap, .. } = self {
            bitmap.close();
        }
    }

    /// Short name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Render { .. } => "render",
            Self::Finished { .. } => "finished",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_event_ids() {
        let id = RequestId::from_raw(7);
        let render = WorkerEvent::Render {
            id,
            bitmap: TileBitmap::new(RgbaImage::new(2, 2)),
            heads: Vec::new(),
        };
        assert_eq!(render.id(), id);
        assert_eq!(render.kind(), "render");
        render.discard();
        assert_eq!(WorkerEvent::Finished { id }.id(), id);
    }

    #[test]
    fn test_trigger_names() {
        assert_eq!(Trigger::ThemeChange.to_string(), "theme_change");
        assert_eq!(Trigger::FinishedRegen.as_str(), "finished_regen");
    }
}
