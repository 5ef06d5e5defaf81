use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::models::LiveError;

/// What the local stream is currently capturing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Camera,
    Screen,
}

/// A held local capture resource. Real audio/video transport is a
/// collaborator concern; the protocol core only acquires/releases the
/// resource and toggles track enablement to mirror the mute/camera flags.
#[derive(Debug)]
pub struct LocalMedia {
    kind: MediaKind,
    audio_enabled: bool,
    video_enabled: bool,
}

impl LocalMedia {
    pub fn new(kind: MediaKind) -> Self {
        Self { kind, audio_enabled: true, video_enabled: true }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.audio_enabled = enabled;
    }

    pub fn set_video_enabled(&mut self, enabled: bool) {
        self.video_enabled = enabled;
    }

    /// Release the capture resource. Idempotent by construction: the value
    /// is consumed.
    pub fn stop(self) {
        debug!("Stopping local {:?} tracks", self.kind);
    }
}

/// Source of local capture resources. Acquisition is the one suspending,
/// fallible operation in the room flow; it must never block signal
/// handling, and denial must not abort a join.
pub trait MediaDevices: Send + Sync {
    fn acquire_camera(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<LocalMedia, LiveError>> + Send + '_>>;

    fn acquire_screen(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<LocalMedia, LiveError>> + Send + '_>>;
}

/// Device source that grants every request, for embeddings that do their own
/// capture (or none at all).
#[derive(Default)]
pub struct UnrestrictedMedia;

impl MediaDevices for UnrestrictedMedia {
    fn acquire_camera(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<LocalMedia, LiveError>> + Send + '_>> {
        Box::pin(async { Ok(LocalMedia::new(MediaKind::Camera)) })
    }

    fn acquire_screen(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<LocalMedia, LiveError>> + Send + '_>> {
        Box::pin(async { Ok(LocalMedia::new(MediaKind::Screen)) })
    }
}

/// Device source with per-kind grant switches, mirroring a user denying the
/// browser permission prompts.
pub struct GatedMedia {
    pub allow_camera: bool,
    pub allow_screen: bool,
}

impl MediaDevices for GatedMedia {
    fn acquire_camera(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<LocalMedia, LiveError>> + Send + '_>> {
        let allowed = self.allow_camera;
        Box::pin(async move {
            if allowed {
                Ok(LocalMedia::new(MediaKind::Camera))
            } else {
                Err(LiveError::DeviceAccessDenied("permission dismissed".to_string()))
            }
        })
    }

    fn acquire_screen(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<LocalMedia, LiveError>> + Send + '_>> {
        let allowed = self.allow_screen;
        Box::pin(async move {
            if allowed {
                Ok(LocalMedia::new(MediaKind::Screen))
            } else {
                Err(LiveError::ScreenShareFailed("capture request cancelled".to_string()))
            }
        })
    }
}
