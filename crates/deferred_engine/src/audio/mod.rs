//! Audio playback
//!
//! Sounds are decoded-on-play byte buffers ([`SoundBuffer`]) handed to an
//! [`AudioBackend`] through the [`AudioSystem`]. Every playback returns a
//! [`PlaybackHandle`] the caller can poll or stop; the system reaps finished
//! playbacks in [`AudioSystem::update`], once per frame. Nothing runs on a
//! detached thread.

pub mod backend;

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use thiserror::Error;

pub use backend::{AudioBackend, AudioBackendConfig, NullAudioBackend, VoiceId};

#[cfg(feature = "audio")]
pub use backend::rodio_backend::RodioBackend;

/// Audio errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// The output device could not be opened
    #[error("Audio backend initialization failed: {0}")]
    BackendInitFailed(String),

    /// Playback was requested before `initialize`
    #[error("Audio backend is not initialized")]
    BackendNotInitialized,

    /// Voice does not exist (finished or never started)
    #[error("Invalid voice handle")]
    InvalidHandle,

    /// Bytes are not a supported audio file
    #[error("Unsupported audio data: {0}")]
    UnsupportedFormat(String),

    /// Decoding or sink creation failed
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// File could not be read
    #[error("Audio IO error: {0}")]
    Io(String),
}

/// Encoded container of a sound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// RIFF WAVE
    Wav,
    /// Ogg Vorbis
    Ogg,
}

impl AudioFormat {
    /// Detect the container from magic bytes
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match bytes.get(0..4)? {
            b"RIFF" => Some(AudioFormat::Wav),
            b"OggS" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }
}

/// Immutable encoded sound, cheap to clone and share between playbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundBuffer {
    data: Arc<[u8]>,
    format: AudioFormat,
}

impl SoundBuffer {
    /// Wrap encoded bytes; the container must be recognized
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, AudioError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(AudioError::UnsupportedFormat("empty audio data".to_string()));
        }
        let format = AudioFormat::detect(&bytes)
            .ok_or_else(|| AudioError::UnsupportedFormat("unknown container".to_string()))?;
        Ok(Self {
            data: bytes.into(),
            format,
        })
    }

    /// Read a sound file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| AudioError::Io(format!("{}: {}", path.display(), e)))?;
        log::debug!("Loaded sound {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(bytes)
    }

    /// Encoded bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Shared encoded bytes
    pub fn shared_data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    /// Container format
    pub fn format(&self) -> AudioFormat {
        self.format
    }
}

#[derive(Debug, Default)]
struct PlaybackState {
    stop_requested: Cell<bool>,
    finished: Cell<bool>,
}

/// Caller's view of one playback
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    voice: VoiceId,
    state: Rc<PlaybackState>,
}

impl PlaybackHandle {
    /// Backend voice behind this playback
    pub fn voice(&self) -> VoiceId {
        self.voice
    }

    /// True once the sound has ended or been stopped
    pub fn is_finished(&self) -> bool {
        self.state.finished.get()
    }

    /// Request the playback to stop; applied by the next [`AudioSystem::update`]
    pub fn stop(&self) {
        self.state.stop_requested.set(true);
    }
}

/// Owns the backend and every live playback
pub struct AudioSystem {
    backend: Box<dyn AudioBackend>,
    playbacks: Vec<PlaybackHandle>,
    master_volume: f32,
}

impl AudioSystem {
    /// Initialize `backend` and wrap it
    pub fn new(mut backend: Box<dyn AudioBackend>, config: &AudioBackendConfig) -> Result<Self, AudioError> {
        backend.initialize(config)?;
        Ok(Self {
            backend,
            playbacks: Vec::new(),
            master_volume: 1.0,
        })
    }

    /// System that plays nothing
    pub fn silent() -> Self {
        let mut backend = NullAudioBackend::new();
        if let Err(e) = backend.initialize(&AudioBackendConfig::default()) {
            log::warn!("Null audio backend failed to initialize: {}", e);
        }
        Self {
            backend: Box::new(backend),
            playbacks: Vec::new(),
            master_volume: 1.0,
        }
    }

    /// Start a playback at full volume
    pub fn play(&mut self, sound: &SoundBuffer) -> Result<PlaybackHandle, AudioError> {
        self.play_with_volume(sound, 1.0)
    }

    /// Start a playback at `volume` (scaled by the master volume)
    pub fn play_with_volume(&mut self, sound: &SoundBuffer, volume: f32) -> Result<PlaybackHandle, AudioError> {
        let voice = self.backend.play(sound)?;
        self.backend.set_volume(voice, volume.max(0.0) * self.master_volume)?;
        let handle = PlaybackHandle {
            voice,
            state: Rc::new(PlaybackState::default()),
        };
        self.playbacks.push(handle.clone());
        log::trace!("Playing {:?} on {:?}", sound.format(), voice);
        Ok(handle)
    }

    /// Apply stop requests and reap finished playbacks
    pub fn update(&mut self) {
        self.backend.update();
        let backend = &mut self.backend;
        self.playbacks.retain(|playback| {
            if playback.state.stop_requested.get() {
                backend.stop(playback.voice);
            } else if backend.is_playing(playback.voice) {
                return true;
            }
            playback.state.finished.set(true);
            false
        });
    }

    /// Stop every playback now
    pub fn stop_all(&mut self) {
        self.backend.stop_all();
        for playback in self.playbacks.drain(..) {
            playback.state.finished.set(true);
        }
    }

    /// Set the master volume applied to new playbacks
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    /// Number of playbacks not yet reaped
    pub fn active_count(&self) -> usize {
        self.playbacks.len()
    }

    /// Stop everything and close the output device
    pub fn shutdown(&mut self) {
        self.stop_all();
        self.backend.shutdown();
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        if self.backend.is_initialized() {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for AudioSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSystem")
            .field("backend", &self.backend.name())
            .field("playbacks", &self.playbacks.len())
            .field("master_volume", &self.master_volume)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav() -> SoundBuffer {
        SoundBuffer::from_bytes(b"RIFF\0\0\0\0WAVEfmt ".to_vec()).unwrap()
    }

    fn held_system() -> AudioSystem {
        AudioSystem::new(Box::new(NullAudioBackend::new().with_held_voices()), &AudioBackendConfig::default())
            .unwrap()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(AudioFormat::detect(b"RIFF....WAVE"), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::detect(b"OggS...."), Some(AudioFormat::Ogg));
        assert_eq!(AudioFormat::detect(b"ABCD"), None);
        assert_eq!(AudioFormat::detect(b"RI"), None);
    }

    #[test]
    fn test_empty_or_unknown_data_fails() {
        assert!(matches!(SoundBuffer::from_bytes(Vec::new()), Err(AudioError::UnsupportedFormat(_))));
        assert!(matches!(SoundBuffer::from_bytes(b"ABCD".to_vec()), Err(AudioError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_buffers_share_bytes() {
        let a = wav();
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.shared_data(), &b.shared_data()));
    }

    #[test]
    fn test_finished_playbacks_are_reaped() {
        let mut audio = AudioSystem::silent();
        let handle = audio.play(&wav()).unwrap();
        assert!(!handle.is_finished());
        assert_eq!(audio.active_count(), 1);

        audio.update();
        assert!(handle.is_finished());
        assert_eq!(audio.active_count(), 0);
    }

    #[test]
    fn test_stop_is_applied_on_update() {
        let mut audio = held_system();
        let keep = audio.play(&wav()).unwrap();
        let stop = audio.play(&wav()).unwrap();

        stop.stop();
        assert!(!stop.is_finished());
        audio.update();

        assert!(stop.is_finished());
        assert!(!keep.is_finished());
        assert_eq!(audio.active_count(), 1);
    }

    #[test]
    fn test_stop_all_finishes_every_handle() {
        let mut audio = held_system();
        let handles: Vec<_> = (0..3).map(|_| audio.play(&wav()).unwrap()).collect();
        audio.stop_all();
        assert!(handles.iter().all(PlaybackHandle::is_finished));
        assert_eq!(audio.active_count(), 0);
    }
}
