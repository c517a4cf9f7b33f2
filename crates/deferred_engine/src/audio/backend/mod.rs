//! Audio backend implementations
//!
//! Platform-independent abstraction over audio playback libraries.

#[cfg(feature = "audio")]
pub mod rodio_backend;

use std::collections::HashSet;

use super::{AudioError, SoundBuffer};

/// Identifies one voice inside a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId {
    /// Unique identifier for the voice
    pub id: u32,
    /// Generation counter for handle validation
    pub generation: u32,
}

impl VoiceId {
    /// Create a voice id
    pub fn new(id: u32, generation: u32) -> Self {
        Self { id, generation }
    }
}

/// Audio backend trait for platform abstraction
///
/// Single-threaded: the engine owns the backend through
/// [`AudioSystem`](super::AudioSystem) and drives it from the frame loop.
pub trait AudioBackend {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Open the output device
    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError>;

    /// Stop everything and close the device
    fn shutdown(&mut self);

    /// Check if backend is initialized
    fn is_initialized(&self) -> bool;

    /// Per-frame housekeeping (drop finished voices)
    fn update(&mut self);

    /// Start playing a sound
    fn play(&mut self, sound: &SoundBuffer) -> Result<VoiceId, AudioError>;

    /// Stop a voice; unknown voices are ignored
    fn stop(&mut self, voice: VoiceId);

    /// Stop all playing voices
    fn stop_all(&mut self);

    /// Set volume of a voice (0.0 = silent, 1.0 = full volume)
    fn set_volume(&mut self, voice: VoiceId, volume: f32) -> Result<(), AudioError>;

    /// Check if a voice is still producing sound
    fn is_playing(&self, voice: VoiceId) -> bool;
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Sample rate (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of output channels (1=mono, 2=stereo)
    pub channels: u16,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
        }
    }
}

/// Backend that accepts every sound and plays nothing.
///
/// Voices end at the next `update` unless the backend is built with
/// [`NullAudioBackend::with_held_voices`], in which case they last until
/// stopped.
#[derive(Debug, Default)]
pub struct NullAudioBackend {
    voices: HashSet<VoiceId>,
    next_id: u32,
    initialized: bool,
    hold_voices: bool,
}

impl NullAudioBackend {
    /// Create an uninitialized backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep voices playing until explicitly stopped
    pub fn with_held_voices(mut self) -> Self {
        self.hold_voices = true;
        self
    }
}

impl AudioBackend for NullAudioBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError> {
        log::debug!("Null audio backend initialized ({} Hz, {} ch)", config.sample_rate, config.channels);
        self.initialized = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.voices.clear();
        self.initialized = false;
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn update(&mut self) {
        if !self.hold_voices {
            self.voices.clear();
        }
    }

    fn play(&mut self, _sound: &SoundBuffer) -> Result<VoiceId, AudioError> {
        if !self.initialized {
            return Err(AudioError::BackendNotInitialized);
        }
        let voice = VoiceId::new(self.next_id, 0);
        self.next_id = self.next_id.wrapping_add(1);
        self.voices.insert(voice);
        Ok(voice)
    }

    fn stop(&mut self, voice: VoiceId) {
        self.voices.remove(&voice);
    }

    fn stop_all(&mut self) {
        self.voices.clear();
    }

    fn set_volume(&mut self, voice: VoiceId, _volume: f32) -> Result<(), AudioError> {
        if self.voices.contains(&voice) {
            Ok(())
        } else {
            Err(AudioError::InvalidHandle)
        }
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        self.voices.contains(&voice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_requires_initialize() {
        let mut backend = NullAudioBackend::new();
        let sound = SoundBuffer::from_bytes(b"OggS0000".to_vec()).unwrap();
        assert_eq!(backend.play(&sound), Err(AudioError::BackendNotInitialized));

        backend.initialize(&AudioBackendConfig::default()).unwrap();
        let voice = backend.play(&sound).unwrap();
        assert!(backend.is_playing(voice));
        backend.update();
        assert!(!backend.is_playing(voice));
        assert_eq!(backend.set_volume(voice, 0.5), Err(AudioError::InvalidHandle));
    }
}
