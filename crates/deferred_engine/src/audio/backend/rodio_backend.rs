//! Rodio audio backend implementation
//!
//! Uses the Rodio library for cross-platform playback of WAV and Ogg Vorbis.
//! Each voice is one [`Sink`]; finished sinks are dropped in `update`.
//!
//! # Example
//!
//! ```no_run
//! use deferred_engine::audio::{AudioBackendConfig, AudioSystem, RodioBackend, SoundBuffer};
//!
//! let mut audio = AudioSystem::new(Box::new(RodioBackend::new()), &AudioBackendConfig::default()).unwrap();
//! let sound = SoundBuffer::from_file("assets/audio/click.wav").unwrap();
//! let playback = audio.play(&sound).unwrap();
//!
//! // Once per frame
//! audio.update();
//! if playback.is_finished() {
//!     println!("done");
//! }
//! ```

use std::collections::HashMap;
use std::io::Cursor;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use super::{AudioBackend, AudioBackendConfig, VoiceId};
use crate::audio::{AudioError, SoundBuffer};

/// Rodio-based audio backend
pub struct RodioBackend {
    /// Audio output stream (must be kept alive)
    _output_stream: Option<OutputStream>,
    /// Output stream handle for creating sinks
    stream_handle: Option<OutputStreamHandle>,
    /// Active sinks
    voices: HashMap<VoiceId, Sink>,
    next_id: u32,
    initialized: bool,
}

impl RodioBackend {
    /// Create a new Rodio backend
    pub fn new() -> Self {
        Self {
            _output_stream: None,
            stream_handle: None,
            voices: HashMap::new(),
            next_id: 0,
            initialized: false,
        }
    }

    fn next_voice(&mut self) -> VoiceId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        VoiceId::new(id, 0)
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for RodioBackend {
    fn name(&self) -> &str {
        "rodio"
    }

    fn initialize(&mut self, _config: &AudioBackendConfig) -> Result<(), AudioError> {
        if self.initialized {
            return Ok(());
        }

        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| AudioError::BackendInitFailed(format!("Failed to create audio output: {}", e)))?;

        self._output_stream = Some(stream);
        self.stream_handle = Some(stream_handle);
        self.initialized = true;

        log::info!("Rodio audio backend initialized");
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.stop_all();
        self.stream_handle = None;
        self._output_stream = None;
        self.initialized = false;
        log::info!("Rodio audio backend shutdown");
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn update(&mut self) {
        self.voices.retain(|_, sink| !sink.empty());
    }

    fn play(&mut self, sound: &SoundBuffer) -> Result<VoiceId, AudioError> {
        let stream_handle = self.stream_handle.as_ref().ok_or(AudioError::BackendNotInitialized)?;

        let sink = Sink::try_new(stream_handle)
            .map_err(|e| AudioError::PlaybackFailed(format!("Failed to create sink: {}", e)))?;
        let source = Decoder::new(Cursor::new(sound.shared_data()))
            .map_err(|e| AudioError::PlaybackFailed(format!("Failed to decode audio: {}", e)))?;
        sink.append(source);

        let voice = self.next_voice();
        self.voices.insert(voice, sink);
        Ok(voice)
    }

    fn stop(&mut self, voice: VoiceId) {
        if let Some(sink) = self.voices.remove(&voice) {
            sink.stop();
        }
    }

    fn stop_all(&mut self) {
        for (_, sink) in self.voices.drain() {
            sink.stop();
        }
    }

    fn set_volume(&mut self, voice: VoiceId, volume: f32) -> Result<(), AudioError> {
        let sink = self.voices.get(&voice).ok_or(AudioError::InvalidHandle)?;
        sink.set_volume(volume);
        Ok(())
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        self.voices
            .get(&voice)
            .map(|sink| !sink.is_paused() && !sink.empty())
            .unwrap_or(false)
    }
}
