//! Two-bus mixer: master gain feeding an ambient bus (background loop) and an
//! effects bus (one-shots and procedural tones).
//!
//! `AudioManager` holds the rules (mute, volume clamping, one ambient loop at
//! a time, buffer cache). The platform audio graph is behind `AudioBackend`;
//! `web::WebAudioBackend` is the Web Audio implementation.

use std::collections::HashMap;

use crate::error::AudioError;

pub mod web;

/// Ambient bus gain right after `init`.
pub const AMBIENT_BUS_GAIN: f32 = 0.3;
/// Effects bus gain right after `init`.
pub const EFFECTS_BUS_GAIN: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bus {
    Ambient,
    Effects,
}

/// Per-call playback settings for a sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectOptions {
    pub volume: f32,
    pub looping: bool,
    pub rate: f32,
}

impl Default for EffectOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            looping: false,
            rate: 1.0,
        }
    }
}

impl EffectOptions {
    pub fn with_volume(volume: f32) -> Self {
        Self {
            volume,
            ..Self::default()
        }
    }
}

/// A short oscillator sweep: frequency steps at offsets from the start, and
/// an exponential gain decay over `duration` seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tone {
    pub steps: &'static [(f64, f32)],
    pub start_gain: f32,
    pub end_gain: f32,
    pub duration: f64,
}

/// Soft interaction click.
pub const CLICK: Tone = Tone {
    steps: &[(0.0, 800.0)],
    start_gain: 0.1,
    end_gain: 0.01,
    duration: 0.1,
};

/// Rising C5 / E5 / G5 arpeggio.
pub const SUCCESS: Tone = Tone {
    steps: &[(0.0, 523.25), (0.1, 659.25), (0.2, 783.99)],
    start_gain: 0.2,
    end_gain: 0.01,
    duration: 0.4,
};

/// A3 sliding to a dissonant G#3.
pub const FAILURE: Tone = Tone {
    steps: &[(0.0, 220.0), (0.15, 207.65)],
    start_gain: 0.15,
    end_gain: 0.01,
    duration: 0.3,
};

/// The platform audio graph as seen by the manager.
pub trait AudioBackend {
    /// A decoded sample.
    type Buffer: Clone;

    fn set_master_gain(&mut self, gain: f32);
    fn set_bus_gain(&mut self, bus: Bus, gain: f32);
    /// Linear ramp from the current value to `target` over `seconds`.
    fn ramp_bus_gain(&mut self, bus: Bus, target: f32, seconds: f64);
    /// Wakes a suspended context (autoplay policies).
    fn resume(&mut self);
    fn play_buffer(
        &mut self,
        bus: Bus,
        buffer: &Self::Buffer,
        options: EffectOptions,
    ) -> Result<(), AudioError>;
    fn play_tone(&mut self, tone: &Tone) -> Result<(), AudioError>;
    /// Stops whatever is playing on the bus.
    fn stop_bus(&mut self, bus: Bus);
    /// Releases the underlying context.
    fn close(&mut self);
}

/// What a sample playback request turned into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Playback {
    Started,
    /// Uninitialized or muted; nothing happened.
    Skipped,
    /// Already playing (ambient only).
    AlreadyPlaying,
    /// The sample is not cached yet; fetch it, `insert_buffer`, and retry.
    NeedsLoad(String),
}

pub struct AudioManager<B: AudioBackend> {
    backend: Option<B>,
    buffers: HashMap<String, B::Buffer>,
    ambient: Option<String>,
    muted: bool,
    volume: f32,
}

impl<B: AudioBackend> Default for AudioManager<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: AudioBackend> AudioManager<B> {
    pub fn new() -> Self {
        Self {
            backend: None,
            buffers: HashMap::new(),
            ambient: None,
            muted: false,
            volume: 1.0,
        }
    }

    /// Builds the graph. Must run from a user gesture in browsers. Calling
    /// again once initialized does nothing; a failed build is logged and the
    /// manager stays silent.
    pub fn init<F>(&mut self, make_backend: F)
    where
        F: FnOnce() -> Result<B, AudioError>,
    {
        if self.backend.is_some() {
            return;
        }
        match make_backend() {
            Ok(mut backend) => {
                backend.set_bus_gain(Bus::Ambient, AMBIENT_BUS_GAIN);
                backend.set_bus_gain(Bus::Effects, EFFECTS_BUS_GAIN);
                backend.set_master_gain(self.master_gain());
                self.backend = Some(backend);
                tracing::info!("audio system initialized");
            }
            Err(err) => tracing::error!(%err, "failed to initialize audio"),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_ambient_playing(&self) -> bool {
        self.ambient.is_some()
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn has_buffer(&self, url: &str) -> bool {
        self.buffers.contains_key(url)
    }

    pub fn insert_buffer(&mut self, url: &str, buffer: B::Buffer) {
        self.buffers.insert(url.to_string(), buffer);
    }

    fn master_gain(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    /// The backend, but only when sound should come out.
    fn audible(&mut self) -> Option<&mut B> {
        if self.muted {
            return None;
        }
        self.backend.as_mut()
    }

    /// Plays a cached sample on the effects bus.
    pub fn play_effect(&mut self, url: &str, options: EffectOptions) -> Playback {
        let Some(buffer) = self.buffers.get(url).cloned() else {
            if self.audible().is_none() {
                return Playback::Skipped;
            }
            return Playback::NeedsLoad(url.to_string());
        };
        let Some(backend) = self.audible() else {
            return Playback::Skipped;
        };
        backend.resume();
        match backend.play_buffer(Bus::Effects, &buffer, options) {
            Ok(()) => Playback::Started,
            Err(err) => {
                tracing::error!(%err, url, "error playing effect");
                Playback::Skipped
            }
        }
    }

    /// Starts the looping ambient track unless one is already going.
    pub fn start_ambient(&mut self, url: &str) -> Playback {
        if self.ambient.is_some() {
            return Playback::AlreadyPlaying;
        }
        let Some(buffer) = self.buffers.get(url).cloned() else {
            if self.audible().is_none() {
                return Playback::Skipped;
            }
            return Playback::NeedsLoad(url.to_string());
        };
        let Some(backend) = self.audible() else {
            return Playback::Skipped;
        };
        backend.resume();
        let options = EffectOptions {
            looping: true,
            ..EffectOptions::default()
        };
        match backend.play_buffer(Bus::Ambient, &buffer, options) {
            Ok(()) => {
                self.ambient = Some(url.to_string());
                Playback::Started
            }
            Err(err) => {
                tracing::error!(%err, url, "error starting ambient");
                Playback::Skipped
            }
        }
    }

    pub fn stop_ambient(&mut self) {
        if self.ambient.take().is_some() {
            if let Some(backend) = self.backend.as_mut() {
                backend.stop_bus(Bus::Ambient);
            }
        }
    }

    /// Ramps the ambient bus to `target` over `seconds`.
    pub fn fade_ambient(&mut self, target: f32, seconds: f64) {
        if let Some(backend) = self.backend.as_mut() {
            backend.ramp_bus_gain(Bus::Ambient, target.clamp(0.0, 1.0), seconds.max(0.0));
        }
    }

    fn play_tone(&mut self, tone: &Tone) {
        let Some(backend) = self.audible() else { return };
        backend.resume();
        if let Err(err) = backend.play_tone(tone) {
            tracing::warn!(%err, "tone failed");
        }
    }

    pub fn play_click(&mut self) {
        self.play_tone(&CLICK);
    }

    pub fn play_success(&mut self) {
        self.play_tone(&SUCCESS);
    }

    pub fn play_failure(&mut self) {
        self.play_tone(&FAILURE);
    }

    /// Flips mute and returns the new state. Unmuting restores the volume.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        let gain = self.master_gain();
        if let Some(backend) = self.backend.as_mut() {
            backend.set_master_gain(gain);
        }
        self.muted
    }

    /// Sets master volume, clamped to `[0, 1]`. While muted the value is
    /// remembered and applied on unmute.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        let gain = self.master_gain();
        if let Some(backend) = self.backend.as_mut() {
            backend.set_master_gain(gain);
        }
    }

    /// Silences every effect and the ambient loop.
    pub fn stop_all(&mut self) {
        if let Some(backend) = self.backend.as_mut() {
            backend.stop_bus(Bus::Effects);
        }
        self.stop_ambient();
    }

    /// Stops everything and closes the context. `init` may be called again.
    pub fn teardown(&mut self) {
        self.stop_all();
        if let Some(mut backend) = self.backend.take() {
            backend.close();
        }
    }
}
