//! Audio director
//!
//! Maps game events to procedurally described cues and music mode hints.
//! The actual sound output is a pluggable backend; without one (or if it
//! fails to open) the director stays silent and the game carries on.

use crate::error::AudioError;
use crate::settings::Settings;
use crate::sim::{GameEvent, MusicMode};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Bird flaps
    Jump,
    /// Pipe passed
    Score,
    /// Hit a pipe or left the playfield
    Crash,
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
}

/// A single oscillator sweep with an exponential fade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub freq_start: f32,
    pub freq_end: f32,
    /// Seconds
    pub duration: f32,
    /// Peak gain before volume scaling
    pub gain: f32,
}

impl SoundEffect {
    pub fn tone(self) -> Tone {
        match self {
            // Rising chirp
            SoundEffect::Jump => Tone {
                waveform: Waveform::Sine,
                freq_start: 300.0,
                freq_end: 600.0,
                duration: 0.1,
                gain: 0.3,
            },
            SoundEffect::Score => Tone {
                waveform: Waveform::Square,
                freq_start: 1000.0,
                freq_end: 1500.0,
                duration: 0.1,
                gain: 0.1,
            },
            // Low buzz falling away
            SoundEffect::Crash => Tone {
                waveform: Waveform::Sawtooth,
                freq_start: 150.0,
                freq_end: 50.0,
                duration: 0.3,
                gain: 0.3,
            },
        }
    }
}

/// Beat interval for a music mode
pub fn music_tempo_ms(mode: MusicMode) -> u32 {
    match mode {
        MusicMode::Ambient => 800,
        MusicMode::Melodic => 300,
        MusicMode::Intense => 150,
    }
}

/// Sound output
pub trait AudioBackend: Send {
    /// Play one tone at the given volume (0.0 - 1.0)
    fn play_tone(&mut self, tone: &Tone, volume: f32);

    /// Start, switch or stop (`None`) the background music
    fn set_music(&mut self, mode: Option<MusicMode>, volume: f32);

    /// Release device resources
    fn close(&mut self) {}
}

/// Backend that only logs what it would play (headless runs)
#[derive(Debug, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn play_tone(&mut self, tone: &Tone, volume: f32) {
        log::trace!(
            "tone {:?} {}->{} Hz for {}s at {:.2}",
            tone.waveform,
            tone.freq_start,
            tone.freq_end,
            tone.duration,
            volume
        );
    }

    fn set_music(&mut self, mode: Option<MusicMode>, volume: f32) {
        match mode {
            Some(mode) => log::debug!(
                "music {:?} every {} ms at {:.2}",
                mode,
                music_tempo_ms(mode),
                volume
            ),
            None => log::debug!("music stopped"),
        }
    }
}

/// Audio service owned by the session
pub struct AudioDirector {
    backend: Option<Box<dyn AudioBackend>>,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
    music: Option<MusicMode>,
}

impl Default for AudioDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AudioDirector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDirector")
            .field("active", &self.is_active())
            .field("muted", &self.muted)
            .field("music", &self.music)
            .finish()
    }
}

impl AudioDirector {
    /// Silent until `start` succeeds
    pub fn new() -> Self {
        let settings = Settings::default();
        Self {
            backend: None,
            master_volume: settings.master_volume,
            sfx_volume: settings.sfx_volume,
            music_volume: settings.music_volume,
            muted: settings.muted,
            music: None,
        }
    }

    /// Open the output. A failing backend leaves the director silent.
    pub fn start<F>(&mut self, open: F)
    where
        F: FnOnce() -> Result<Box<dyn AudioBackend>, AudioError>,
    {
        self.dispose();
        match open() {
            Ok(backend) => {
                self.backend = Some(backend);
                log::info!("Audio started");
            }
            Err(e) => log::warn!("{e} - audio disabled"),
        }
    }

    /// Stop music and release the backend
    pub fn dispose(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.set_music(None, 0.0);
            backend.close();
            log::info!("Audio disposed");
        }
        self.music = None;
    }

    pub fn is_active(&self) -> bool {
        self.backend.is_some()
    }

    pub fn music_mode(&self) -> Option<MusicMode> {
        self.music
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = settings.music_volume.clamp(0.0, 1.0);
        self.set_muted(settings.muted);
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
        self.refresh_music();
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.refresh_music();
    }

    fn sfx_level(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    fn music_level(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.music_volume
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.sfx_level();
        if vol <= 0.0 {
            return;
        }
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        backend.play_tone(&effect.tone(), vol);
    }

    /// Switch background music, `None` stops it
    pub fn set_music(&mut self, mode: Option<MusicMode>) {
        if self.music == mode {
            return;
        }
        self.music = mode;
        self.refresh_music();
    }

    fn refresh_music(&mut self) {
        let level = self.music_level();
        let mode = self.music;
        if let Some(backend) = self.backend.as_mut() {
            backend.set_music(mode, level);
        }
    }

    /// Event to cue mapping
    pub fn on_event(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::Jumped => self.play(SoundEffect::Jump),
            GameEvent::ScoreChanged { .. } => self.play(SoundEffect::Score),
            GameEvent::RunStarted { tier } => self.set_music(Some(tier.music_mode())),
            GameEvent::TierChanged { tier, .. } => self.set_music(Some(tier.music_mode())),
            GameEvent::GameOver { .. } => {
                self.play(SoundEffect::Crash);
                self.set_music(None);
            }
            // Title screen is silent until the next run starts
            GameEvent::Reset => self.set_music(None),
            GameEvent::MultiplierChanged { .. } | GameEvent::Resumed => {}
        }
    }
}

impl Drop for AudioDirector {
    fn drop(&mut self) {
        self.dispose();
    }
}
