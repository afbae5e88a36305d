pub mod chime;

use chime::Chime;

use log::error;
use rodio::{OutputStream, Sink};
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread;
use std::time::Duration;

use crate::settings::ChimeSettings;

/// Called by the timer when the last phase runs out.
pub trait CompletionCue: Send + Sync {
    fn play_completion(&self);
}

/// Cue that does nothing, for headless use.
pub struct SilentCue;

impl CompletionCue for SilentCue {
    fn play_completion(&self) {}
}

enum AudioCommand {
    SetVolume(f32),
    PlayChime { frequency: f32, duration: Duration },
}

#[derive(Clone)]
pub struct AudioEngineHandle {
    tx: Arc<Mutex<Option<Sender<AudioCommand>>>>,
}

impl AudioEngineHandle {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>, String> {
        if let Some(tx) = self.tx.lock().map_err(|e| e.to_string())?.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();

        // Spawn dedicated audio thread holding non-Send audio objects
        thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                let mut _stream: Option<OutputStream> = None;
                let mut sink: Option<Sink> = None;
                let mut volume = 1.0_f32;

                fn ensure_sink(
                    stream: &mut Option<OutputStream>,
                    sink: &mut Option<Sink>,
                ) -> Result<(), String> {
                    if sink.is_none() {
                        let (s, handle) = OutputStream::try_default()
                            .map_err(|e| format!("Failed to create audio output stream: {}", e))?;
                        let new_sink = Sink::try_new(&handle)
                            .map_err(|e| format!("Failed to create audio sink: {}", e))?;
                        *stream = Some(s);
                        *sink = Some(new_sink);
                    }
                    Ok(())
                }

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        AudioCommand::SetVolume(v) => {
                            volume = v.clamp(0.0, 1.0);
                            if let Some(ref s) = sink {
                                s.set_volume(volume);
                            }
                        }
                        AudioCommand::PlayChime {
                            frequency,
                            duration,
                        } => {
                            if let Err(e) = ensure_sink(&mut _stream, &mut sink) {
                                error!("{e}");
                                continue;
                            }
                            if let Some(ref s) = sink {
                                s.set_volume(volume);
                                s.append(Chime::new(frequency, duration));
                                s.play();
                            }
                        }
                    }
                }
            })
            .map_err(|e| e.to_string())?;

        let tx_clone = tx.clone();
        *self.tx.lock().map_err(|e| e.to_string())? = Some(tx);
        Ok(tx_clone)
    }

    pub fn play_chime(&self, frequency: f32, duration: Duration) -> Result<(), String> {
        let tx = self.ensure_thread()?;
        tx.send(AudioCommand::PlayChime {
            frequency,
            duration,
        })
        .map_err(|e| e.to_string())
    }

    pub fn set_volume(&self, volume: f32) -> Result<(), String> {
        let tx = self.ensure_thread()?;
        tx.send(AudioCommand::SetVolume(volume))
            .map_err(|e| e.to_string())
    }
}

impl Default for AudioEngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Plays the configured chime through the audio engine.
pub struct ChimeCue {
    engine: AudioEngineHandle,
    settings: ChimeSettings,
}

impl ChimeCue {
    pub fn new(engine: AudioEngineHandle, settings: ChimeSettings) -> Self {
        Self { engine, settings }
    }
}

impl CompletionCue for ChimeCue {
    fn play_completion(&self) {
        if !self.settings.enabled {
            return;
        }
        let result = self.engine.set_volume(self.settings.volume).and_then(|_| {
            self.engine.play_chime(
                self.settings.frequency_hz,
                Duration::from_millis(self.settings.duration_ms),
            )
        });
        if let Err(e) = result {
            error!("Failed to play completion chime: {}", e);
        }
    }
}
