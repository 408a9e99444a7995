pub mod alarm;
pub mod birds;
pub mod forest;
pub mod noise;
pub mod rain;

use alarm::AlarmChime;
use birds::Birdsong;
use forest::ForestStream;
use noise::WhiteNoise;
use rain::RainSound;

use anyhow::{anyhow, Result};
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::collections::HashMap;
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread;

use crate::ambience::SoundId;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const DEFAULT_VOLUME: f32 = 0.5;

enum AudioCommand {
    SetAmbient(Vec<SoundId>),
    SetVolume(f32),
    SetMuted(bool),
    PlayAlarm,
    Shutdown,
}

type AmbientSource = Box<dyn Source<Item = f32> + Send>;

fn ambient_source(sound: SoundId) -> Option<AmbientSource> {
    match sound {
        SoundId::Rain => Some(Box::new(RainSound::new())),
        SoundId::Forest => Some(Box::new(ForestStream::new())),
        SoundId::Birds => Some(Box::new(Birdsong::new())),
        SoundId::WhiteNoise => Some(Box::new(WhiteNoise::new())),
        SoundId::Custom => None,
    }
}

/// State owned by the audio thread. rodio's output stream is not `Send`, so
/// it never leaves that thread.
struct Mixer {
    output: Option<(OutputStream, OutputStreamHandle)>,
    ambient: HashMap<SoundId, Sink>,
    volume: f32,
    muted: bool,
}

impl Mixer {
    fn new() -> Self {
        Self {
            output: None,
            ambient: HashMap::new(),
            volume: DEFAULT_VOLUME,
            muted: false,
        }
    }

    fn new_sink(&mut self) -> Result<Sink> {
        if self.output.is_none() {
            let opened = OutputStream::try_default()
                .map_err(|e| anyhow!("failed to open audio output stream: {e}"))?;
            self.output = Some(opened);
        }
        let (_, handle) = self
            .output
            .as_ref()
            .ok_or_else(|| anyhow!("audio output unavailable"))?;
        Sink::try_new(handle).map_err(|e| anyhow!("failed to create audio sink: {e}"))
    }

    fn set_ambient(&mut self, wanted: Vec<SoundId>) -> Result<()> {
        self.ambient.retain(|sound, sink| {
            let keep = wanted.contains(sound);
            if !keep {
                sink.stop();
            }
            keep
        });

        for sound in wanted {
            if self.ambient.contains_key(&sound) {
                continue;
            }
            let Some(source) = ambient_source(sound) else {
                continue;
            };
            let sink = self.new_sink()?;
            sink.set_volume(self.volume);
            sink.append(source);
            if self.muted {
                sink.pause();
            }
            self.ambient.insert(sound, sink);
        }
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        for sink in self.ambient.values() {
            sink.set_volume(self.volume);
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        for sink in self.ambient.values() {
            if muted {
                sink.pause();
            } else {
                sink.play();
            }
        }
    }

    fn play_alarm(&mut self) -> Result<()> {
        let sink = self.new_sink()?;
        sink.append(AlarmChime::new());
        sink.detach();
        Ok(())
    }
}

/// Handle to the background audio thread. Cloning shares the same thread.
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

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>> {
        let mut guard = self
            .tx
            .lock()
            .map_err(|_| anyhow!("audio handle lock poisoned"))?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();

        thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                let mut mixer = Mixer::new();

                while let Ok(cmd) = rx.recv() {
                    let result = match cmd {
                        AudioCommand::SetAmbient(sounds) => mixer.set_ambient(sounds),
                        AudioCommand::SetVolume(volume) => {
                            mixer.set_volume(volume);
                            Ok(())
                        }
                        AudioCommand::SetMuted(muted) => {
                            mixer.set_muted(muted);
                            Ok(())
                        }
                        AudioCommand::PlayAlarm => mixer.play_alarm(),
                        AudioCommand::Shutdown => break,
                    };
                    // no audio device is not fatal; playback is best effort
                    if let Err(err) = result {
                        log_warn!("audio command failed: {err:#}");
                    }
                }

                for sink in mixer.ambient.values() {
                    sink.stop();
                }
                log_info!("audio engine stopped");
            })
            .map_err(|e| anyhow!("failed to spawn audio thread: {e}"))?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    fn send(&self, command: AudioCommand) -> Result<()> {
        let tx = self.ensure_thread()?;
        tx.send(command)
            .map_err(|_| anyhow!("audio thread is no longer running"))
    }

    /// Replaces the set of looping ambient tracks.
    pub fn set_ambient(&self, sounds: Vec<SoundId>) -> Result<()> {
        self.send(AudioCommand::SetAmbient(sounds))
    }

    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.send(AudioCommand::SetVolume(volume))
    }

    /// Pauses or resumes every ambient track. The alarm is gated by the
    /// caller.
    pub fn set_muted(&self, muted: bool) -> Result<()> {
        self.send(AudioCommand::SetMuted(muted))
    }

    pub fn play_alarm(&self) -> Result<()> {
        self.send(AudioCommand::PlayAlarm)
    }

    pub fn shutdown(&self) {
        if let Ok(mut guard) = self.tx.lock() {
            if let Some(tx) = guard.take() {
                let _ = tx.send(AudioCommand::Shutdown);
            }
        }
    }
}
