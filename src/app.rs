use std::{
    path::Path,
    sync::{Arc, Mutex as StdMutex, MutexGuard},
};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::sync::Mutex;

use crate::{
    ambience::{AmbienceSelector, Selection, SoundId, ThemeId},
    audio::AudioEngineHandle,
    db::Database,
    effects::{DesktopEffects, Effects},
    events::{AppEvent, EventBus},
    notify::{DesktopNotifier, NotificationGate, Permission},
    settings::{SettingsStore, UserSettings},
    tasks::TaskList,
    timer::{SessionKind, TimerController},
};

/// Everything one running instance owns. Front ends observe it through
/// `events` and the timer's snapshot channel.
pub struct App {
    pub settings: Arc<SettingsStore>,
    pub timer: TimerController,
    pub tasks: Mutex<TaskList>,
    pub events: EventBus,
    ambience: StdMutex<AmbienceSelector>,
    audio: AudioEngineHandle,
    notifications: NotificationGate,
}

impl App {
    pub async fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let settings = Arc::new(SettingsStore::new(data_dir.join("settings.json"))?);
        let database = Database::new(data_dir.join("deepfocus.sqlite3"))?;
        let initial = settings.snapshot();

        let audio = AudioEngineHandle::new();
        if let Err(err) = audio.set_volume(initial.volume) {
            warn!("failed to apply saved volume: {err:#}");
        }
        if initial.muted {
            if let Err(err) = audio.set_muted(true) {
                warn!("failed to apply saved mute: {err:#}");
            }
        }

        let notifications = NotificationGate::new(Arc::new(DesktopNotifier::new(
            initial.notifications_enabled,
        )));
        let events = EventBus::new();
        let effects: Arc<dyn Effects> = Arc::new(DesktopEffects::new(
            audio.clone(),
            notifications.clone(),
            events.clone(),
        ));

        Ok(Self::assemble(
            settings,
            database,
            effects,
            audio,
            notifications,
            events,
        )
        .await)
    }

    pub async fn assemble(
        settings: Arc<SettingsStore>,
        database: Database,
        effects: Arc<dyn Effects>,
        audio: AudioEngineHandle,
        notifications: NotificationGate,
        events: EventBus,
    ) -> Self {
        let timer = TimerController::new(effects.clone(), settings.clone(), events.clone());
        let tasks = TaskList::load(database, effects, events.clone()).await;

        Self {
            settings,
            timer,
            tasks: Mutex::new(tasks),
            events,
            ambience: StdMutex::new(AmbienceSelector::new()),
            audio,
            notifications,
        }
    }

    fn ambience(&self) -> MutexGuard<'_, AmbienceSelector> {
        match self.ambience.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn is_sound_active(&self, sound: SoundId) -> bool {
        self.ambience().is_active(sound)
    }

    pub fn theme(&self) -> ThemeId {
        self.ambience().theme()
    }

    pub fn toggle_sound(&self, sound: SoundId) -> Selection {
        let (selection, active) = {
            let mut ambience = self.ambience();
            (ambience.toggle_sound(sound), ambience.active_sounds())
        };

        if selection == Selection::Restricted {
            self.events.emit(AppEvent::UpsellRequested {
                item: sound.as_str().to_string(),
            });
        } else if let Err(err) = self.audio.set_ambient(active) {
            warn!("failed to update ambient sounds: {err:#}");
        }
        selection
    }

    pub fn select_theme(&self, theme: ThemeId) -> Selection {
        let selection = self.ambience().select_theme(theme);
        if selection == Selection::Restricted {
            self.events.emit(AppEvent::UpsellRequested {
                item: theme.as_str().to_string(),
            });
        }
        selection
    }

    /// Returns the new mute state.
    pub fn toggle_mute(&self) -> Result<bool> {
        let updated = self.settings.update(|s| s.muted = !s.muted)?;
        if let Err(err) = self.audio.set_muted(updated.muted) {
            warn!("failed to apply mute: {err:#}");
        }
        Ok(updated.muted)
    }

    pub fn toggle_dark_mode(&self) -> Result<bool> {
        Ok(self.settings.update(|s| s.dark_mode = !s.dark_mode)?.dark_mode)
    }

    /// `percent` is clamped to 0..=100.
    pub fn set_volume(&self, percent: u32) -> Result<f32> {
        let volume = percent.min(100) as f32 / 100.0;
        self.settings.update(|s| s.volume = volume)?;
        if let Err(err) = self.audio.set_volume(volume) {
            warn!("failed to apply volume: {err:#}");
        }
        Ok(volume)
    }

    /// Clamps `minutes` to the kind's bounds, saves it, then hands it to the
    /// timer. Returns the value actually applied.
    pub async fn update_duration(&self, kind: SessionKind, minutes: u32) -> Result<u32> {
        let minutes = kind.clamp_minutes(minutes);
        self.settings.update(|s| s.durations.set(kind, minutes))?;
        self.timer.update_duration(kind, minutes).await;
        Ok(minutes)
    }

    pub async fn request_notifications(&self) -> Permission {
        self.notifications.request().await
    }

    pub fn preferences(&self) -> UserSettings {
        self.settings.snapshot()
    }

    pub async fn shutdown(&self) {
        self.timer.shutdown().await;
        self.audio.shutdown();
        info!("Deep Focus shut down");
    }
}
