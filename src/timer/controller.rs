use std::{
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use serde::Serialize;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    effects::Effects,
    events::{AppEvent, Celebration, EventBus},
    notify::NotificationMessage,
    settings::SettingsStore,
    utils::time::format_clock,
};

use super::{SessionKind, TimerState};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub progress_percent: f64,
    /// Remaining time as `MM:SS`.
    pub display: String,
}

impl From<&TimerState> for TimerSnapshot {
    fn from(state: &TimerState) -> Self {
        Self {
            progress_percent: state.progress_percent(),
            display: format_clock(state.remaining_seconds),
            state: state.clone(),
        }
    }
}

struct Core {
    timer: TimerState,
    /// Bumped whenever a cadence starts or must stop. A cadence only acts
    /// while its own epoch is current.
    epoch: u64,
}

struct Shared {
    core: Mutex<Core>,
    effects: Arc<dyn Effects>,
    settings: Arc<SettingsStore>,
    events: EventBus,
    snapshots: watch::Sender<TimerSnapshot>,
}

impl Shared {
    fn publish(&self, timer: &TimerState) {
        self.snapshots.send_replace(TimerSnapshot::from(timer));
    }
}

/// The running one-second cadence. Dropping it cancels the task.
struct Cadence {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Drop for Cadence {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// Focus timer. Clones share one state and at most one cadence; the cadence is
/// cancelled when the last clone goes away.
#[derive(Clone)]
pub struct TimerController {
    shared: Arc<Shared>,
    cadence: Arc<StdMutex<Option<Cadence>>>,
    tick_interval: Duration,
}

impl TimerController {
    pub fn new(effects: Arc<dyn Effects>, settings: Arc<SettingsStore>, events: EventBus) -> Self {
        let timer = TimerState::new(settings.durations());
        let (snapshots, _) = watch::channel(TimerSnapshot::from(&timer));

        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(Core { timer, epoch: 0 }),
                effects,
                settings,
                events,
                snapshots,
            }),
            cadence: Arc::new(StdMutex::new(None)),
            tick_interval: TICK_INTERVAL,
        }
    }

    /// Receives a fresh snapshot after every change, including each tick.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.shared.snapshots.subscribe()
    }

    pub async fn get_state(&self) -> TimerState {
        self.shared.core.lock().await.timer.clone()
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::from(&self.shared.core.lock().await.timer)
    }

    /// Starts the countdown. Returns false when it was already running or has
    /// run out and needs a reset.
    pub async fn start(&self) -> bool {
        let mut core = self.shared.core.lock().await;
        if !core.timer.start() {
            return false;
        }
        core.epoch += 1;
        self.spawn_cadence(core.epoch);
        self.shared.publish(&core.timer);
        drop(core);

        log_info!("timer started");
        self.shared.effects.ensure_notification_permission();
        true
    }

    /// Returns whether the countdown was running.
    pub async fn pause(&self) -> bool {
        self.mutate(|timer| timer.pause()).await
    }

    pub async fn reset(&self) {
        self.mutate(|timer| timer.reset()).await
    }

    pub async fn change_kind(&self, kind: SessionKind) {
        self.mutate(|timer| timer.change_kind(kind)).await
    }

    /// Changes the configured length of `kind`. Updating the current kind
    /// restarts its remaining time without stopping a running countdown.
    pub async fn update_duration(&self, kind: SessionKind, minutes: u32) {
        let mut core = self.shared.core.lock().await;
        core.timer.update_duration(kind, minutes);
        self.shared.publish(&core.timer);
    }

    /// Stops the countdown and cancels the cadence.
    pub async fn shutdown(&self) {
        self.mutate(|timer| {
            timer.pause();
        })
        .await
    }

    #[cfg(test)]
    fn has_active_cadence(&self) -> bool {
        self.lock_cadence()
            .as_ref()
            .is_some_and(|cadence| !cadence.handle.is_finished())
    }

    /// Applies a change that always leaves the timer stopped.
    async fn mutate<T>(&self, change: impl FnOnce(&mut TimerState) -> T) -> T {
        let mut core = self.shared.core.lock().await;
        let result = change(&mut core.timer);
        core.epoch += 1;
        self.cancel_cadence();
        self.shared.publish(&core.timer);
        result
    }

    fn lock_cadence(&self) -> std::sync::MutexGuard<'_, Option<Cadence>> {
        match self.cadence.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn cancel_cadence(&self) {
        if self.lock_cadence().take().is_some() {
            log_debug!("cadence cancelled");
        }
    }

    /// Caller holds the core lock, so the slot and the epoch change together.
    fn spawn_cadence(&self, epoch: u64) {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_cadence(
            self.shared.clone(),
            epoch,
            self.tick_interval,
            cancel.clone(),
        ));
        // replacing the slot drops (and cancels) any previous cadence
        *self.lock_cadence() = Some(Cadence { cancel, handle });
    }
}

async fn run_cadence(shared: Arc<Shared>, epoch: u64, period: Duration, cancel: CancellationToken) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let mut core = shared.core.lock().await;
        if core.epoch != epoch || !core.timer.running {
            break;
        }

        let Some(finished) = core.timer.tick() else {
            shared.publish(&core.timer);
            continue;
        };

        core.epoch += 1;
        shared.publish(&core.timer);
        complete_session(&shared, &mut core, finished);
        break;
    }
}

/// Runs the completion side effects once and moves on to the next kind,
/// leaving it stopped.
fn complete_session(shared: &Shared, core: &mut Core, finished: SessionKind) {
    if !shared.settings.muted() {
        shared.effects.play_alarm();
    }
    shared
        .effects
        .notify(&NotificationMessage::for_kind(finished));

    let completion = core.timer.finish_session(finished);
    if finished == SessionKind::Focus {
        shared.effects.celebrate(Celebration::SessionCompleted);
    }

    log_info!(
        "{} finished ({} focus sessions), next up: {}",
        finished.label(),
        completion.completed_sessions,
        completion.next.label()
    );

    shared.publish(&core.timer);
    shared.events.emit(AppEvent::SessionCompleted(completion));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioEngineHandle;
    use crate::effects::testing::RecordingEffects;
    use crate::effects::DesktopEffects;
    use crate::notify::{NotificationBackend, NotificationGate, Permission};
    use crate::settings::UserSettings;
    use crate::timer::SessionDurations;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn controller_with(settings: UserSettings) -> (TimerController, Arc<RecordingEffects>) {
        let effects = Arc::new(RecordingEffects::default());
        let controller = TimerController::new(
            effects.clone(),
            Arc::new(SettingsStore::ephemeral(settings)),
            EventBus::new(),
        );
        (controller, effects)
    }

    fn one_minute_sessions() -> UserSettings {
        UserSettings {
            durations: SessionDurations {
                focus: 1,
                short_break: 1,
                long_break: 2,
            },
            ..UserSettings::default()
        }
    }

    async fn wait(ms: u64) {
        time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_once_per_second() {
        let (timer, effects) = controller_with(UserSettings::default());
        assert!(timer.start().await);
        wait(3_500).await;

        let state = timer.get_state().await;
        assert_eq!(state.remaining_seconds, 25 * 60 - 3);
        assert!(state.running);
        assert_eq!(effects.permission_requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_does_not_add_a_cadence() {
        let (timer, _) = controller_with(UserSettings::default());
        assert!(timer.start().await);
        assert!(!timer.start().await);
        wait(5_500).await;

        assert_eq!(timer.get_state().await.remaining_seconds, 25 * 60 - 5);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_remaining_time() {
        let (timer, _) = controller_with(UserSettings::default());
        timer.start().await;
        wait(2_500).await;

        assert!(timer.pause().await);
        assert!(!timer.has_active_cadence());
        let paused = timer.get_state().await;
        wait(10_000).await;

        assert_eq!(timer.get_state().await, paused);
        assert_eq!(paused.remaining_seconds, 25 * 60 - 2);
        assert!(!paused.running);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_and_kind_change_stop_the_cadence() {
        let (timer, _) = controller_with(UserSettings::default());
        timer.start().await;
        wait(2_500).await;
        timer.reset().await;
        wait(3_000).await;

        let state = timer.get_state().await;
        assert_eq!(state.remaining_seconds, 25 * 60);
        assert!(!state.running);

        timer.start().await;
        wait(1_500).await;
        timer.change_kind(SessionKind::LongBreak).await;
        wait(3_000).await;

        let state = timer.get_state().await;
        assert_eq!(state.kind, SessionKind::LongBreak);
        assert_eq!(state.remaining_seconds, 30 * 60);
        assert!(!timer.has_active_cadence());
    }

    #[tokio::test(start_paused = true)]
    async fn completion_fires_effects_once_and_waits_for_start() {
        let (timer, effects) = controller_with(one_minute_sessions());
        let mut events = timer.shared.events.subscribe();
        timer.start().await;
        wait(65_000).await;

        let state = timer.get_state().await;
        assert_eq!(state.kind, SessionKind::ShortBreak);
        assert_eq!(state.remaining_seconds, 60);
        assert!(!state.running);
        assert_eq!(state.completed_sessions, 1);

        assert_eq!(effects.alarms(), 1);
        assert_eq!(
            effects.notifications(),
            vec![NotificationMessage::for_kind(SessionKind::Focus)]
        );
        assert_eq!(effects.celebrations(), vec![Celebration::SessionCompleted]);
        assert!(matches!(
            events.try_recv(),
            Ok(AppEvent::SessionCompleted(completion)) if completion.next == SessionKind::ShortBreak
        ));
        assert!(!timer.has_active_cadence());
    }

    #[tokio::test(start_paused = true)]
    async fn break_completion_returns_to_focus_without_celebrating() {
        let (timer, effects) = controller_with(one_minute_sessions());
        timer.change_kind(SessionKind::ShortBreak).await;
        timer.start().await;
        wait(61_000).await;

        let state = timer.get_state().await;
        assert_eq!(state.kind, SessionKind::Focus);
        assert_eq!(state.completed_sessions, 0);
        assert!(effects.celebrations().is_empty());
        assert_eq!(
            effects.notifications(),
            vec![NotificationMessage::for_kind(SessionKind::ShortBreak)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn muted_completion_skips_only_the_alarm() {
        let settings = UserSettings {
            muted: true,
            ..one_minute_sessions()
        };
        let (timer, effects) = controller_with(settings);
        timer.start().await;
        wait(61_000).await;

        assert_eq!(effects.alarms(), 0);
        assert_eq!(effects.notifications().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fourth_focus_session_leads_to_long_break() {
        let (timer, _) = controller_with(one_minute_sessions());
        let mut nexts = Vec::new();
        for _ in 0..4 {
            timer.change_kind(SessionKind::Focus).await;
            timer.start().await;
            wait(61_000).await;
            nexts.push(timer.get_state().await.kind);
        }

        assert_eq!(
            nexts,
            vec![
                SessionKind::ShortBreak,
                SessionKind::ShortBreak,
                SessionKind::ShortBreak,
                SessionKind::LongBreak
            ]
        );
        assert_eq!(timer.get_state().await.remaining_seconds, 2 * 60);
    }

    #[tokio::test(start_paused = true)]
    async fn resizing_running_session_rebases_it() {
        let (timer, _) = controller_with(UserSettings::default());
        timer.start().await;
        wait(2_500).await;
        timer.update_duration(SessionKind::Focus, 10).await;

        let state = timer.get_state().await;
        assert_eq!(state.remaining_seconds, 600);
        assert!(state.running);

        wait(1_000).await;
        assert_eq!(timer.get_state().await.remaining_seconds, 599);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_each_tick() {
        let (timer, _) = controller_with(UserSettings::default());
        let mut rx = timer.subscribe();
        timer.start().await;
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().state.running);

        rx.changed().await.unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.display, "24:59");
        assert!(snapshot.progress_percent > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_last_handle_cancels_the_cadence() {
        let (timer, _) = controller_with(UserSettings::default());
        timer.start().await;
        let mut rx = timer.subscribe();
        drop(timer);

        // the cadence held the only other reference to the sender
        assert!(rx.changed().await.is_err());
    }

    struct StalledDaemon {
        release: StdMutex<std::sync::mpsc::Receiver<()>>,
        shown: AtomicUsize,
    }

    impl NotificationBackend for StalledDaemon {
        fn permission(&self) -> Permission {
            Permission::Granted
        }

        fn request_permission(&self) -> anyhow::Result<Permission> {
            Ok(Permission::Granted)
        }

        fn show(&self, _title: &str, _body: &str) -> anyhow::Result<()> {
            let _ = self
                .release
                .lock()
                .unwrap()
                .recv_timeout(Duration::from_secs(2));
            self.shown.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completion_does_not_wait_for_the_notification_daemon() {
        let (release, stalled) = std::sync::mpsc::channel();
        let daemon = Arc::new(StalledDaemon {
            release: StdMutex::new(stalled),
            shown: AtomicUsize::new(0),
        });
        let events = EventBus::new();
        let effects = Arc::new(DesktopEffects::new(
            AudioEngineHandle::new(),
            NotificationGate::new(daemon.clone()),
            events.clone(),
        ));
        let settings = UserSettings {
            muted: true,
            ..one_minute_sessions()
        };
        let timer = TimerController::new(
            effects,
            Arc::new(SettingsStore::ephemeral(settings)),
            events.clone(),
        );
        let mut rx = events.subscribe();

        let began = std::time::Instant::now();
        timer.start().await;
        while !matches!(rx.recv().await.unwrap(), AppEvent::SessionCompleted(_)) {}
        let state = timer.get_state().await;

        assert!(began.elapsed() < Duration::from_secs(1));
        assert_eq!(state.kind, SessionKind::ShortBreak);
        assert_eq!(daemon.shown.load(Ordering::SeqCst), 0);

        release.send(()).unwrap();
        for _ in 0..200 {
            if daemon.shown.load(Ordering::SeqCst) == 1 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(daemon.shown.load(Ordering::SeqCst), 1);
    }
}
