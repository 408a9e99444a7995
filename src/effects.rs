use crate::audio::AudioEngineHandle;
use crate::events::{AppEvent, Celebration, EventBus};
use crate::notify::{NotificationGate, NotificationMessage};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Side effects the timer and task list trigger. Implementations must not
/// block and must swallow their own failures.
pub trait Effects: Send + Sync {
    fn ensure_notification_permission(&self);
    fn play_alarm(&self);
    fn notify(&self, message: &NotificationMessage);
    fn celebrate(&self, reason: Celebration);
}

/// Production effects: rodio alarm, desktop notifications, and a celebration
/// event for the front end to animate.
pub struct DesktopEffects {
    audio: AudioEngineHandle,
    notifications: NotificationGate,
    events: EventBus,
}

impl DesktopEffects {
    pub fn new(audio: AudioEngineHandle, notifications: NotificationGate, events: EventBus) -> Self {
        Self {
            audio,
            notifications,
            events,
        }
    }
}

impl Effects for DesktopEffects {
    fn ensure_notification_permission(&self) {
        self.notifications.request_once();
    }

    fn play_alarm(&self) {
        if let Err(err) = self.audio.play_alarm() {
            log_warn!("alarm playback failed: {err:#}");
        }
    }

    fn notify(&self, message: &NotificationMessage) {
        self.notifications.send(message);
    }

    fn celebrate(&self, reason: Celebration) {
        self.events.emit(AppEvent::Celebrate { reason });
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every effect so tests can count them.
    #[derive(Default)]
    pub struct RecordingEffects {
        pub permission_requests: Mutex<u32>,
        pub alarms: Mutex<u32>,
        pub notifications: Mutex<Vec<NotificationMessage>>,
        pub celebrations: Mutex<Vec<Celebration>>,
    }

    impl RecordingEffects {
        pub fn alarms(&self) -> u32 {
            *self.alarms.lock().unwrap()
        }

        pub fn celebrations(&self) -> Vec<Celebration> {
            self.celebrations.lock().unwrap().clone()
        }

        pub fn notifications(&self) -> Vec<NotificationMessage> {
            self.notifications.lock().unwrap().clone()
        }

        pub fn permission_requests(&self) -> u32 {
            *self.permission_requests.lock().unwrap()
        }
    }

    impl Effects for RecordingEffects {
        fn ensure_notification_permission(&self) {
            *self.permission_requests.lock().unwrap() += 1;
        }

        fn play_alarm(&self) {
            *self.alarms.lock().unwrap() += 1;
        }

        fn notify(&self, message: &NotificationMessage) {
            self.notifications.lock().unwrap().push(message.clone());
        }

        fn celebrate(&self, reason: Celebration) {
            self.celebrations.lock().unwrap().push(reason);
        }
    }
}
