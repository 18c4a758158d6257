use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::{SoundCue, SoundHook};

pub const PAUSE_REMINDER_DELAY: Duration = Duration::from_secs(5 * 60);

/// One-shot nudge that fires an audible cue after a session has sat paused
/// for five minutes. Carries no session state and touches no metrics; it
/// exists only so a forgotten pause makes a sound.
pub struct PauseReminder {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    delay: Duration,
}

impl PauseReminder {
    pub fn new() -> Self {
        Self::with_delay(PAUSE_REMINDER_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            handle: None,
            cancel_token: None,
            delay,
        }
    }

    /// Arms the reminder, replacing any previous one.
    pub fn arm(&mut self, sound: SoundHook) {
        self.disarm();

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    debug!("pause reminder elapsed");
                    sound(SoundCue::PauseReminder);
                }
                _ = token_clone.cancelled() => {}
            }
        });

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
    }

    /// Safe to call when already disarmed.
    pub fn disarm(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Default for PauseReminder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PauseReminder {
    fn drop(&mut self) {
        self.disarm();
    }
}
