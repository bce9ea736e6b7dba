use crate::models::SoundId;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

const MAX_PLAYBACK_LOG: usize = 256;

pub const SOUND_LOOP_INTERVAL: Duration = Duration::from_millis(1200);

/// Cancellation handle for a repeating end-of-break sound.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl LoopHandle {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Sound collaborator. Every call is fire-and-forget.
pub trait SoundPlayer: Send + fmt::Debug {
    fn play_sound(&mut self, sound: &SoundId);

    /// Returns `None` when nothing will be played, so there is nothing to stop.
    fn start_looping_sound(&mut self, sound: &SoundId) -> Option<LoopHandle>;

    fn stop_looping_sound(&mut self, handle: &LoopHandle);

    fn set_global_mute(&mut self, _muted: bool) {}

    fn is_muted(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundPlaybackReason {
    Played,
    Muted,
    NoSound,
    PlaybackDisabled,
    PlaybackFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    #[default]
    System,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundPlaybackRecord {
    pub sound: SoundId,
    pub looping: bool,
    pub played: bool,
    pub reason: SoundPlaybackReason,
    pub timestamp: SystemTime,
}

#[derive(Debug)]
pub struct AudioManager {
    global_mute: bool,
    playback_mode: PlaybackMode,
    loop_interval: Duration,
    log: Vec<SoundPlaybackRecord>,
    failure_notified: bool,
    next_loop_id: u64,
    active_loops: Vec<LoopHandle>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        Self::with_playback_mode(PlaybackMode::System)
    }

    pub fn with_playback_mode(playback_mode: PlaybackMode) -> Self {
        Self {
            global_mute: false,
            playback_mode,
            loop_interval: SOUND_LOOP_INTERVAL,
            log: Vec::new(),
            failure_notified: false,
            next_loop_id: 0,
            active_loops: Vec::new(),
        }
    }

    pub fn toggle_global_mute(&mut self) -> bool {
        let muted = !self.global_mute;
        self.set_global_mute(muted);
        muted
    }

    pub fn play(&mut self, sound: &SoundId) -> SoundPlaybackRecord {
        let reason = match self.blocked_reason(sound) {
            Some(reason) => reason,
            None => match sound.name().map(play_system_sound) {
                Some(Ok(())) => SoundPlaybackReason::Played,
                Some(Err(err)) => {
                    debug!(%sound, error = %err, "sound playback failed");
                    SoundPlaybackReason::PlaybackFailed
                }
                None => SoundPlaybackReason::NoSound,
            },
        };
        self.record(sound, false, reason)
    }

    pub fn logs(&self) -> &[SoundPlaybackRecord] {
        &self.log
    }

    pub fn take_logs(&mut self) -> Vec<SoundPlaybackRecord> {
        std::mem::take(&mut self.log)
    }

    pub fn active_loop_count(&self) -> usize {
        self.active_loops.len()
    }

    pub fn should_notify_failure(&mut self, record: &SoundPlaybackRecord) -> bool {
        match record.reason {
            SoundPlaybackReason::Played => {
                self.failure_notified = false;
                false
            }
            SoundPlaybackReason::PlaybackFailed => {
                if self.failure_notified {
                    false
                } else {
                    self.failure_notified = true;
                    true
                }
            }
            _ => false,
        }
    }

    fn blocked_reason(&self, sound: &SoundId) -> Option<SoundPlaybackReason> {
        if sound.is_none() {
            Some(SoundPlaybackReason::NoSound)
        } else if self.global_mute {
            Some(SoundPlaybackReason::Muted)
        } else if matches!(self.playback_mode, PlaybackMode::Disabled) {
            Some(SoundPlaybackReason::PlaybackDisabled)
        } else {
            None
        }
    }

    fn record(
        &mut self,
        sound: &SoundId,
        looping: bool,
        reason: SoundPlaybackReason,
    ) -> SoundPlaybackRecord {
        let record = SoundPlaybackRecord {
            sound: sound.clone(),
            looping,
            played: reason == SoundPlaybackReason::Played,
            reason,
            timestamp: SystemTime::now(),
        };
        if self.should_notify_failure(&record) {
            warn!(%sound, "could not play sound, continuing without audio");
        }
        if self.log.len() >= MAX_PLAYBACK_LOG {
            self.log.remove(0);
        }
        self.log.push(record.clone());
        record
    }
}

impl SoundPlayer for AudioManager {
    fn play_sound(&mut self, sound: &SoundId) {
        self.play(sound);
    }

    fn start_looping_sound(&mut self, sound: &SoundId) -> Option<LoopHandle> {
        if let Some(reason) = self.blocked_reason(sound) {
            self.record(sound, true, reason);
            return None;
        }
        let name = sound.name()?.to_string();
        self.next_loop_id += 1;
        let handle = LoopHandle::new(self.next_loop_id);
        let thread_handle = handle.clone();
        let interval = self.loop_interval;
        let spawned = thread::Builder::new()
            .name("end-sound-loop".to_string())
            .spawn(move || {
                while !thread_handle.is_cancelled() {
                    if let Err(err) = play_system_sound(&name) {
                        debug!(sound = %name, error = %err, "looping sound pulse failed");
                    }
                    thread::sleep(interval);
                }
            });
        match spawned {
            Ok(_) => {
                self.record(sound, true, SoundPlaybackReason::Played);
                self.active_loops.push(handle.clone());
                Some(handle)
            }
            Err(err) => {
                warn!(%sound, error = %err, "could not start looping sound");
                self.record(sound, true, SoundPlaybackReason::PlaybackFailed);
                None
            }
        }
    }

    fn stop_looping_sound(&mut self, handle: &LoopHandle) {
        handle.cancel();
        self.active_loops.retain(|active| active.id() != handle.id());
    }

    fn set_global_mute(&mut self, muted: bool) {
        self.global_mute = muted;
        if muted {
            for handle in self.active_loops.drain(..) {
                handle.cancel();
            }
        }
    }

    fn is_muted(&self) -> bool {
        self.global_mute
    }
}

pub fn sound_path(name: &str) -> PathBuf {
    PathBuf::from(format!("/System/Library/Sounds/{name}.aiff"))
}

fn play_system_sound(name: &str) -> io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        use std::process::{Command, Stdio};
        let mut child = Command::new("afplay")
            .arg(sound_path(name))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
    #[cfg(not(target_os = "macos"))]
    {
        use std::io::Write;
        let _ = name;
        let mut stdout = io::stdout();
        stdout.write_all(b"\x07")?;
        stdout.flush()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{LoopHandle, SoundPlayer};
    use crate::models::SoundId;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SoundSignal {
        Play(SoundId),
        StartLoop(SoundId, u64),
        StopLoop(u64),
    }

    /// Records every signal; clones share the same log.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingSoundPlayer {
        signals: Arc<Mutex<Vec<SoundSignal>>>,
        next_id: Arc<Mutex<u64>>,
    }

    impl RecordingSoundPlayer {
        pub fn signals(&self) -> Vec<SoundSignal> {
            self.signals.lock().expect("signals lock").clone()
        }

        fn push(&self, signal: SoundSignal) {
            self.signals.lock().expect("signals lock").push(signal);
        }
    }

    impl SoundPlayer for RecordingSoundPlayer {
        fn play_sound(&mut self, sound: &SoundId) {
            if !sound.is_none() {
                self.push(SoundSignal::Play(sound.clone()));
            }
        }

        fn start_looping_sound(&mut self, sound: &SoundId) -> Option<LoopHandle> {
            if sound.is_none() {
                return None;
            }
            let mut next_id = self.next_id.lock().expect("id lock");
            *next_id += 1;
            let handle = LoopHandle::new(*next_id);
            self.push(SoundSignal::StartLoop(sound.clone(), handle.id()));
            Some(handle)
        }

        fn stop_looping_sound(&mut self, handle: &LoopHandle) {
            handle.cancel();
            self.push(SoundSignal::StopLoop(handle.id()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AudioManager, LoopHandle, PlaybackMode, SoundPlaybackReason, SoundPlaybackRecord,
        SoundPlayer,
    };
    use crate::models::SoundId;
    use std::time::SystemTime;

    fn failed_record() -> SoundPlaybackRecord {
        SoundPlaybackRecord {
            sound: SoundId::named("Glass"),
            looping: false,
            played: false,
            reason: SoundPlaybackReason::PlaybackFailed,
            timestamp: SystemTime::now(),
        }
    }

    #[test]
    fn global_mute_blocks_playback() {
        let mut manager = AudioManager::with_playback_mode(PlaybackMode::Disabled);
        manager.set_global_mute(true);

        let record = manager.play(&SoundId::named("Ping"));
        assert!(!record.played);
        assert_eq!(record.reason, SoundPlaybackReason::Muted);
    }

    #[test]
    fn none_sound_is_never_played() {
        let mut manager = AudioManager::with_playback_mode(PlaybackMode::System);
        let record = manager.play(&SoundId::None);
        assert_eq!(record.reason, SoundPlaybackReason::NoSound);
        assert!(manager.start_looping_sound(&SoundId::None).is_none());
        assert_eq!(manager.logs().len(), 2);
    }

    #[test]
    fn playback_disabled_is_logged() {
        let mut manager = AudioManager::with_playback_mode(PlaybackMode::Disabled);
        manager.play_sound(&SoundId::named("Pop"));

        let logs = manager.take_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].reason, SoundPlaybackReason::PlaybackDisabled);
        assert!(manager.logs().is_empty());
    }

    #[test]
    fn disabled_playback_starts_no_loop() {
        let mut manager = AudioManager::with_playback_mode(PlaybackMode::Disabled);
        let handle = manager.start_looping_sound(&SoundId::named("Submarine"));
        assert!(handle.is_none());
        assert_eq!(manager.active_loop_count(), 0);
        assert!(manager.logs()[0].looping);
    }

    #[test]
    fn stopping_a_loop_is_idempotent() {
        let mut manager = AudioManager::with_playback_mode(PlaybackMode::Disabled);
        let handle = LoopHandle::new(7);
        manager.stop_looping_sound(&handle);
        manager.stop_looping_sound(&handle);
        assert!(handle.is_cancelled());
    }

    #[test]
    fn toggle_mute_flips_state() {
        let mut manager = AudioManager::new();
        assert!(manager.toggle_global_mute());
        assert!(manager.is_muted());
        assert!(!manager.toggle_global_mute());
    }

    #[test]
    fn notify_failure_only_once_until_played() {
        let mut manager = AudioManager::with_playback_mode(PlaybackMode::Disabled);
        let failed = failed_record();

        assert!(manager.should_notify_failure(&failed));
        assert!(!manager.should_notify_failure(&failed));

        let played = SoundPlaybackRecord {
            played: true,
            reason: SoundPlaybackReason::Played,
            ..failed_record()
        };
        assert!(!manager.should_notify_failure(&played));
        assert!(manager.should_notify_failure(&failed));
    }
}
