//! Sound cues.
//!
//! Playback itself is external; components get an `Arc<dyn AudioService>`
//! handle instead of reaching for a global player.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::seq::IndexedRandom;
use tracing::debug;

/// Fire-and-forget audio playback.
pub trait AudioService: Send + Sync {
    /// Play `clip` on the background channel, looping until replaced.
    fn play_loop(&self, clip: &str);
    /// Play `clip` once on the effects channel.
    fn play_once(&self, clip: &str);
    /// Ramp the background channel to `level` over `fade`.
    fn set_volume(&self, level: f32, fade: Duration);
}

/// Clip names shipped with the game.
pub mod clips {
    pub const INTRO: &str = "magic-in-the-air";
    pub const PAGE_FLIP: &str = "page-flip";
    pub const WRONG: &str = "negative-beeps";
    pub const CORRECT: &str = "magic-wand";
    pub const SOUNDTRACK: [&str; 4] = [
        "let-the-mystery-unfold",
        "spellcraft",
        "hiding-place-in-the-forest",
        "deep-in-the-dell",
    ];
}

pub const SOUNDTRACK_VOLUME: f32 = 0.1;
pub const FADE_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fade {
    In,
    Out,
}

/// Maps game moments to clips.
#[derive(Clone)]
pub struct Jukebox {
    audio: Arc<dyn AudioService>,
}

impl Jukebox {
    #[must_use]
    pub fn new(audio: Arc<dyn AudioService>) -> Self {
        Self { audio }
    }

    #[must_use]
    pub fn silent() -> Self {
        Self::new(Arc::new(SilentAudio))
    }

    pub fn play_intro(&self) {
        self.audio.play_loop(clips::INTRO);
    }

    /// Loop a random gameplay track at low volume.
    pub fn play_soundtrack(&self) {
        let mut rng = rand::rng();
        if let Some(track) = clips::SOUNDTRACK.choose(&mut rng) {
            self.audio.play_loop(track);
            self.audio.set_volume(SOUNDTRACK_VOLUME, Duration::ZERO);
        }
    }

    pub fn page_flip(&self) {
        self.audio.play_once(clips::PAGE_FLIP);
    }

    pub fn wrong_answer(&self) {
        self.audio.play_once(clips::WRONG);
    }

    pub fn correct_answer(&self) {
        self.audio.play_once(clips::CORRECT);
    }

    pub fn fade(&self, fade: Fade) {
        let level = match fade {
            Fade::In => 1.0,
            Fade::Out => 0.0,
        };
        self.audio.set_volume(level, FADE_DURATION);
    }
}

/// Drops every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudio;

impl AudioService for SilentAudio {
    fn play_loop(&self, _clip: &str) {}
    fn play_once(&self, _clip: &str) {}
    fn set_volume(&self, _level: f32, _fade: Duration) {}
}

/// Logs every request at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAudio;

impl AudioService for TracingAudio {
    fn play_loop(&self, clip: &str) {
        debug!(clip, "audio: loop");
    }

    fn play_once(&self, clip: &str) {
        debug!(clip, "audio: once");
    }

    fn set_volume(&self, level: f32, fade: Duration) {
        debug!(level, fade_ms = fade.as_millis() as u64, "audio: volume");
    }
}

/// A single request seen by `RecordingAudio`.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    Loop(String),
    Once(String),
    Volume { level: f32, fade: Duration },
}

/// Keeps every request in memory, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    calls: Mutex<Vec<AudioCall>>,
}

impl RecordingAudio {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, call: AudioCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl AudioService for RecordingAudio {
    fn play_loop(&self, clip: &str) {
        self.push(AudioCall::Loop(clip.to_owned()));
    }

    fn play_once(&self, clip: &str) {
        self.push(AudioCall::Once(clip.to_owned()));
    }

    fn set_volume(&self, level: f32, fade: Duration) {
        self.push(AudioCall::Volume { level, fade });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soundtrack_is_a_known_track_at_low_volume() {
        let audio = Arc::new(RecordingAudio::new());
        Jukebox::new(audio.clone()).play_soundtrack();

        let calls = audio.calls();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            AudioCall::Loop(track) => assert!(clips::SOUNDTRACK.contains(&track.as_str())),
            other => panic!("unexpected call {other:?}"),
        }
        assert_eq!(
            calls[1],
            AudioCall::Volume {
                level: SOUNDTRACK_VOLUME,
                fade: Duration::ZERO
            }
        );
    }

    #[test]
    fn fades_use_full_range() {
        let audio = Arc::new(RecordingAudio::new());
        let jukebox = Jukebox::new(audio.clone());
        jukebox.fade(Fade::Out);
        jukebox.fade(Fade::In);

        assert_eq!(
            audio.calls(),
            vec![
                AudioCall::Volume {
                    level: 0.0,
                    fade: FADE_DURATION
                },
                AudioCall::Volume {
                    level: 1.0,
                    fade: FADE_DURATION
                },
            ]
        );
    }

    #[test]
    fn effects_play_once() {
        let audio = Arc::new(RecordingAudio::new());
        let jukebox = Jukebox::new(audio.clone());
        jukebox.page_flip();
        jukebox.wrong_answer();
        jukebox.correct_answer();

        assert_eq!(
            audio.calls(),
            vec![
                AudioCall::Once(clips::PAGE_FLIP.into()),
                AudioCall::Once(clips::WRONG.into()),
                AudioCall::Once(clips::CORRECT.into()),
            ]
        );
    }
}
