//! Audio cue seam. The core names cues; playing them is the shell's job.
use serde::{Deserialize, Serialize};

/// The fixed effect set the game emits. Volume is a global setting owned by
/// the progression store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoundCue {
    Click,
    Slash,
    Heal,
    Summon,
    Victory,
    Defeat,
    RareGet,
    LegendGet,
    Magic,
}

/// Fire-and-forget playback. Implementations must swallow playback failures
/// (autoplay restrictions and the like) — a cue is never load-bearing.
pub trait AudioSink {
    fn play(&self, cue: SoundCue);
}

/// Sink that discards every cue. Default for headless runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&self, _cue: SoundCue) {}
}
