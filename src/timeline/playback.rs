/// Where the player currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub step_index: usize,
    pub step_count: usize,
    pub sub_step: u32,
    pub max_substep: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    Idle,
    AdvanceSubStep,
    /// Move to the next step and reset the substep to zero.
    AdvanceStep,
    /// Reached the last substep of the last step; playback stopped.
    Finished,
}

/// Fixed-delay auto-play timer. Time is supplied by the caller in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Playback {
    delay_ms: u64,
    playing: bool,
    due_ms: Option<u64>,
}

impl Playback {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms: delay_ms.max(1),
            playing: false,
            due_ms: None,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Start playing; the first tick fires one delay after `now_ms`.
    pub fn play(&mut self, now_ms: u64) {
        self.playing = true;
        self.due_ms = Some(now_ms.saturating_add(self.delay_ms));
    }

    /// Stop playing and cancel the pending tick.
    pub fn pause(&mut self) {
        self.playing = false;
        self.due_ms = None;
    }

    pub fn due_ms(&self) -> Option<u64> {
        self.due_ms
    }

    /// Fire the pending tick if it is due.
    pub fn poll(&mut self, now_ms: u64, cursor: Cursor) -> PlaybackEvent {
        let Some(due) = self.due_ms.filter(|_| self.playing) else {
            return PlaybackEvent::Idle;
        };
        if now_ms < due {
            return PlaybackEvent::Idle;
        }
        let event = if cursor.sub_step < cursor.max_substep {
            PlaybackEvent::AdvanceSubStep
        } else if cursor.step_index + 1 < cursor.step_count {
            PlaybackEvent::AdvanceStep
        } else {
            PlaybackEvent::Finished
        };
        if event == PlaybackEvent::Finished {
            self.pause();
        } else {
            self.due_ms = Some(now_ms.saturating_add(self.delay_ms));
        }
        event
    }
}
