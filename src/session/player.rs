use crate::{
    foundation::error::FlowResult,
    model::step::Step,
    session::mount::{MountOpts, SceneMount},
    timeline::{
        playback::{Cursor, Playback, PlaybackEvent},
        stages::View,
    },
};

/// Steps through a whole example: substeps within a step, then the next step.
///
/// In the training view, auto-play keeps the finished step on screen for one extra timer tick
/// before the next step's data replaces it.
#[derive(Debug)]
pub struct StepPlayer {
    steps: Vec<Step>,
    index: usize,
    mount: SceneMount,
    playback: Playback,
    /// Set while the previous step is held on screen after an auto-advance.
    held: bool,
}

impl StepPlayer {
    /// Validate `steps`, mount the first one and snap it to substep 0.
    pub fn new(steps: Vec<Step>, opts: MountOpts, delay_ms: u64) -> FlowResult<Self> {
        for s in &steps {
            s.validate()?;
        }
        let mut mount = SceneMount::new(opts)?;
        if let Some(first) = steps.first() {
            mount.set_step(first.clone())?;
        }
        Ok(Self {
            steps,
            index: 0,
            mount,
            playback: Playback::new(delay_ms),
            held: false,
        })
    }

    pub fn mount(&self) -> &SceneMount {
        &self.mount
    }

    pub fn mount_mut(&mut self) -> &mut SceneMount {
        &mut self.mount
    }

    /// Index of the step the player is on. While a step is held this is already the new one.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_holding(&self) -> bool {
        self.held
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn cursor(&self) -> Cursor {
        Cursor {
            step_index: self.index,
            step_count: self.steps.len(),
            sub_step: if self.held { 0 } else { self.mount.sub_step() },
            max_substep: self.mount.last_substep(),
        }
    }

    fn mount_index(&mut self, index: usize) -> FlowResult<()> {
        self.held = false;
        self.index = index;
        match self.steps.get(index) {
            Some(step) => self.mount.set_step(step.clone()),
            None => {
                self.mount.unmount();
                Ok(())
            }
        }
    }

    fn release_hold(&mut self) -> FlowResult<()> {
        if self.held {
            self.mount_index(self.index)?;
        }
        Ok(())
    }

    /// Animate the next substep, or move to the next step. Returns `false` at the very end.
    pub fn next(&mut self) -> FlowResult<bool> {
        if self.held {
            self.release_hold()?;
            self.mount.go_to_substep(0, None);
            return Ok(true);
        }
        let cur = self.cursor();
        if cur.sub_step < cur.max_substep {
            self.mount.go_to_substep(cur.sub_step + 1, None);
            Ok(true)
        } else if self.index + 1 < self.steps.len() {
            self.mount_index(self.index + 1)?;
            self.mount.go_to_substep(0, None);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Show the previous substep completed, or the last substep of the previous step.
    pub fn prev(&mut self) -> FlowResult<bool> {
        if self.held {
            // The held step is still on screen; stepping back just drops the pending swap.
            self.held = false;
            self.index = self.index.saturating_sub(1);
            return Ok(true);
        }
        let sub = self.mount.sub_step();
        if sub > 0 {
            self.mount.jump_to_substep(sub - 1);
            Ok(true)
        } else if self.index > 0 {
            self.mount_index(self.index - 1)?;
            let last = self.mount.last_substep();
            self.mount.jump_to_substep(last);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Start auto-play, animating the current substep right away.
    pub fn play(&mut self, now_ms: u64) -> FlowResult<()> {
        self.release_hold()?;
        let sub = self.mount.sub_step();
        self.mount.go_to_substep(sub, None);
        self.playback.play(now_ms);
        Ok(())
    }

    /// Stop auto-play. The running animation finishes on its own.
    pub fn pause(&mut self) -> FlowResult<()> {
        self.playback.pause();
        self.release_hold()
    }

    /// Drive the animation by `dt` seconds and fire the auto-play timer if due at `now_ms`.
    pub fn tick(&mut self, now_ms: u64, dt: f64) -> FlowResult<PlaybackEvent> {
        self.mount.tick(dt);
        let event = self.playback.poll(now_ms, self.cursor());
        match event {
            PlaybackEvent::Idle | PlaybackEvent::Finished => {}
            PlaybackEvent::AdvanceSubStep if self.held => {
                tracing::trace!(index = self.index, "releasing held step");
                self.release_hold()?;
                self.mount.go_to_substep(0, None);
            }
            PlaybackEvent::AdvanceSubStep => {
                let next = self.mount.sub_step() + 1;
                self.mount.go_to_substep(next, None);
            }
            PlaybackEvent::AdvanceStep if self.mount.view() == View::Training => {
                self.mount.finish();
                self.index += 1;
                self.held = true;
            }
            PlaybackEvent::AdvanceStep => {
                self.mount_index(self.index + 1)?;
                self.mount.go_to_substep(0, None);
            }
        }
        Ok(event)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/player.rs"]
mod tests;
