//! Frame loop for unattended runs.

use invaders_machines::space_invaders::SpaceInvadersSystem;

use crate::config::InputEvent;

/// Input changes ordered by frame. Later events for the same frame win.
#[derive(Debug, Default)]
pub struct InputSchedule {
    events: Vec<InputEvent>,
    next: usize,
}

impl InputSchedule {
    pub fn new(mut events: Vec<InputEvent>) -> Self {
        // Stable: keeps command-line order within a frame.
        events.sort_by_key(|event| event.frame);
        Self { events, next: 0 }
    }

    /// Input bits to latch before `frame`, if any event is due.
    pub fn due(&mut self, frame: u64) -> Option<u8> {
        let mut bits = None;
        while let Some(event) = self.events.get(self.next) {
            if event.frame > frame {
                break;
            }
            bits = Some(event.bits);
            self.next += 1;
        }
        bits
    }
}

pub struct RunSettings {
    pub frames: u64,
    /// 0 disables reporting.
    pub report_every: u64,
}

/// Step `settings.frames` frames, applying scheduled input and logging an
/// observation line every `report_every` frames.
pub fn run(sys: &mut SpaceInvadersSystem, settings: &RunSettings, schedule: &mut InputSchedule) {
    for _ in 0..settings.frames {
        if let Some(bits) = schedule.due(sys.frame_count()) {
            log::debug!("frame {}: input 0x{bits:02X}", sys.frame_count());
            sys.set_input_bits(bits);
        }
        sys.step_frame();

        if settings.report_every != 0 && sys.frame_count() % settings.report_every == 0 {
            report(sys);
        }
    }
}

fn report(sys: &SpaceInvadersSystem) {
    match sys.observe() {
        Ok(obs) => log::info!(
            "frame {}: score {} lives {} aliens {} game over {}",
            sys.frame_count(),
            obs.score(),
            obs.lives(),
            obs.alien_count(),
            obs.is_game_over()
        ),
        Err(e) => log::debug!("frame {}: {e}", sys.frame_count()),
    }
}
