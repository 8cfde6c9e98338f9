/// One button a machine exposes to its front-end.
pub struct InputButton {
    /// Identifier passed back through [`Machine::set_input`].
    pub id: u8,
    /// Label for key bindings and help text, e.g. "P1 Fire".
    pub name: &'static str,
}

/// Machine-agnostic interface for emulated systems.
///
/// A front-end (interactive or headless) drives a machine exclusively through
/// this trait: it polls its own input devices, forwards button events, steps
/// frames at whatever pace it chooses, and renders the decoded video. The
/// machine itself never sleeps or throttles.
pub trait Machine {
    /// Native raster size as (width, height), before any monitor rotation.
    fn display_size(&self) -> (u32, u32);

    /// Advance emulation by exactly one video frame.
    fn run_frame(&mut self);

    /// Convert the last decoded frame to RGB24.
    ///
    /// `buffer` holds `width * height * 3` bytes (see `display_size()`),
    /// filled in the machine's native scan order.
    fn render_frame(&self, buffer: &mut [u8]);

    /// Press (`true`) or release (`false`) one button from `input_map()`.
    /// The state is latched until the next call for the same button.
    fn set_input(&mut self, button: u8, pressed: bool);

    fn input_map(&self) -> &[InputButton];

    /// Return to power-on state. ROM and configuration are kept.
    fn reset(&mut self);

    /// Nominal frame rate, for front-ends that pace emulation to real time.
    fn frame_rate_hz(&self) -> f64;
}
