use std::fmt;

use recoil_core::{OwnerId, PropertyHost};

/// Timing information handed to a custom animation step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CustomFrame {
    pub owner: OwnerId,
    /// Time of the current frame
    pub current_time: f64,
    /// Time since the previous frame
    pub elapsed_time: f64,
}

/// Custom step callback. Return `false` once the animation is finished.
pub type CustomStep = Box<dyn FnMut(&mut dyn PropertyHost, &CustomFrame) -> bool + Send>;

/// An animation whose values are produced by a caller-supplied step
pub struct CustomAnimation {
    step: CustomStep,
    pub(crate) finished: bool,
}

impl fmt::Debug for CustomAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomAnimation")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl CustomAnimation {
    pub(crate) fn new(step: CustomStep) -> Self {
        Self {
            step,
            finished: false,
        }
    }

    pub(crate) fn advance(&mut self, host: &mut dyn PropertyHost, frame: &CustomFrame) -> bool {
        self.finished = !(self.step)(host, frame);
        true
    }
}
