//! Signals exchanged between components over channels.

use std::any::Any;
use std::fmt::Debug;

/// A value produced on an output link and consumed on input links.
///
/// Component libraries define their own signal types; consumers downcast with
/// [`downcast_ref`](trait.Signal.html#method.downcast_ref).
pub trait Signal: Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl dyn Signal {
    /// Borrow the concrete signal type, if it matches.
    pub fn downcast_ref<T: Signal + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Single floating point value (speed, acceleration, steering angle, ...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarSignal(pub f64);

impl Signal for ScalarSignal {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Ordered list of floating point values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorSignal(pub Vec<f64>);

impl Signal for VectorSignal {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
