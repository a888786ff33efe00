use hz_core::Vec3;

/// An external notification delivered to a running tree.
///
/// Long-running leaves poll their own status; signals are how that status
/// changes between ticks.
#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    /// Steering reached its destination.  Completes running `MoveTo` and
    /// `SteerTo` leaves.
    Arrived { destination: Vec3 },
    /// A melee swing recovered.  Completes running `Melee` leaves.
    MeleeFinished,
    /// A named event.  `source` is the named object that raised it, or
    /// `None` when it was raised on the tree's own owner.  Matching
    /// `ImpulseReceiver`s jump the tree to their target node.
    Impulse { name: String, source: Option<String> },
}

impl Signal {
    pub fn impulse(name: impl Into<String>) -> Self {
        Signal::Impulse { name: name.into(), source: None }
    }

    pub fn impulse_from(source: impl Into<String>, name: impl Into<String>) -> Self {
        Signal::Impulse { name: name.into(), source: Some(source.into()) }
    }
}
