//! Actor identity ("whodunnit") providers.

/// Resolves who is performing the current change.
///
/// Called once per recorded version. The value is stored verbatim and never
/// interpreted.
pub trait ActorProvider: Send + Sync {
    fn whodunnit(&self) -> Option<String>;
}

/// No attribution: every version is recorded without an actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoActor;

impl ActorProvider for NoActor {
    fn whodunnit(&self) -> Option<String> {
        None
    }
}

/// Attributes every change to the same actor.
#[derive(Debug, Clone)]
pub struct FixedActor(pub String);

impl FixedActor {
    pub fn new(actor: impl Into<String>) -> Self {
        Self(actor.into())
    }
}

impl ActorProvider for FixedActor {
    fn whodunnit(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

impl<F> ActorProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn whodunnit(&self) -> Option<String> {
        self()
    }
}
