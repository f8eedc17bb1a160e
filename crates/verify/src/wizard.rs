use colcheck_core::{Checkpoint, HostError, TableHost};

/// What the wizard panel currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chrome {
    /// The wizard's own controls.
    Default,
    /// Controls hidden while the correction prompt is up.
    Verification,
}

/// The flow that typed the columns and hands them over for verification.
pub trait Wizard {
    fn name(&self) -> &str;

    /// History checkpoint taken before the wizard's transform. Undo returns
    /// the host here.
    fn checkpoint(&self) -> Checkpoint;

    /// Recompute the wizard's transform with its last configuration. Called
    /// after the user has fixed values, before re-verification.
    fn rerun(&mut self, host: &mut dyn TableHost) -> Result<(), HostError>;

    /// Wizards without a panel ignore this.
    fn set_chrome(&mut self, _chrome: Chrome) {}

    /// All columns are clear or were accepted.
    fn complete(&mut self);

    /// The session was undone back to `checkpoint()`.
    fn reverted(&mut self) {}
}
