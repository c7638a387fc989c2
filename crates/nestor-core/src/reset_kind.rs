#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetKind {
    PowerOn, // cold boot / power cycle, work RAM reinitialised
    Soft,    // reset button, work RAM preserved
}
