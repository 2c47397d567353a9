/// Monotonic generation tag.
///
/// Asynchronous completions carry the generation they were issued under so a
/// completion for a superseded request can be recognised and dropped.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// The value before anything has been issued.
    pub const ZERO: Generation = Generation(0);

    pub const fn new(n: u64) -> Self {
        Generation(n)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}
