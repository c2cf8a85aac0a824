use std::fmt::{self, Debug, Formatter};

/// Formats permission bits the way `ls` and `chmod` spell them, e.g. `0o644`.
pub struct OctalMode(pub u32);

impl Debug for OctalMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0o{:o}", self.0)
    }
}
