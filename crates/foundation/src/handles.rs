use std::fmt;
use std::str::FromStr;

/// Generational handle: `(index, generation)`.
///
/// A handle outlives the value it points at; arenas bump the slot generation
/// on removal so a stale handle never resolves to a newer occupant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32, u32);

impl Handle {
    pub fn new(index: u32, generation: u32) -> Self {
        Handle(index, generation)
    }

    pub fn index(&self) -> u32 {
        self.0
    }

    pub fn generation(&self) -> u32 {
        self.1
    }
}

/// Formats as `<index>v<generation>`, e.g. `12v0`.
impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.0, self.1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseHandleError(pub String);

impl fmt::Display for ParseHandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid handle: {:?}", self.0)
    }
}

impl std::error::Error for ParseHandleError {}

impl FromStr for Handle {
    type Err = ParseHandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseHandleError(s.to_string());
        let (index, generation) = s.split_once('v').ok_or_else(err)?;
        let index = index.parse().map_err(|_| err())?;
        let generation = generation.parse().map_err(|_| err())?;
        Ok(Handle(index, generation))
    }
}

#[cfg(test)]
mod tests {
    use super::Handle;

    #[test]
    fn display_and_parse_agree() {
        let h = Handle::new(12, 3);
        assert_eq!(h.to_string(), "12v3");
        assert_eq!("12v3".parse::<Handle>(), Ok(h));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("12".parse::<Handle>().is_err());
        assert!("av1".parse::<Handle>().is_err());
        assert!("1v".parse::<Handle>().is_err());
    }
}
