/// Identifies one issued load. Tokens compare by issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Generation counter deciding whether an async result is still wanted.
///
/// Only the most recently issued token is current; every earlier one is
/// stale as soon as a newer one exists.
#[derive(Debug, Default)]
pub struct TokenGenerator {
    last: u64,
}

impl TokenGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> RequestToken {
        self.last += 1;
        RequestToken(self.last)
    }

    #[must_use]
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.last != 0 && token.0 == self.last
    }

    /// Makes every issued token stale without issuing a new one.
    pub fn invalidate(&mut self) {
        self.last += 1;
    }
}
