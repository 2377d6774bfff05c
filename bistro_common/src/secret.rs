use std::fmt;

/// A configuration value, such as the token signing key, that must never appear in logs.
///
/// Both `Debug` and `Display` print a fixed mask; the only path to the value is an explicit
/// [`reveal`](Secret::reveal) at the point of use.
pub struct Secret<T>(T);

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn reveal(&self) -> &T {
        &self.0
    }

    /// Consumes the wrapper, for handing the value to an API that takes ownership.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Default> Default for Secret<T> {
    fn default() -> Self {
        Self(T::default())
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn formatting_never_leaks_the_value() {
        let secret = Secret::new("hunter2".to_string());
        assert_eq!(format!("{secret}"), "[redacted]");
        assert!(!format!("{secret:?}").contains("hunter2"));
        assert_eq!(secret.reveal(), "hunter2");
        assert_eq!(secret.into_inner(), "hunter2");
    }
}
