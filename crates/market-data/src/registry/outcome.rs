/// Result of one retrieval call.
///
/// Either a value is present (possibly with a warning about how it was
/// obtained) or `error` explains why nothing could be produced. The
/// constructors are the only way to build one, so a half-filled outcome
/// cannot exist.
#[derive(Clone, Debug, PartialEq)]
pub struct RetrievalOutcome<T> {
    value: Option<T>,
    cached: bool,
    warning: Option<String>,
    error: Option<String>,
}

impl<T> RetrievalOutcome<T> {
    /// Live value from the primary source.
    pub fn live(value: T) -> Self {
        Self {
            value: Some(value),
            cached: false,
            warning: None,
            error: None,
        }
    }

    /// Live value that needed a fallback source.
    pub fn live_with_warning(value: T, warning: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            cached: false,
            warning: Some(warning.into()),
            error: None,
        }
    }

    /// Fresh value served from cache.
    pub fn cached(value: T) -> Self {
        Self {
            value: Some(value),
            cached: true,
            warning: None,
            error: None,
        }
    }

    /// Expired value served because every live source failed.
    pub fn stale(value: T, warning: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            cached: true,
            warning: Some(warning.into()),
            error: None,
        }
    }

    /// Nothing could be produced.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            value: None,
            cached: false,
            warning: None,
            error: Some(error.into()),
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    pub fn is_cached(&self) -> bool {
        self.cached
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.value.is_some()
    }

    /// Split into the value (with its cached flag and warning) or the error text.
    pub fn into_result(self) -> Result<Retrieved<T>, String> {
        match self.value {
            Some(value) => Ok(Retrieved {
                value,
                cached: self.cached,
                warning: self.warning,
            }),
            None => Err(self
                .error
                .unwrap_or_else(|| "no value retrieved".to_string())),
        }
    }
}

/// Successful half of a [`RetrievalOutcome`].
#[derive(Clone, Debug, PartialEq)]
pub struct Retrieved<T> {
    pub value: T,
    pub cached: bool,
    pub warning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_has_error_and_no_value() {
        let outcome: RetrievalOutcome<u32> = RetrievalOutcome::failed("boom");
        assert!(!outcome.is_success());
        assert_eq!(outcome.error(), Some("boom"));
        assert_eq!(outcome.into_result(), Err("boom".to_string()));
    }

    #[test]
    fn test_stale_is_cached_with_warning() {
        let outcome = RetrievalOutcome::stale(5, "stale");
        assert!(outcome.is_cached());
        assert_eq!(outcome.warning(), Some("stale"));
        assert_eq!(outcome.error(), None);

        let retrieved = outcome.into_result().unwrap();
        assert_eq!(retrieved.value, 5);
        assert!(retrieved.cached);
    }
}
