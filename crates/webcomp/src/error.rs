#![forbid(unsafe_code)]

//! Errors from binding operations.

use std::fmt;

/// Failure of a binding operation on an element whose DOM errors are `E`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError<E> {
    /// The element has no listener registry: update before attach, or after
    /// disposal.
    NotAttached,
    /// The resolved parameter set was neither an object nor empty.
    InvalidParams { found: &'static str },
    /// The element rejected a mutation. Carried unchanged.
    Dom(E),
}

impl<E> BindError<E> {
    /// The platform error, if this is one.
    pub fn into_dom(self) -> Option<E> {
        match self {
            Self::Dom(err) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::NotAttached)
    }
}

impl<E: fmt::Display> fmt::Display for BindError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAttached => write!(f, "element has no webcomp binding attached"),
            Self::InvalidParams { found } => {
                write!(f, "binding parameters must be an object, found {found}")
            }
            Self::Dom(err) => write!(f, "DOM mutation failed: {err}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for BindError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Dom(err) => Some(err),
            _ => None,
        }
    }
}

impl<E> From<E> for BindError<E> {
    fn from(err: E) -> Self {
        Self::Dom(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn into_dom_yields_only_platform_errors() {
        assert_eq!(BindError::Dom("rejected").into_dom(), Some("rejected"));
        assert_eq!(BindError::<&str>::NotAttached.into_dom(), None);
        assert_eq!(BindError::<&str>::InvalidParams { found: "string" }.into_dom(), None);
    }

    #[test]
    fn lifecycle_and_display() {
        let detached = BindError::<&str>::NotAttached;
        assert!(detached.is_lifecycle());
        assert!(!BindError::Dom("x").is_lifecycle());
        assert_eq!(detached.to_string(), "element has no webcomp binding attached");
        assert_eq!(BindError::Dom("x").to_string(), "DOM mutation failed: x");
    }
}
