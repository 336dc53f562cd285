//! Universal stand-in values.
//!
//! A [`Synthetic`] absorbs arbitrary attribute access and arbitrary calls,
//! always yielding another synthetic. Its only state is the access path used
//! for display; it has no identity shared across calls.

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Access paths longer than this are cut so chained access stays cheap.
const MAX_PATH_LEN: usize = 200;

const ELLIPSIS: &str = "...";

/// Placeholder value usable wherever a concrete argument is required.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Synthetic {
    path: Arc<str>,
}

impl Synthetic {
    /// A fresh synthetic rooted at `root` (typically the parameter name).
    pub fn named(root: &str) -> Self {
        Self::from_path(root.to_string())
    }

    fn from_path(mut path: String) -> Self {
        if path.len() > MAX_PATH_LEN {
            let mut cut = MAX_PATH_LEN;
            while !path.is_char_boundary(cut) {
                cut -= 1;
            }
            path.truncate(cut);
            path.push_str(ELLIPSIS);
        }
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Attribute access: always succeeds.
    pub fn attr(&self, name: &str) -> Synthetic {
        if self.path.ends_with(ELLIPSIS) {
            return self.clone();
        }
        Self::from_path(format!("{}.{}", self.path, name))
    }

    /// Invocation with arbitrary arguments: always succeeds.
    pub fn call(&self, _args: &[Value]) -> Synthetic {
        if self.path.ends_with(ELLIPSIS) {
            return self.clone();
        }
        Self::from_path(format!("{}()", self.path))
    }
}

impl fmt::Display for Synthetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<synthetic {}>", self.path)
    }
}

impl fmt::Debug for Synthetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chained_access() {
        let s = Synthetic::named("conn");
        let r = s.attr("request").call(&[Value::Int(1)]).attr("status");
        assert_eq!(r.path(), "conn.request().status");
    }

    #[test]
    fn test_long_chain_is_bounded() {
        let mut s = Synthetic::named("x");
        for _ in 0..10_000 {
            s = s.attr("next").call(&[]);
        }
        assert!(s.path().len() <= MAX_PATH_LEN + ELLIPSIS.len());
        assert!(s.path().ends_with(ELLIPSIS));
    }
}
