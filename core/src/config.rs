//! Parser configuration for resource limits.
//!
//! Generated parsers for recursive declarations re-enter their own parser once
//! per nesting level, so a hostile input can drive the call depth without
//! bound. [`ParseConfig`] caps that depth and the accepted input size; the
//! [`Cursor`](crate::Cursor) enforces both.
//!
//! # Example
//!
//! ```ignore
//! use formkit_core::{Cursor, ParseConfig};
//!
//! let config = ParseConfig::new().with_max_recursion_depth(512);
//! let mut cursor = Cursor::with_config("1,2,3\n", config)?;
//! ```

use crate::Error;

/// Configuration for parser resource limits.
///
/// | Setting | Default |
/// |---------|---------|
/// | `max_recursion_depth` | 128 |
/// | `max_input_len` | `usize::MAX` |
/// | `max_list_len` | 1 048 576 |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Maximum nesting of named parsers.
    ///
    /// Every entry into a declaration's parser increments the depth; going
    /// past the limit aborts with [`Error::RecursionLimitExceeded`].
    pub max_recursion_depth: usize,

    /// Maximum accepted input length in bytes.
    pub max_input_len: usize,

    /// Maximum element count of a fixed-length list.
    pub max_list_len: usize,
}

impl Default for ParseConfig {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ParseConfig {
    /// Default configuration, usable in const contexts.
    pub const DEFAULT: Self = Self {
        max_recursion_depth: 128,
        max_input_len: usize::MAX,
        max_list_len: 1 << 20,
    };

    #[inline]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Sets the maximum recursion depth. `usize::MAX` disables the limit.
    #[inline]
    pub const fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Sets the maximum input length in bytes.
    #[inline]
    pub const fn with_max_input_len(mut self, len: usize) -> Self {
        self.max_input_len = len;
        self
    }

    /// Sets the maximum element count of a fixed-length list.
    #[inline]
    pub const fn with_max_list_len(mut self, len: usize) -> Self {
        self.max_list_len = len;
        self
    }

    /// Disables the recursion limit.
    ///
    /// Only for trusted input: deeply nested data can overflow the stack.
    #[inline]
    pub const fn disable_recursion_limit(self) -> Self {
        self.with_max_recursion_depth(usize::MAX)
    }

    /// Checks an input length against `max_input_len`.
    pub fn check_input_len(&self, len: usize) -> Result<(), Error> {
        if len > self.max_input_len {
            Err(Error::InputTooLong {
                len,
                limit: self.max_input_len,
            })
        } else {
            Ok(())
        }
    }

    /// Checks a fixed list length against `max_list_len`.
    pub fn check_list_len(&self, len: usize) -> Result<(), Error> {
        if len > self.max_list_len {
            Err(Error::ListTooLong {
                len,
                limit: self.max_list_len,
            })
        } else {
            Ok(())
        }
    }
}

/// Tracks nesting depth of named parsers.
///
/// Owned by the [`Cursor`](crate::Cursor); evaluators that recurse outside a
/// parse (printing, defaults) keep their own guard.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecursionGuard {
    depth: usize,
}

impl RecursionGuard {
    #[inline]
    pub const fn new() -> Self {
        Self { depth: 0 }
    }

    /// Current depth.
    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Enter one level, failing once the depth passes `limit`.
    #[inline]
    pub fn enter(&mut self, limit: usize) -> Result<(), Error> {
        self.depth = self.depth.saturating_add(1);
        if self.depth > limit {
            Err(Error::RecursionLimitExceeded {
                depth: self.depth,
                limit,
            })
        } else {
            Ok(())
        }
    }

    /// Leave one level. Saturates at zero.
    #[inline]
    pub fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn reset(&mut self) {
        self.depth = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_defaults() {
        let config = ParseConfig::default();
        assert_eq!(config.max_recursion_depth, 128);
        assert_eq!(config.max_input_len, usize::MAX);
        assert_eq!(config.max_list_len, 1 << 20);
    }

    #[test]
    fn test_parse_config_builder() {
        let config = ParseConfig::new()
            .with_max_recursion_depth(256)
            .with_max_input_len(4096);

        assert_eq!(config.max_recursion_depth, 256);
        assert_eq!(config.max_input_len, 4096);
    }

    #[test]
    fn test_input_len_limit() {
        let config = ParseConfig::new().with_max_input_len(3);
        assert!(config.check_input_len(3).is_ok());
        assert_eq!(
            config.check_input_len(4),
            Err(Error::InputTooLong { len: 4, limit: 3 })
        );
    }

    #[test]
    fn test_list_len_limit() {
        let config = ParseConfig::new().with_max_list_len(10);
        assert!(config.check_list_len(10).is_ok());
        assert_eq!(
            config.check_list_len(usize::MAX),
            Err(Error::ListTooLong {
                len: usize::MAX,
                limit: 10
            })
        );
    }

    #[test]
    fn test_recursion_guard_limit_exceeded() {
        let mut guard = RecursionGuard::new();

        for _ in 0..3 {
            guard.enter(3).unwrap();
        }
        assert_eq!(guard.depth(), 3);

        let result = guard.enter(3);
        assert!(matches!(
            result,
            Err(Error::RecursionLimitExceeded { depth: 4, limit: 3 })
        ));
    }

    #[test]
    fn test_recursion_guard_exit_saturates() {
        let mut guard = RecursionGuard::new();
        guard.exit();
        guard.exit();
        assert_eq!(guard.depth(), 0);

        guard.enter(8).unwrap();
        guard.reset();
        assert_eq!(guard.depth(), 0);
    }
}
