//! Generation configuration.
//!
//! # Example
//!
//! ```ignore
//! use formkit_gen::{Capabilities, GenConfig};
//!
//! let config = GenConfig::new()
//!     .with_default_caps(Capabilities::ALL)
//!     .with_fail_fast(true);
//! ```

use crate::capability::Capabilities;

/// | Setting | Default |
/// |---------|---------|
/// | `default_caps` | [`Capabilities::DEFAULT`] |
/// | `fail_fast` | `false` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenConfig {
    /// Capabilities of declarations that do not list their own.
    pub default_caps: Capabilities,

    /// Stop at the first rejected declaration instead of collecting every
    /// rejection and emitting the rest.
    pub fail_fast: bool,
}

impl Default for GenConfig {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl GenConfig {
    pub const DEFAULT: Self = Self {
        default_caps: Capabilities::DEFAULT,
        fail_fast: false,
    };

    #[inline]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    #[inline]
    pub const fn with_default_caps(mut self, caps: Capabilities) -> Self {
        self.default_caps = caps;
        self
    }

    #[inline]
    pub const fn with_fail_fast(mut self, on: bool) -> Self {
        self.fail_fast = on;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = GenConfig::new()
            .with_default_caps(Capabilities::ALL)
            .with_fail_fast(true);
        assert_eq!(config.default_caps, Capabilities::ALL);
        assert!(config.fail_fast);
        assert_eq!(GenConfig::default(), GenConfig::DEFAULT);
    }
}
