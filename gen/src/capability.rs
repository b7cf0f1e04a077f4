//! Capability flags for generated types.

/// Which capabilities a generated representation or metadata type carries.
///
/// Backends decide what each flag means for them; the Rust backend maps
/// them to derives via [`Capabilities::derives`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities {
    pub eq: bool,
    pub ord: bool,
    pub display: bool,
    pub reflect: bool,
}

impl Default for Capabilities {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Capabilities {
    /// Equality and display.
    pub const DEFAULT: Self = Self {
        eq: true,
        ord: false,
        display: true,
        reflect: false,
    };

    pub const NONE: Self = Self {
        eq: false,
        ord: false,
        display: false,
        reflect: false,
    };

    pub const ALL: Self = Self {
        eq: true,
        ord: true,
        display: true,
        reflect: true,
    };

    pub const fn with_eq(mut self, on: bool) -> Self {
        self.eq = on;
        self
    }

    pub const fn with_ord(mut self, on: bool) -> Self {
        self.ord = on;
        self
    }

    pub const fn with_display(mut self, on: bool) -> Self {
        self.display = on;
        self
    }

    pub const fn with_reflect(mut self, on: bool) -> Self {
        self.reflect = on;
        self
    }

    /// Rust derive paths, in a stable order.
    ///
    /// Ordering implies equality, since `Ord` requires `Eq`.
    pub fn derives(&self) -> Vec<&'static str> {
        let mut out = vec!["Clone"];
        if self.display {
            out.push("Debug");
        }
        if self.eq || self.ord {
            out.extend(["PartialEq", "Eq"]);
        }
        if self.ord {
            out.extend(["PartialOrd", "Ord"]);
        }
        if self.reflect {
            out.extend(["serde::Serialize", "serde::Deserialize"]);
        }
        out
    }
}
