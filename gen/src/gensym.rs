/// Fresh-name supply.
///
/// Names have the form `base#n`. `#` never occurs in a schema identifier, so
/// a fresh name cannot capture or be captured by user bindings. One supply
/// is created per declaration and threaded through every synthesizer.
#[derive(Debug, Clone, Default)]
pub struct Gensym {
    next: u32,
}

impl Gensym {
    #[inline]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    pub fn fresh(&mut self, base: &str) -> String {
        let n = self.next;
        self.next += 1;
        format!("{base}#{n}")
    }

    /// Number of names handed out so far.
    #[inline]
    pub const fn count(&self) -> u32 {
        self.next
    }
}
