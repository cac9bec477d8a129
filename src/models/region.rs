/// A selection in editor coordinates (code points). `a` is the anchor, `b` the caret, so
/// `a > b` for a reversed selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    pub a: usize,
    pub b: usize,
}

impl Region {
    pub const fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    pub const fn caret(at: usize) -> Self {
        Self { a: at, b: at }
    }

    pub fn begin(&self) -> usize {
        self.a.min(self.b)
    }

    pub fn end(&self) -> usize {
        self.a.max(self.b)
    }

    pub fn len(&self) -> usize {
        self.end() - self.begin()
    }

    pub fn is_empty(&self) -> bool {
        self.a == self.b
    }

    pub fn reversed(self) -> Self {
        Self {
            a: self.b,
            b: self.a,
        }
    }
}

impl From<(usize, usize)> for Region {
    fn from((a, b): (usize, usize)) -> Self {
        Self { a, b }
    }
}
