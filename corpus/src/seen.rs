use ahash::AHashSet;

/// Canonical FENs already emitted during one pipeline run.
///
/// Owned by the run and passed in explicitly; never persisted.
#[derive(Debug, Default)]
pub struct SeenPositions {
    fens: AHashSet<String>,
}

impl SeenPositions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `fen` as seen. Returns false if it already was.
    pub fn insert(&mut self, fen: &str) -> bool {
        if self.fens.contains(fen) {
            return false;
        }
        self.fens.insert(fen.to_string())
    }

    pub fn contains(&self, fen: &str) -> bool {
        self.fens.contains(fen)
    }
}
