//! Running narrative context.

/// Separator placed after every appended caption.
pub const CONTEXT_SEPARATOR: &str = "\n";

/// Accumulated captions of one run, oldest first.
///
/// Each run owns its own value; nothing here is shared between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NarrativeContext {
    text: String,
    captions: usize,
}

impl NarrativeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a caption followed by the separator.
    pub fn append(&mut self, caption: &str) {
        self.text.push_str(caption);
        self.text.push_str(CONTEXT_SEPARATOR);
        self.captions += 1;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of captions appended so far.
    pub fn len(&self) -> usize {
        self.captions
    }

    pub fn is_empty(&self) -> bool {
        self.captions == 0
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.captions = 0;
    }

    /// Consume the context, returning the accumulated text.
    pub fn into_inner(self) -> String {
        self.text
    }
}
