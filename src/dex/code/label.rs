use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Identifies the method body that minted a label or a local
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct CodeTag(u32);

static NEXT_CODE_TAG: AtomicU32 = AtomicU32::new(0);

impl CodeTag {
    /// Get a tag that no other method body has
    pub(crate) fn fresh() -> CodeTag {
        CodeTag(NEXT_CODE_TAG.fetch_add(1, Ordering::Relaxed))
    }
}

/// Opaque label
///
/// A label identifies a basic block of one method body. Labels are created with
/// [`Code::new_label`](super::Code::new_label) and are only valid in the method body that
/// created them.
#[derive(Copy, Clone, Hash, Eq, PartialEq)]
pub struct Label {
    owner: CodeTag,
    index: u32,
}

impl Label {
    pub(crate) fn new(owner: CodeTag, index: u32) -> Label {
        Label { owner, index }
    }

    pub(crate) fn owner(&self) -> CodeTag {
        self.owner
    }

    pub(crate) fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_fmt(format_args!("l{}", self.index))
    }
}
