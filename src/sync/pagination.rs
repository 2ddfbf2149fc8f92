//! Mapping "page P of size S, newest first" onto IMAP sequence numbers.
//!
//! Sequence numbers ascend with arrival, so the newest page sits at the top
//! of the range: page 1 of a 100-message folder with size 20 is `81:100`.

/// Inclusive ascending sequence range, `1 <= lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqWindow {
    pub lo: u32,
    pub hi: u32,
}

impl SeqWindow {
    /// Number of messages in the window.
    pub fn size(&self) -> u32 {
        self.hi - self.lo + 1
    }

    pub fn to_sequence_set(&self) -> String {
        format!("{}:{}", self.lo, self.hi)
    }
}

/// Window for `page` in a folder of `total` messages, or `None` when nothing
/// should be fetched.
///
/// - `page_size == 0` means unpaged: the whole folder.
/// - `page == 0` is treated as page 1.
/// - A page that starts past the oldest message yields `None`; it never
///   wraps around to re-serve older pages.
pub fn sequence_window(total: u32, page: u32, page_size: u32) -> Option<SeqWindow> {
    if total == 0 {
        return None;
    }
    if page_size == 0 {
        return Some(SeqWindow { lo: 1, hi: total });
    }

    // u32 * u32 always fits in u64
    let offset = u64::from(page.max(1) - 1) * u64::from(page_size);
    if offset >= u64::from(total) {
        return None;
    }

    let hi = total - offset as u32;
    let lo = hi.saturating_sub(page_size - 1).max(1);
    Some(SeqWindow { lo, hi })
}
