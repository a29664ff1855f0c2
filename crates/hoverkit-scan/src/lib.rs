//! UI tree scanner.
//!
//! Given the node an event came from and the active window's tree, the
//! [`Scanner`] finds the surrounding message list (walking at most
//! [`MAX_ANCESTOR_STEPS`] nodes up), collects every text node beneath it, and
//! sorts the whole window into role buckets: input fields, send buttons and
//! message lists. The output is an owned [`ScanResult`] with no references
//! back into the host tree.
//!
//! What counts as a "list container" is host specific, so it is driven by a
//! configurable set of class-name regexes ([`ListPatterns`]).

mod error;
mod patterns;
mod result;
mod scanner;

pub use error::{Error, Result};
pub use patterns::{DEFAULT_LIST_PATTERNS, ListPatterns};
pub use result::{FoundNode, MessageList, NOT_AVAILABLE, ScanResult, TextEntry};
pub use scanner::{MAX_ANCESTOR_STEPS, ScanTarget, Scanner, collect_texts};
