pub mod config;
pub mod quotes;
pub mod random;

pub use quotes::{format_author_key, QuoteFormat, QuoteGroup, QuoteStore, QuoteStoreError};
pub use random::{FixedIndex, IndexSource, ThreadRngIndex};
