pub mod format;

pub use format::{format_fixed, format_number, format_fee_tier};
