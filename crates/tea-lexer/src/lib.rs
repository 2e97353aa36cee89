// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scanner for Tea templates.
//!
//! Splits template source into raw text runs and code tokens. Code regions
//! are delimited by `<%` and `%>`.

mod error;
mod literal;
mod scanner;

pub use error::LexError;
pub use literal::decode_number;
pub use scanner::{ScanMode, Scanner};
