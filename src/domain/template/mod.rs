pub mod markup;
pub use markup::*;

pub mod tpl;
pub use tpl::{MergeTpl, Preview};
