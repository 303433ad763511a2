pub mod merge;
pub use merge::*;

pub mod recipient;
pub use recipient::*;

pub mod row;
pub use row::*;

pub mod template;
pub use template::*;
