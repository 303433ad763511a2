mod recipient;
pub use recipient::extract_addr;
