pub mod crypto;
pub mod resume;
pub mod validation;
