pub mod enums;

pub use enums::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid enum value for {field}: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}
