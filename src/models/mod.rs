pub mod appointment;
pub mod enums;
pub mod patient;
pub mod settings;

pub use appointment::*;
pub use enums::*;
pub use patient::*;
pub use settings::*;
