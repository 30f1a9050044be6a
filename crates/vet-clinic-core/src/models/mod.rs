//! Domain models for the vet-clinic system.

mod appointment;
mod clinical;
mod owner;
mod patient;
mod resource;

pub use appointment::*;
pub use clinical::*;
pub use owner::*;
pub use patient::*;
pub use resource::*;
