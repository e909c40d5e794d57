pub mod aggregate;

pub use aggregate::{UserDto, UserId, UserProfile};
