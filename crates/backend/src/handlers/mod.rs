pub mod articles;
pub mod bookings;
pub mod users;
