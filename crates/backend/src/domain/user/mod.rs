pub mod repository;
pub mod service;

pub use repository::UserRepository;
pub use service::UserService;
