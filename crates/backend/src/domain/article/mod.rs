pub mod repository;
pub mod service;

pub use repository::ArticleRepository;
pub use service::ArticleService;
