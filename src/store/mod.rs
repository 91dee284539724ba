pub mod cache;
pub mod student;

pub use cache::{CacheRepository, CardLookup};
pub use student::StudentRepository;
