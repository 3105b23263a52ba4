pub mod in_memory_token_repository;
pub mod token_repository;

pub use in_memory_token_repository::InMemoryTokenRepository;
pub use token_repository::{MarkUsedOutcome, MongoTokenRepository, TokenRepository};

#[cfg(test)]
pub use token_repository::MockTokenRepository;
