pub mod memory;
pub mod traits;

pub use memory::InMemoryBackend;
pub use traits::FactStore;
