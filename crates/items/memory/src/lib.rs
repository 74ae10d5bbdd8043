mod repository;

pub use repository::MemoryItemRepository;
