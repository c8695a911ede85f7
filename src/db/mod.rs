pub mod memory;
pub mod redis;
pub mod store;

pub use self::memory::MemoryStore;
pub use self::redis::create_redis_client;
pub use self::redis::Cache;
pub use self::redis::CacheKey;
pub use self::redis::CacheWriterHandle;
pub use self::redis::RedisStore;
pub use self::store::UserStore;
