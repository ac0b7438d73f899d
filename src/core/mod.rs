// Pure building blocks shared by the upstream adapters and routes
pub mod bbox;
pub mod fields;
pub mod hashing;
pub mod retry;

pub use bbox::{parse_bbox, to_web_mercator, Bbox, BboxError, BboxInput};
pub use fields::FieldTable;
pub use hashing::{hash_key, record_id, CacheKey};
pub use retry::{run_with_retry, AttemptOutcome, RetryPolicy, Sleeper, TokioSleeper};
