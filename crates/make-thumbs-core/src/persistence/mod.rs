mod pair_log;
mod store;

pub use pair_log::PairLog;
pub use store::{ensure_dir, StorePlan, ThumbnailStore};
