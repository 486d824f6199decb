mod cache;
mod codec;
mod http;
mod key;
mod load;
mod source;

pub use cache::{CachedSource, global_source};
pub use codec::{Checkpoint, STATE_DICT_PREFIX, StateDict};
pub use http::HttpSource;
pub use key::{CheckpointKey, DEFAULT_URL_TEMPLATE, validate_template};
pub use load::{LoadPolicy, LoadReport, load_state_dict};
pub use source::CheckpointSource;
