pub mod job;
pub mod loaders;
pub mod profile;
pub mod search;

pub use job::{ApplicationAttempt, ApplyResult, JobCard, RunStats};
pub use loaders::{list_profiles, load_profile, select_profile};
pub use profile::{CandidateProfile, DefaultAnswers, RawProfile, Uploads};
pub use search::{date_filter_name, SearchQuery, PAGE_SIZE};
