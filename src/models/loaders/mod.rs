pub mod profile_loader;

pub use profile_loader::{list_profiles, load_profile, pick_profile, select_profile};
