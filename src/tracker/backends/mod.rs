pub mod stub;

#[cfg(feature = "tracker-tract")]
pub mod tract;

pub use stub::StubTracker;

#[cfg(feature = "tracker-tract")]
pub use tract::TractTracker;
