pub mod barrier_classifier;
pub mod card_scanner;
pub mod detail_extractor;
pub mod history_store;
pub mod interaction;
pub mod paginator;
pub mod rate_limiter;
pub mod submitter;

pub use barrier_classifier::BarrierClassifier;
pub use card_scanner::{Card, CardScanner};
pub use detail_extractor::DetailExtractor;
pub use history_store::HistoryStore;
pub use interaction::{ClickOutcome, Interactor};
pub use paginator::{PageDecision, Paginator};
pub use rate_limiter::RateLimiter;
pub use submitter::{SubmitOutcome, Submitter};
