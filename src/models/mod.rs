pub mod record;
pub mod rules;
pub mod snapshot;

pub use record::{Barrier, ListingDraft, ListingRecord, Outcome};
pub use rules::{load_rules, RuleTable};
pub use snapshot::{CardSnapshot, ControlInfo, FormSnapshot, PaneSnapshot};
