pub mod listing_ctx;
pub mod listing_flow;

pub use listing_ctx::ListingCtx;
pub use listing_flow::{decide_branch, Branch, FlowResult, ListingFlow};
