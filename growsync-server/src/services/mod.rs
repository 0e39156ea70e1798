pub mod accumulator;
pub mod connection;
pub mod firmware;
pub mod ingest;
pub mod live_cache;
pub mod posting_slot;
pub mod share;
pub mod token;

pub use accumulator::{Aggregate, LightTotals};
pub use connection::ConnectionService;
pub use firmware::FirmwareService;
pub use ingest::IngestService;
pub use live_cache::LiveCacheService;
pub use posting_slot::{
    PostingConfig, PostingSlotService, PostingWindow, RebalanceSummary, SlotAssignment,
    find_best_slot,
};
pub use share::ShareService;
pub use token::{Token, TokenClaims, TokenService};
