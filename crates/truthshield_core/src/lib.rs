pub mod cache;
pub mod chat;
pub mod domain;
pub mod pagination;
pub mod ports;

pub use cache::{CacheKey, ResultCache};
pub use chat::{fact_check_context, format_fact_check_results, ExtractedClaim};
pub use domain::{
    ChatMessage, ChatRole, ClaimPage, ClaimRecord, FormattedDate, PageToken, ReviewRecord,
    SearchError, SearchResult,
};
pub use pagination::{PaginationError, PaginationState};
pub use ports::{
    ChatResponseService, ClaimExtractionService, FactCheckService, PortError, PortResult,
    ThumbnailService,
};
