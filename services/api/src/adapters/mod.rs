pub mod chat_llm;
pub mod claim_llm;
pub mod fact_check;
pub mod thumbnail;

pub use chat_llm::{OpenAiChatAdapter, UnconfiguredLlmAdapter};
pub use claim_llm::OpenAiClaimAdapter;
pub use fact_check::GoogleFactCheckAdapter;
pub use thumbnail::ScrapingThumbnailAdapter;
