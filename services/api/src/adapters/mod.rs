pub mod chat_llm;
pub mod db;
pub mod safety;

pub use chat_llm::OpenAiChatAdapter;
pub use db::DbAdapter;
pub use safety::IpqsSafetyAdapter;
