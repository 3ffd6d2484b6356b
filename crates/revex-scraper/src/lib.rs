pub mod bus;
pub mod coordinator;
pub mod error;
pub mod export;
pub mod http_session;
pub mod mirror;
pub mod navigator;
pub mod normalize;
pub mod page;
pub mod parse;
pub mod reader;
pub mod resume;
pub mod runtime;
pub mod selectors;
pub mod store;
pub mod wait;

#[cfg(test)]
pub(crate) mod testkit;

pub use bus::EventBus;
pub use coordinator::{Coordinator, ExtractionPhase, LastPageStatus, PageOutcome};
pub use error::{ExtractError, SessionError, StoreError};
pub use export::{export_filename, write_csv};
pub use http_session::{build_client, HttpSession};
pub use mirror::spawn_mirror;
pub use navigator::NavOutcome;
pub use page::PageSession;
pub use resume::{load_resume_plan, plan_resume, ResumePlan};
pub use runtime::{pair, Command, Reply, Runtime, RuntimeClosed, RuntimeHandle};
pub use selectors::{SelectorConfig, Selectors};
pub use store::{get_json, set_json, JsonFileStore, MemoryStore, StateStore, STATE_KEY, SUMMARY_KEY};
