//! Lookout Agent
//!
//! Routes a chat message to one of two answering strategies:
//!
//! - **Browse**: the message names a URL. A fresh browser session loads the page, the visible
//!   interactive elements are outlined, and a vision model answers from a screenshot. The answer
//!   is appended to the knowledge base so later questions can be answered without browsing.
//! - **Retrieve**: no URL. The knowledge base supplies the most relevant passage and a text model
//!   answers from it.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lookout_agent::{Agent, AgentConfig};
//!
//! let agent = Agent::new(Arc::new(knowledge), text_model, vision_model, browser)
//!     .with_config(AgentConfig::new().with_max_browse_steps(3));
//!
//! let answer = agent.handle("go to https://example.com and find the price").await?;
//! let later = agent.handle("What is the price?").await?;
//! ```

mod agent;
mod config;
mod error;
pub mod prompt;
mod route;

pub use agent::Agent;
pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use route::{Route, extract_url};
