//! The chat agent.

use std::sync::Arc;

use askama::Template;
use lookout_browser::{Browser, BrowserSession, LoadState};
use lookout_core::llm::{LLMRequest, Message, model::Parameters};
use lookout_core::{EmbeddingModel, LanguageModel};
use lookout_rag::KnowledgeBase;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::prompt::{
    BrowseDirective, BrowseSystemPrompt, RETRIEVE_SYSTEM_PROMPT, RetrievePrompt, unescape_newlines,
};
use crate::route::Route;

/// Answers chat messages by browsing or by retrieval.
///
/// A message containing a URL is answered by a vision model looking at a screenshot of that
/// page, and the answer is appended to the knowledge base. Any other message is answered by a
/// text model from the passages the knowledge base retrieves for it.
///
/// # Example
///
/// ```rust,ignore
/// use lookout_agent::Agent;
///
/// let agent = Agent::new(knowledge, haiku, opus, ChromeBrowser::default());
/// let answer = agent.handle("go to https://example.com and find the price").await?;
/// ```
pub struct Agent<E, T, V, B> {
    knowledge: Arc<KnowledgeBase<E>>,
    text_model: T,
    vision_model: V,
    browser: B,
    config: AgentConfig,
}

impl<E, T, V, B> std::fmt::Debug for Agent<E, T, V, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<E, T, V, B> Agent<E, T, V, B>
where
    E: EmbeddingModel,
    T: LanguageModel,
    V: LanguageModel,
    B: Browser,
{
    /// Creates an agent with the default configuration.
    pub fn new(knowledge: Arc<KnowledgeBase<E>>, text_model: T, vision_model: V, browser: B) -> Self {
        Self {
            knowledge,
            text_model,
            vision_model,
            browser,
            config: AgentConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub const fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Configuration in use.
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// The knowledge base answers are read from and appended to.
    pub const fn knowledge(&self) -> &Arc<KnowledgeBase<E>> {
        &self.knowledge
    }

    /// Answers one chat message.
    ///
    /// # Errors
    ///
    /// Browse mode fails with [`AgentError::Navigation`] or [`AgentError::Screenshot`] when the
    /// page cannot be captured. Retrieve mode fails with [`AgentError::KnowledgeBase`] when
    /// nothing can be retrieved, for instance before initialization. Either mode fails with
    /// [`AgentError::Model`] when the model call fails.
    pub async fn handle(&self, message: &str) -> Result<String> {
        match Route::of(message) {
            Route::Browse(url) => self.browse(message, url).await,
            Route::Retrieve => self.retrieve(message).await,
        }
    }

    /// Answers `message` from a screenshot of `url` and remembers the answer.
    ///
    /// The browser session is released whether or not the answer was produced. A reply that
    /// is still a `{"url"}` or `{"click"}` directive when the step budget runs out is returned
    /// but not added to the knowledge base.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub async fn browse(&self, message: &str, url: Url) -> Result<String> {
        info!(%url, "answering by browsing");
        let session = self.browser.acquire().await?;
        let outcome = self.browse_in(&session, message, url).await;
        if let Err(e) = session.release().await {
            warn!(error = %e, "failed to release browser session");
        }
        let answer = outcome?;

        if BrowseDirective::parse(&answer).is_some() {
            warn!("browse ended on an unfollowed directive, not remembering it");
            return Ok(answer);
        }
        match self.knowledge.append(&answer).await {
            Ok(passages) => info!(passages, "knowledge base updated with browsed answer"),
            Err(e) => warn!(error = %e, "failed to add browsed answer to the knowledge base"),
        }
        Ok(answer)
    }

    /// Answers `message` from the knowledge base.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub async fn retrieve(&self, message: &str) -> Result<String> {
        let context = self.knowledge.query(message).await?;
        debug!(context_len = context.len(), "retrieved context");

        let prompt = RetrievePrompt {
            context: &context,
            question: message,
        }
        .render()?;
        let request = LLMRequest::new([
            Message::system(RETRIEVE_SYSTEM_PROMPT),
            Message::user(prompt),
        ])
        .with_parameters(Parameters::default().max_tokens(self.config.text_max_tokens));

        self.text_model
            .respond(request)
            .await
            .map_err(|e| AgentError::Model(e.to_string()))
    }

    async fn browse_in(&self, session: &B::Session, message: &str, url: Url) -> Result<String> {
        let timeout = self.config.navigation_timeout;
        let mut current = url;
        if session.navigate(&current, timeout).await? == LoadState::TimedOut {
            debug!(url = %current, "continuing with a partially loaded page");
        }

        let mut conversation = Vec::new();
        let mut step = 1;
        loop {
            let screenshot = capture(session).await?;
            let content = if conversation.is_empty() {
                message.to_owned()
            } else {
                format!("This is the page at {current}.")
            };
            conversation.push(Message::user(content).with_attachment(screenshot));

            let reply = self.look(&current, &conversation).await?;
            if step >= self.config.max_browse_steps {
                return Ok(reply);
            }
            let Some(directive) = BrowseDirective::parse(&reply) else {
                return Ok(reply);
            };
            debug!(step, ?directive, "following browse directive");

            match directive {
                BrowseDirective::Url(next) => match Url::parse(&next) {
                    Ok(next) => {
                        current = next;
                        session.navigate(&current, timeout).await?;
                    }
                    Err(e) => {
                        warn!(url = %next, error = %e, "model asked for an invalid URL");
                        return Ok(reply);
                    }
                },
                BrowseDirective::Click(label) => {
                    if !session.click(&label, timeout).await? {
                        debug!(label = %label, "no annotated element matched");
                    }
                }
            }
            conversation.push(Message::assistant(reply));
            step += 1;
        }
    }

    async fn look(&self, url: &Url, conversation: &[Message]) -> Result<String> {
        let system = BrowseSystemPrompt { url: url.as_str() }.render()?;
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(Message::system(system));
        messages.extend_from_slice(conversation);

        let request = LLMRequest::new(messages)
            .with_parameters(Parameters::default().max_tokens(self.config.vision_max_tokens));
        let reply = self
            .vision_model
            .respond(request)
            .await
            .map_err(|e| AgentError::Model(e.to_string()))?;
        Ok(unescape_newlines(&reply))
    }
}

/// Labels the settled page and captures it as a `data:` URL.
async fn capture<S: BrowserSession>(session: &S) -> Result<Url> {
    match session.annotate().await {
        Ok(count) => debug!(count, "annotated elements"),
        Err(e) => warn!(error = %e, "annotation failed, capturing the page unlabelled"),
    }
    let screenshot = session.screenshot().await?;
    debug!(bytes = screenshot.data.len(), "captured page");
    Ok(screenshot.to_data_url()?)
}
