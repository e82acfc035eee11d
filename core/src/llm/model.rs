/// Sampling parameters for a language model call.
///
/// Unset fields fall back to the provider's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Parameters {
    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl Parameters {
    /// Sets the maximum number of generated tokens.
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}
