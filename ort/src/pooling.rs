//! Pooling strategies for collapsing token states into one embedding.

use ndarray::ArrayView2;

/// Strategy for pooling one sequence's hidden states into a single vector.
///
/// Encoder models such as UAE and BGE are trained for [`Mean`](PoolingStrategy::Mean)
/// or [`Cls`](PoolingStrategy::Cls). Decoder embedding models use
/// [`LastToken`](PoolingStrategy::LastToken).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PoolingStrategy {
    /// Average the hidden states of all non-padding tokens.
    #[default]
    Mean,

    /// Use the first token's hidden state (typically `[CLS]`).
    Cls,

    /// Use the last non-padding token's hidden state.
    LastToken,
}

impl PoolingStrategy {
    /// Pools `hidden_states` of shape `[seq_len, hidden_dim]`.
    ///
    /// `attention_mask` marks real tokens with `1` and padding with `0`. Padding
    /// positions never contribute to the result.
    #[must_use]
    pub fn apply(self, hidden_states: &ArrayView2<'_, f32>, attention_mask: &[u32]) -> Vec<f32> {
        let (seq_len, hidden_dim) = hidden_states.dim();

        match self {
            Self::Mean => {
                let mut sum = vec![0.0f32; hidden_dim];
                let mut valid = 0u32;
                for (row, _) in hidden_states
                    .rows()
                    .into_iter()
                    .zip(attention_mask)
                    .filter(|(_, mask)| **mask != 0)
                {
                    for (acc, value) in sum.iter_mut().zip(row) {
                        *acc += value;
                    }
                    valid += 1;
                }
                if valid == 0 {
                    return sum;
                }
                #[allow(clippy::cast_precision_loss)]
                let count = valid as f32;
                sum.iter_mut().for_each(|v| *v /= count);
                sum
            }
            Self::Cls => hidden_states.row(0).to_vec(),
            Self::LastToken => {
                let last = attention_mask
                    .iter()
                    .take(seq_len)
                    .rposition(|&m| m != 0)
                    .unwrap_or(seq_len.saturating_sub(1));
                hidden_states.row(last).to_vec()
            }
        }
    }
}
