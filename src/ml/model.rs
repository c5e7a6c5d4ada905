use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig, LstmState,
        PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::{relu, tanh},
};

use crate::data::tokenizer::untokenize;
use crate::data::vocabulary::Vocabulary;
use crate::domain::caption::{END_TOKEN, START_TOKEN};

// ─── CaptionModel ─────────────────────────────────────────────────────────────
/// What the training and inference loops need from a captioning model.
pub trait CaptionModel<B: Backend> {
    /// images: [batch, 3, h, w], target_prefix: [len, batch]
    /// → scores: [len, batch, vocab_size]
    fn forward(&self, images: Tensor<B, 4>, target_prefix: Tensor<B, 2, Int>) -> Tensor<B, 3>;

    /// Greedy caption for a single image ([1, 3, h, w]), at most `max_len` words.
    fn generate_caption(&self, image: Tensor<B, 4>, vocab: &Vocabulary, max_len: usize) -> String;
}

#[derive(Config, Debug)]
pub struct CaptionModelConfig {
    pub vocab_size: usize,
    #[config(default = 256)]
    pub embed_dim:  usize,
    #[config(default = 512)]
    pub hidden_dim: usize,
    #[config(default = 0.3)]
    pub dropout:    f64,
}

/// Channels of the two convolution stages
const ENCODER_CHANNELS: [usize; 2] = [32, 64];

impl CaptionModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CaptionNet<B> {
        let [c1, c2] = ENCODER_CHANNELS;
        let conv1 = Conv2dConfig::new([3, c1], [3, 3])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let conv2 = Conv2dConfig::new([c1, c2], [3, 3])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let pool       = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let init_hidden = LinearConfig::new(c2, self.hidden_dim).init(device);
        let init_cell   = LinearConfig::new(c2, self.hidden_dim).init(device);

        let embedding = EmbeddingConfig::new(self.vocab_size, self.embed_dim).init(device);
        let lstm      = LstmConfig::new(self.embed_dim, self.hidden_dim, true).init(device);
        let output    = LinearConfig::new(self.hidden_dim, self.vocab_size).init(device);
        let dropout   = DropoutConfig::new(self.dropout).init();

        CaptionNet {
            conv1, conv2, pool, init_hidden, init_cell,
            embedding, lstm, output, dropout,
        }
    }
}

/// Small CNN image encoder feeding the initial state of an LSTM decoder.
#[derive(Module, Debug)]
pub struct CaptionNet<B: Backend> {
    pub conv1:       Conv2d<B>,
    pub conv2:       Conv2d<B>,
    pub pool:        AdaptiveAvgPool2d,
    pub init_hidden: Linear<B>,
    pub init_cell:   Linear<B>,
    pub embedding:   Embedding<B>,
    pub lstm:        Lstm<B>,
    pub output:      Linear<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> CaptionNet<B> {
    /// images: [batch, 3, h, w] → decoder state with hidden/cell [batch, hidden_dim]
    fn encode(&self, images: Tensor<B, 4>) -> LstmState<B, 2> {
        let [batch_size, _, _, _] = images.dims();

        let x = relu(self.conv1.forward(images));
        let x = relu(self.conv2.forward(x));
        let x = self.pool.forward(x); // [batch, c2, 1, 1]
        let features: Tensor<B, 2> = x.reshape([batch_size, ENCODER_CHANNELS[1]]);

        let hidden = tanh(self.init_hidden.forward(features.clone()));
        let cell   = tanh(self.init_cell.forward(features));
        LstmState::new(cell, hidden)
    }

    /// tokens: [batch, len] → scores [batch, len, vocab], next state
    fn decode(
        &self,
        tokens: Tensor<B, 2, Int>,
        state:  LstmState<B, 2>,
    ) -> (Tensor<B, 3>, LstmState<B, 2>) {
        let embedded         = self.embedding.forward(tokens);
        let (hidden, state)  = self.lstm.forward(embedded, Some(state));
        let scores           = self.output.forward(self.dropout.forward(hidden));
        (scores, state)
    }
}

impl<B: Backend> CaptionModel<B> for CaptionNet<B> {
    fn forward(&self, images: Tensor<B, 4>, target_prefix: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let state       = self.encode(images);
        // The decoder runs batch-major; callers hand sequences over seq-major.
        let tokens      = target_prefix.swap_dims(0, 1);
        let (scores, _) = self.decode(tokens, state);
        scores.swap_dims(0, 1)
    }

    fn generate_caption(&self, image: Tensor<B, 4>, vocab: &Vocabulary, max_len: usize) -> String {
        let device = image.device();
        let (Some(start), Some(end)) = (vocab.index(START_TOKEN), vocab.index(END_TOKEN)) else {
            tracing::warn!("Vocabulary has no sentence markers; cannot generate");
            return String::new();
        };

        let mut state   = self.encode(image);
        let mut token   = start;
        let mut indices = Vec::new();

        for _ in 0..max_len {
            let input = Tensor::<B, 1, Int>::from_ints([token as i32], &device)
                .reshape([1, 1]);
            let (scores, next) = self.decode(input, state);
            state = next;

            token = scores.argmax(2).into_scalar().elem::<i64>() as usize;
            if token == end {
                break;
            }
            if token == start || token == vocab.pad_index() {
                continue;
            }
            indices.push(token);
        }

        untokenize(&vocab.decode(&indices).join(" "))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocabulary::build_vocabulary;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny_model(vocab_size: usize) -> CaptionNet<TestBackend> {
        CaptionModelConfig::new(vocab_size)
            .with_embed_dim(8)
            .with_hidden_dim(16)
            .with_dropout(0.0)
            .init(&Default::default())
    }

    #[test]
    fn test_forward_is_sequence_major() {
        let device = Default::default();
        let model  = tiny_model(7);

        let images = Tensor::<TestBackend, 4>::zeros([2, 3, 16, 16], &device);
        let prefix = Tensor::<TestBackend, 2, Int>::zeros([5, 2], &device);

        assert_eq!(model.forward(images, prefix).dims(), [5, 2, 7]);
    }

    #[test]
    fn test_generate_caption_respects_max_len() {
        let vocab = build_vocabulary(&["<s>", "a", "dog", "</s>"]);
        let model = tiny_model(vocab.len());
        let image = Tensor::<TestBackend, 4>::ones([1, 3, 8, 8], &Default::default());

        let caption = model.generate_caption(image, &vocab, 4);
        assert!(caption.split_whitespace().count() <= 4);
        assert!(!caption.contains(START_TOKEN));
        assert!(!caption.contains(END_TOKEN));
    }
}
