// ============================================================
// Layer 5 — Sequence Encoders
// ============================================================
// One closed enum over the three encoder families. Every
// variant maps
//
//   embeddings [batch, seq_len, input_dim] + mask [batch, seq_len]
//     → hidden states [batch, seq_len, hidden_dim]
//
// and guarantees that padded positions never reach a non-padded
// output, and that outputs at padded positions are zero.
//
//   Recurrent     — stacked unidirectional GRU / LSTM. Padding is
//                   trailing and recurrence is causal, so padded
//                   steps only ever follow the real tokens.
//   Convolutional — stacked same-padded Conv1d + ReLU, inputs and
//                   every layer's output masked.
//   Attention     — linear projection + transformer blocks with a
//                   key padding mask.

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        conv::{Conv1d, Conv1dConfig},
        gru::{Gru, GruConfig},
        lstm::{Lstm, LstmConfig},
        Dropout, DropoutConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
        PaddingConfig1d,
    },
    prelude::*,
    tensor::activation,
};

use crate::ml::config::{CellType, ModelType};

#[derive(Config, Debug)]
pub struct EncoderConfig {
    pub model_type:  ModelType,
    pub cell_type:   CellType,
    pub input_dim:   usize,
    pub hidden_dim:  usize,
    pub layer_num:   usize,
    pub kernel_size: usize,
    pub head_num:    usize,
    #[config(default = 0.0)]
    pub dropout:     f64,
}

impl EncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Encoder<B> {
        match self.model_type {
            ModelType::Recurrent     => Encoder::Recurrent(self.init_rnn(device)),
            ModelType::Convolutional => Encoder::Convolutional(self.init_cnn(device)),
            ModelType::Attention     => Encoder::Attention(self.init_trm(device)),
        }
    }

    fn init_rnn<B: Backend>(&self, device: &B::Device) -> RnnEncoder<B> {
        let layers = (0..self.layer_num)
            .map(|i| {
                let d_input = if i == 0 { self.input_dim } else { self.hidden_dim };
                match self.cell_type {
                    CellType::Gru  => RnnCell::Gru(GruConfig::new(d_input, self.hidden_dim, true).init(device)),
                    CellType::Lstm => RnnCell::Lstm(LstmConfig::new(d_input, self.hidden_dim, true).init(device)),
                }
            })
            .collect();
        RnnEncoder { layers }
    }

    fn init_cnn<B: Backend>(&self, device: &B::Device) -> CnnEncoder<B> {
        let convs = (0..self.layer_num)
            .map(|i| {
                let channels_in = if i == 0 { self.input_dim } else { self.hidden_dim };
                Conv1dConfig::new(channels_in, self.hidden_dim, self.kernel_size)
                    .with_padding(PaddingConfig1d::Explicit(self.kernel_size / 2))
                    .init(device)
            })
            .collect();
        CnnEncoder { convs }
    }

    fn init_trm<B: Backend>(&self, device: &B::Device) -> TrmEncoder<B> {
        let input  = LinearConfig::new(self.input_dim, self.hidden_dim).init(device);
        let blocks = (0..self.layer_num)
            .map(|_| {
                let d_ff = self.hidden_dim * 4;
                TrmBlock {
                    self_attn:   MultiHeadAttentionConfig::new(self.hidden_dim, self.head_num)
                        .with_dropout(self.dropout)
                        .init(device),
                    ffn_linear1: LinearConfig::new(self.hidden_dim, d_ff).init(device),
                    ffn_linear2: LinearConfig::new(d_ff, self.hidden_dim).init(device),
                    norm1:       LayerNormConfig::new(self.hidden_dim).init(device),
                    norm2:       LayerNormConfig::new(self.hidden_dim).init(device),
                    dropout:     DropoutConfig::new(self.dropout).init(),
                }
            })
            .collect();
        TrmEncoder { input, blocks }
    }
}

// ─── Encoder ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub enum Encoder<B: Backend> {
    Recurrent(RnnEncoder<B>),
    Convolutional(CnnEncoder<B>),
    Attention(TrmEncoder<B>),
}

impl<B: Backend> Encoder<B> {
    /// x: [batch, seq_len, input_dim], mask: [batch, seq_len] of 0/1
    /// → [batch, seq_len, hidden_dim]
    pub fn forward(&self, x: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 3> {
        match self {
            Encoder::Recurrent(rnn)     => rnn.forward(x, mask),
            Encoder::Convolutional(cnn) => cnn.forward(x, mask),
            Encoder::Attention(trm)     => trm.forward(x, mask),
        }
    }
}

// ─── Recurrent ────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub enum RnnCell<B: Backend> {
    Gru(Gru<B>),
    Lstm(Lstm<B>),
}

#[derive(Module, Debug)]
pub struct RnnEncoder<B: Backend> {
    pub layers: Vec<RnnCell<B>>,
}

impl<B: Backend> RnnEncoder<B> {
    pub fn forward(&self, x: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 3> {
        let mask = mask.unsqueeze_dim::<3>(2);
        let mut h = x * mask.clone();
        for layer in &self.layers {
            h = match layer {
                RnnCell::Gru(gru)   => gru.forward(h, None),
                RnnCell::Lstm(lstm) => lstm.forward(h, None).0,
            };
            h = h * mask.clone();
        }
        h
    }
}

// ─── Convolutional ────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct CnnEncoder<B: Backend> {
    pub convs: Vec<Conv1d<B>>,
}

impl<B: Backend> CnnEncoder<B> {
    pub fn forward(&self, x: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 3> {
        // Conv1d wants channels first: [batch, channels, seq_len]
        let mask = mask.unsqueeze_dim::<3>(1);
        let mut h = x.swap_dims(1, 2) * mask.clone();
        for conv in &self.convs {
            h = activation::relu(conv.forward(h)) * mask.clone();
        }
        h.swap_dims(1, 2)
    }
}

// ─── Attention ────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct TrmBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> TrmBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>, pad: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let input = MhaInput::self_attn(x.clone()).mask_pad(pad);
        let attn_output = self.self_attn.forward(input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct TrmEncoder<B: Backend> {
    pub input:  Linear<B>,
    pub blocks: Vec<TrmBlock<B>>,
}

impl<B: Backend> TrmEncoder<B> {
    pub fn forward(&self, x: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 3> {
        // true marks a padded key
        let pad = mask.clone().lower_elem(0.5);
        let mask = mask.unsqueeze_dim::<3>(2);
        let mut h = self.input.forward(x * mask.clone());
        for block in &self.blocks {
            h = block.forward(h, pad.clone()) * mask.clone();
        }
        h
    }
}
