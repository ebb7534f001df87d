// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the JSON-lines files on disk and the
// tensors a training step consumes:
//
//   <split>.jsonl
//       │
//       ▼
//   JsonlLoader            → parses records, checks annotations
//       │                    (Preprocessor normalises + tokenises)
//       ▼
//   Vocabulary             → word ids, label ids
//       │
//       ▼
//   SentenceClassification → seeded training batches, ordered
//       │                    eval batches (BatchSource)
//       ▼
//   RationaleBatcher       → padded tensors on the device
//
// GloveEmbeddings sits beside the pipeline and turns the
// vocabulary into the initial embedding matrix.

/// Reads `<split>.jsonl` dataset files
pub mod loader;

/// Whitespace / case normalisation and tokenisation
pub mod preprocessor;

/// Word and label vocabularies
pub mod vocabulary;

/// GloVe-style pretrained vectors
pub mod embeddings;

/// Encoded splits and the training batch source
pub mod dataset;

/// Pads examples into tensor batches
pub mod batcher;
