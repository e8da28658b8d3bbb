//! ONNX sentence embedder (all-MiniLM-L6-v2) backing the semantic scorer.
//!
//! Requires the `onnx` feature and a model directory containing
//! `model.onnx` and `tokenizer.json`.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;

    use ndarray::Array1;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use pulse_core::{Error, Result};
    use tokenizers::Tokenizer;
    use tracing::{info, warn};

    use crate::cache::QueryCache;
    use crate::embedder::{EmbedderBackend, EmbeddingResult};

    /// Review text beyond this many tokens is truncated.
    const MAX_SEQ_LEN: usize = 256;

    const DEFAULT_DIM: usize = 384;

    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        cache: QueryCache,
        dimension: usize,
    }

    impl OnnxEmbedder {
        /// Load the model and tokenizer from `model_dir`.
        pub fn load(model_dir: &Path) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            for path in [&model_path, &tokenizer_path] {
                if !path.exists() {
                    return Err(Error::Inference(format!("missing {}", path.display())));
                }
            }

            // With load-dynamic, ORT_DYLIB_PATH must point to libonnxruntime.
            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| Error::Inference(format!("failed to create session builder: {}", e)))?
                .with_intra_threads(1)
                .map_err(|e| Error::Inference(format!("failed to set threads: {}", e)))?
                .commit_from_file(&model_path)
                .map_err(|e| Error::Inference(format!("failed to load ONNX model: {}", e)))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| Error::Inference(format!("failed to load tokenizer: {}", e)))?;

            info!("ONNX embedder loaded from {}", model_dir.display());

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                cache: QueryCache::default_cache(),
                dimension: DEFAULT_DIM,
            })
        }

        fn infer(&self, text: &str) -> Option<Array1<f32>> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| warn!("Tokenization failed: {}", e))
                .ok()?;

            let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
            let ids: Vec<i64> = encoding.get_ids()[..seq_len]
                .iter()
                .map(|&id| id as i64)
                .collect();
            let mask: Vec<i64> = encoding.get_attention_mask()[..seq_len]
                .iter()
                .map(|&m| m as i64)
                .collect();
            let type_ids = vec![0i64; seq_len];

            let tensor = |data: Vec<i64>| {
                Tensor::from_array(([1usize, seq_len], data))
                    .map_err(|e| warn!("Failed to build input tensor: {}", e))
                    .ok()
            };
            let inputs = ort::inputs![tensor(ids)?, tensor(mask.clone())?, tensor(type_ids)?];

            let mut session = self.session.lock();
            let outputs = session
                .run(inputs)
                .map_err(|e| warn!("ONNX inference failed: {}", e))
                .ok()?;
            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| warn!("Failed to extract output tensor: {}", e))
                .ok()?;

            let dims: Vec<i64> = shape.iter().copied().collect();
            match dims.as_slice() {
                // [1, seq_len, dim] token embeddings
                [_, _, dim] => mean_pool(data, &mask, *dim as usize),
                // [1, dim] already pooled
                [_, dim] => Some(Array1::from_vec(data[..*dim as usize].to_vec())),
                other => {
                    warn!("Unexpected output shape: {:?}", other);
                    None
                }
            }
        }
    }

    /// Attention-masked mean over token embeddings laid out `[1][seq][dim]`.
    fn mean_pool(data: &[f32], mask: &[i64], dim: usize) -> Option<Array1<f32>> {
        let weight: f32 = mask.iter().map(|&m| m as f32).sum();
        if weight < 1e-9 {
            return None;
        }
        let mut pooled = Array1::<f32>::zeros(dim);
        for (i, &m) in mask.iter().enumerate() {
            if m == 0 {
                continue;
            }
            let row = data.get(i * dim..(i + 1) * dim)?;
            for (p, v) in pooled.iter_mut().zip(row) {
                *p += v;
            }
        }
        Some(pooled / weight)
    }

    impl EmbedderBackend for OnnxEmbedder {
        fn embed(&self, text: &str) -> Option<EmbeddingResult> {
            if let Some(cached) = self.cache.get(text) {
                return Some(EmbeddingResult {
                    embedding: cached,
                    cached: true,
                });
            }

            let embedding = self.infer(text)?;
            self.cache.put(text.to_string(), embedding.clone());
            Some(EmbeddingResult {
                embedding,
                cached: false,
            })
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxEmbedder;
