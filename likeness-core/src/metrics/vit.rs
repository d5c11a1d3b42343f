//! Pretrained ViT-B/16 feature extractor.
//!
//! Weights are fetched from the Hugging Face hub (cached locally by
//! `hf-hub`) when the extractor is loaded, which happens once per process.
//! The image runs through the full encoder stack and the final layer-normed
//! CLS token is used as the feature vector.

use candle_core::{DType, Device, IndexOp, Module, Tensor};
use candle_nn::{layer_norm, LayerNorm, VarBuilder};
use candle_transformers::models::vit;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, info};

use super::features::FeatureExtractor;
use crate::error::{LikenessError, Result};

/// Hub repository holding the pretrained weights.
pub const VIT_MODEL_ID: &str = "google/vit-base-patch16-224";

/// Input resolution expected by the network.
const RESOLUTION: usize = 224;

/// ImageNet channel statistics used to normalize inputs.
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

fn candle_err(e: candle_core::Error) -> LikenessError {
    LikenessError::Comparison(format!("ViT inference failed: {}", e))
}

/// ViT encoder extractor.
pub struct VitExtractor {
    embeddings: vit::Embeddings,
    encoder: vit::Encoder,
    layernorm: LayerNorm,
    device: Device,
    dimension: usize,
}

impl VitExtractor {
    /// Download (or reuse cached) weights and build the network on the CPU.
    pub fn load() -> Result<Self> {
        info!(model = VIT_MODEL_ID, "Loading ViT feature extractor");

        let api = hf_hub::api::sync::Api::new().map_err(|e| {
            LikenessError::Configuration(format!("Failed to initialise model hub client: {}", e))
        })?;
        let model_file = api
            .model(VIT_MODEL_ID.to_string())
            .get("model.safetensors")
            .map_err(|e| {
                LikenessError::Configuration(format!("Failed to fetch {} weights: {}", VIT_MODEL_ID, e))
            })?;

        let device = Device::Cpu;
        // SAFETY: the weights file is owned by the hub cache and not mutated while mapped.
        let varbuilder =
            unsafe { VarBuilder::from_mmaped_safetensors(&[model_file], DType::F32, &device) }
                .map_err(|e| LikenessError::Configuration(format!("Failed to map weights: {}", e)))?;

        let config = vit::Config::vit_base_patch16_224();
        let build_err =
            |e: candle_core::Error| LikenessError::Configuration(format!("Failed to build ViT: {}", e));
        let vb = varbuilder.pp("vit");
        let embeddings =
            vit::Embeddings::new(&config, false, vb.pp("embeddings")).map_err(build_err)?;
        let encoder = vit::Encoder::new(&config, vb.pp("encoder")).map_err(build_err)?;
        let layernorm = layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("layernorm"))
            .map_err(build_err)?;

        let dimension = config.hidden_size;

        info!(dimension, "ViT feature extractor ready");

        Ok(Self {
            embeddings,
            encoder,
            layernorm,
            device,
            dimension,
        })
    }

    /// Resize to 224×224 and apply ImageNet normalization, shape `[3, 224, 224]`.
    fn preprocess(&self, image: &DynamicImage) -> Result<Tensor> {
        let res = RESOLUTION as u32;
        let rgb = image
            .resize_exact(res, res, FilterType::Triangle)
            .to_rgb8()
            .into_raw();

        let data = Tensor::from_vec(rgb, (RESOLUTION, RESOLUTION, 3), &self.device)
            .and_then(|t| t.permute((2, 0, 1)))
            .map_err(candle_err)?;
        let mean = Tensor::new(&IMAGENET_MEAN, &self.device)
            .and_then(|t| t.reshape((3, 1, 1)))
            .map_err(candle_err)?;
        let std = Tensor::new(&IMAGENET_STD, &self.device)
            .and_then(|t| t.reshape((3, 1, 1)))
            .map_err(candle_err)?;

        (data.to_dtype(DType::F32).map_err(candle_err)? / 255.)
            .and_then(|t| t.broadcast_sub(&mean))
            .and_then(|t| t.broadcast_div(&std))
            .map_err(candle_err)
    }
}

impl FeatureExtractor for VitExtractor {
    fn name(&self) -> &'static str {
        "vit"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn extract(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let input = self.preprocess(image)?.unsqueeze(0).map_err(candle_err)?;
        // [1, 197, 768] hidden states; row 0 is the CLS token.
        let embedding = self
            .embeddings
            .forward(&input, None, false)
            .and_then(|t| self.encoder.forward(&t))
            .and_then(|t| t.i((.., 0, ..)))
            .and_then(|t| self.layernorm.forward(&t))
            .and_then(|t| t.flatten_all())
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(candle_err)?;

        debug!(len = embedding.len(), "Extracted ViT features");
        Ok(embedding)
    }
}
