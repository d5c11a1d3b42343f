//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3 document for the Likeness API.

use utoipa::OpenApi;

use crate::handlers::{
    CompareResponse, GenerateRequest, GenerateResponse, HealthResponse, ReadyResponse,
};

/// Likeness API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Likeness API",
        version = "0.1.0",
        description = r#"
## Multi-metric image similarity

Upload two images to `POST /compare/` and receive four independent scores:

- **cosine_similarity** - cosine of the two feature vectors (HOG or ViT)
- **opencv_match** - normalized correlation coefficient (same-sized images only)
- **distance_score** - SSIM or inverse MSE (same-sized images only)
- **phash_similarity** - perceptual hash agreement in [0, 1]

Errors are returned as `{"detail": "...", "code": "..."}`.
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    tags(
        (name = "Comparison", description = "Score the similarity of two images"),
        (name = "Generation", description = "Generate images from text prompts"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::compare::compare_handler,
        crate::handlers::generate::generate_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            CompareResponse,
            GenerateRequest,
            GenerateResponse,
        )
    )
)]
pub struct ApiDoc;
