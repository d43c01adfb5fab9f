// OpenAPI specification for the cats API
//
// Served at /api-doc/openapi.json by the API server and exported by the
// export-openapi binary.

use utoipa::OpenApi;

use crate::api;
use cats_core::Cat;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        api::cats::create_cat,
        api::cats::get_cat,
        api::cats::list_cats,
    ),
    components(
        schemas(
            Cat,
            api::cats::CreateCatRequest,
            api::cats::CatListResponse,
            api::common::ErrorResponse,
        )
    ),
    tags(
        (name = "cats", description = "Cat record endpoints")
    ),
    info(
        title = "Cats API",
        version = "0.1.0",
        description = "Record keeper for cats with background thumbnail generation",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI spec as a pretty-printed JSON string
    pub fn to_json() -> serde_json::Result<String> {
        Self::openapi().to_pretty_json()
    }
}
