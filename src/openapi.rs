use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::device::Availability;
use crate::errors::ErrorResponse;
use crate::handlers::devices::{AddDeviceRequest, DeviceResponse, UpdateDeviceRequest};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory API",
        version = "1.0.0",
        description = r#"
Organization-scoped device inventory management.

Each device record belongs to one organization and carries a generated
device number. Product ids are unique across the whole store. All
endpoints require a bearer token whose claims carry the caller's
organization and permissions.
        "#,
        contact(name = "Beeja Platform Engineering", email = "platform@beeja.io")
    ),
    paths(
        crate::handlers::devices::list_devices,
        crate::handlers::devices::add_device,
        crate::handlers::devices::update_device,
        crate::handlers::devices::delete_device,
    ),
    components(schemas(
        DeviceResponse,
        AddDeviceRequest,
        UpdateDeviceRequest,
        Availability,
        ErrorResponse,
    )),
    tags(
        (name = "devices", description = "Device inventory operations")
    )
)]
pub struct ApiDoc;

/// Swagger UI router serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
