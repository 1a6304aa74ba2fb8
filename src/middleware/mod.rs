/// Middleware module
///
/// Access-token authentication and request logging.

mod jwt_middleware;
mod request_logging;

pub use jwt_middleware::{AuthenticatedUser, JwtMiddleware};
pub use request_logging::RequestLogging;
