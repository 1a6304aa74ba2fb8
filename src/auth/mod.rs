/// Authentication module
///
/// Password hashing, Authorization header parsing, access token signing,
/// refresh token lifecycle, and the session flows built on top of them.

mod claims;
mod credentials;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use claims::{Claims, ACCESS_TOKEN_ISSUER};
pub use credentials::{extract_api_key, extract_bearer, API_KEY_MARKER};
pub use jwt::AccessTokenCodec;
pub use password::{hash_password, verify_password};
pub use refresh_token::{generate_refresh_token, RefreshToken, RefreshTokenStore};
pub use session::{AccountCredentials, Session, SessionManager};
