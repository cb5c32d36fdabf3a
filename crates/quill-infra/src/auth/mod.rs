//! Authentication implementations.

mod jwt;
mod password;
mod session;

pub use jwt::{JwtConfig, JwtTokenService};
pub use password::Argon2PasswordService;
pub use session::JwtSessionProvider;
