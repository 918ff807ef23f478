pub mod refresh_token;
pub mod user;

pub use refresh_token::{NewRefreshToken, RefreshTokenRecord};
pub use user::{AuthenticatedUser, NewUser, Role, User, UserResponse};
