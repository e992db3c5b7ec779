mod caller_auth;

pub use caller_auth::*;
