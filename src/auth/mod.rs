// Credential handling: bcrypt password hashes and JWT access tokens

pub mod jwt;
pub mod password;
