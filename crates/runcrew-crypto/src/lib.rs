//! Runcrew crypto library
//!
//! - `password`: one-way Argon2id hashing for credentials.
//! - `encrypt`: reversible, deterministic AES-256-GCM for personal fields
//!   that must stay unique and searchable (phone numbers).
//! - `keys`: field-cipher key generation and base64 encoding.

pub mod encrypt;
pub mod keys;
pub mod password;

pub use encrypt::FieldCipher;
