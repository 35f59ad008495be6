//! Client identity and authorization with the Cooksync service
//!
//! This module provides:
//! - The per-installation client id and bearer auth headers
//! - The browser-plus-polling handshake that obtains a bearer token
//! - The browser seam used to open authorization pages

mod browser;
mod credentials;
mod handshake;

pub use browser::{Browser, SystemBrowser};
pub use credentials::{
    AuthHeaders, CLIENT_ID_HEADER, CLIENT_ID_KEY, CLIENT_ID_LEN, CredentialStore,
    generate_client_id,
};
pub use handshake::AuthHandshake;
