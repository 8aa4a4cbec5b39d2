// ABOUTME: Validated domain types for registry waits.
// ABOUTME: Image references and credentials that never print their secrets.

mod credentials;
mod image_ref;

pub use credentials::{Credentials, Secret};
pub use image_ref::{DEFAULT_TAG, ImageRef, ParseImageRefError};
