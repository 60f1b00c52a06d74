mod catalog;
mod encryption;
mod refresh;
mod sanitizer;
mod store;

pub use catalog::{ClientCredentialLocation, ContentType, OAuthCatalog, OAuthCatalogEntry, OAuthType};
pub use encryption::{from_base64, to_base64, CredentialCipher};
pub use refresh::{refresh_access_token, RefreshedToken};
pub use sanitizer::{safe_summary, sanitize_map, sanitize_value};
pub use store::CredentialStore;
