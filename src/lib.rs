#![doc = include_str!("../README.md")]

pub mod drive;
pub mod error;
pub mod google;
pub mod naming;
pub mod server;
pub mod session;
pub mod validate;

// Re-exports for convenient access
pub use drive::{DriveClient, FolderProbe};
pub use error::Error;
pub use google::{GoogleClient, GoogleConfig, TokenResponse, UserInfo};
pub use naming::{NameProbe, allocate, base_file_name};
pub use server::{AppConfig, router};
pub use session::{Credential, EnsuredCredential, Session, TokenRefresher, ensure_valid};
