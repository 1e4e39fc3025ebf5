pub mod login;

pub use login::LoginCredentialProvider;
