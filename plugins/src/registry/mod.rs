pub mod postman;

pub use postman::PostmanRegistry;
