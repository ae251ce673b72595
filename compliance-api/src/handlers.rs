pub mod documents;
pub mod session;
