pub mod session;

pub use session::SessionParams;
