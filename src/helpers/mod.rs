pub mod error;
pub mod handler_404;
