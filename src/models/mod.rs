pub mod cart_line;
pub mod consumer;
pub mod producer;
pub mod product;
pub mod session;
