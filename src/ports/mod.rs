pub mod navigator;
pub mod transport;
