pub mod mb14241;

pub use mb14241::Mb14241;
