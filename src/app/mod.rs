pub mod self_test;

pub use self_test::{SelfTest, Step};
