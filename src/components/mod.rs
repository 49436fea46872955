pub mod message;

#[cfg(test)]
pub(crate) mod mock_bus;
