pub mod error;
pub mod features;
pub mod join;
pub mod labels;
pub mod loader;
pub mod reshape;

#[cfg(test)]
pub(crate) mod test_support;
