pub mod logging;
pub mod test_helpers;
