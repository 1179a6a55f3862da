#[cfg(test)]
pub mod collection_flow_tests;
#[cfg(test)]
pub mod http_tests;
#[cfg(test)]
pub mod session_tests;
#[cfg(test)]
pub mod utils;
