pub mod device;
pub mod manager;
pub mod mapping;
pub mod output_event;
pub mod pressure;
pub mod session;
pub mod sink;

#[cfg(test)]
pub mod mapping_test;
