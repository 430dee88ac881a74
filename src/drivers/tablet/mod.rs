pub mod decoder;
pub mod descriptor;
pub mod devices;
pub mod driver;
pub mod event;
pub mod hid_report;
pub mod state;

#[cfg(test)]
pub mod descriptor_test;
#[cfg(test)]
pub mod hid_report_test;
#[cfg(test)]
pub mod state_test;
