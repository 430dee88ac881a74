pub mod tablet;
