pub mod config;
pub mod data;
pub mod erp;
pub mod storefront;

#[cfg(test)]
pub mod testing;
