pub mod a001_channel_mapping;
pub mod a002_sales_order;
