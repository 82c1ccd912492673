pub mod bulk_operation;
