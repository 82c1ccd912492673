pub mod directories;
