pub mod ide;
