pub mod columns;
pub mod filter;
pub mod task_ops;
