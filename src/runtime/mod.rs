pub mod execution;
pub mod graph;
pub mod inspector;
pub mod storage;
pub mod summary;
pub mod task;
pub mod timeline;
