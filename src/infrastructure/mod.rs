pub mod task_api;
