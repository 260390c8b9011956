pub mod thread_pool;
pub mod completion_queue;

pub use thread_pool::{Executor, InlineExecutor, Job, ThreadPool};
pub use completion_queue::{CompletionQueue, CompletionSender};
