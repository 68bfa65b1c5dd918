pub mod product;
pub mod task;
pub mod user;

pub use product::{Product, ProductInput, ProductUpdate};
pub use task::{Task, TaskInput, TaskUpdate};
pub use user::{User, UserCredentials};
