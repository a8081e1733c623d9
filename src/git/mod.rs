pub mod clone;

pub use clone::{checkout_dir, GitCloner, RepoCloner};
