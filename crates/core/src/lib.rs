pub mod capture;
pub mod imaging;
pub mod pipeline;
pub mod presentation;
pub mod recognition;
pub mod shared;
