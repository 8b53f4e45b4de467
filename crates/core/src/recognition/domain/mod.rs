pub mod identity;
pub mod outcome;
pub mod recognition_service;
