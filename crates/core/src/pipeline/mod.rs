pub mod enroll_face_use_case;
pub mod outcome_board;
pub mod poll_logger;
pub mod recognition_poller;
