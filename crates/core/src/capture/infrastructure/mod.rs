pub mod image_file_frame_source;
pub mod shared_frame_source;
