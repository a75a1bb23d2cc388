pub mod document;
pub mod face_image;
pub mod video_record;
