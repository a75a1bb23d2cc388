pub mod document;
pub mod face_image;
pub mod shared;
pub mod video;
