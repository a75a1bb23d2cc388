pub mod document;
pub mod face_image;
pub mod health;
pub mod video;
